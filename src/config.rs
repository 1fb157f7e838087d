//! Process-wide pen settings, surface styling and per-field options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How often the synchronizer re-reads persisted slots for out-of-band changes.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_PLACEHOLDER: &str = "Click to Sign";
pub const DEFAULT_BORDER_COLOR: &str = "#ccc";
pub const DEFAULT_BORDER_WIDTH: f64 = 2.0;

pub const ATTR_PLACEHOLDER: &str = "data-placeholder";
pub const ATTR_PLACEHOLDER_VISIBLE: &str = "data-placeholder-visible";
pub const ATTR_BORDER_VISIBLE: &str = "data-border-visible";
pub const ATTR_BORDER_STYLE: &str = "data-border-style";
pub const ATTR_BORDER_COLOR: &str = "data-border-color";
pub const ATTR_BORDER_WIDTH: &str = "data-border-width";
pub const ATTR_LINE_WIDTH: &str = "data-line-width";

/// Global pen width default and the range every width is clamped into.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PenConfig {
    pub default_width: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            default_width: 2.0,
            min: 1.0,
            max: 10.0,
        }
    }
}

impl PenConfig {
    pub fn clamp(&self, px: f64) -> f64 {
        px.min(self.max).max(self.min)
    }
}

/// The config plus the runtime-adjustable current width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PenSettings {
    config: PenConfig,
    current: f64,
}

impl PenSettings {
    pub fn new(config: PenConfig) -> Self {
        Self {
            config,
            current: config.clamp(config.default_width),
        }
    }

    pub fn config(&self) -> &PenConfig {
        &self.config
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Zero and non-finite input select the default width. Returns the width applied.
    pub fn set_width(&mut self, px: f64) -> f64 {
        let px = if px.is_finite() && px != 0.0 {
            px
        } else {
            self.config.default_width
        };
        self.current = self.config.clamp(px);
        self.current
    }
}

impl Default for PenSettings {
    fn default() -> Self {
        Self::new(PenConfig::default())
    }
}

/// Colors used when (re)painting the drawing surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceStyle {
    pub background: String,
    pub ink: String,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            background: "#ffffff".into(),
            ink: "#000000".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Dashed,
    Solid,
}

impl BorderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::Dashed => "dashed",
            BorderStyle::Solid => "solid",
        }
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "solid" => BorderStyle::Solid,
            "dashed" | "" => BorderStyle::Dashed,
            other => {
                log::debug!("unknown border style {other:?}, using dashed");
                BorderStyle::Dashed
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width: f64,
    pub style: BorderStyle,
    pub color: String,
}

impl Border {
    /// CSS shorthand, e.g. `2px dashed #ccc`.
    pub fn css(&self) -> String {
        format!("{}px {} {}", self.width, self.style.as_str(), self.color)
    }
}

/// Read-only access to the string attributes a host sets on a presentation region.
pub trait AttributeSource {
    fn attribute(&self, name: &str) -> Option<String>;
}

/// Per-field presentation and pen options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldOptions {
    pub placeholder: String,
    pub placeholder_visible: bool,
    pub border_visible: bool,
    pub border_style: BorderStyle,
    pub border_color: String,
    pub border_width: f64,
    /// Already clamped into the pen range when read from attributes.
    pub line_width: Option<f64>,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.into(),
            placeholder_visible: true,
            border_visible: true,
            border_style: BorderStyle::Dashed,
            border_color: DEFAULT_BORDER_COLOR.into(),
            border_width: DEFAULT_BORDER_WIDTH,
            line_width: None,
        }
    }
}

impl FieldOptions {
    pub fn from_attributes<A: AttributeSource + ?Sized>(source: &A, pen: &PenConfig) -> Self {
        let non_empty = |name: &str| source.attribute(name).filter(|v| !v.is_empty());
        let flag = |name: &str| {
            source
                .attribute(name)
                .map_or(true, |v| !v.trim().eq_ignore_ascii_case("false"))
        };

        let border_width = non_empty(ATTR_BORDER_WIDTH)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|w| w.is_finite())
            .unwrap_or(DEFAULT_BORDER_WIDTH);

        let line_width = source
            .attribute(ATTR_LINE_WIDTH)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|w| w.is_finite())
            .map(|w| pen.clamp(w));

        Self {
            placeholder: non_empty(ATTR_PLACEHOLDER).unwrap_or_else(|| DEFAULT_PLACEHOLDER.into()),
            placeholder_visible: flag(ATTR_PLACEHOLDER_VISIBLE),
            border_visible: flag(ATTR_BORDER_VISIBLE),
            border_style: non_empty(ATTR_BORDER_STYLE)
                .map(|v| BorderStyle::parse(&v))
                .unwrap_or_default(),
            border_color: non_empty(ATTR_BORDER_COLOR).unwrap_or_else(|| DEFAULT_BORDER_COLOR.into()),
            border_width,
            line_width,
        }
    }

    pub fn border(&self) -> Option<Border> {
        self.border_visible.then(|| Border {
            width: self.border_width,
            style: self.border_style,
            color: self.border_color.clone(),
        })
    }

    pub fn visible_placeholder(&self) -> Option<&str> {
        self.placeholder_visible.then_some(self.placeholder.as_str())
    }
}
