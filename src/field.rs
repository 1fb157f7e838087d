//! One binding between a presentation region and a persisted-value slot.

use crate::codec::{self, ImageBlob};
use crate::config::{AttributeSource, Border, FieldOptions, PenConfig};
use crate::error::{Result, SigpadError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub usize);

/// What the presentation region should show.
#[derive(Clone, Debug, PartialEq)]
pub enum Preview {
    /// Image fills the region; no border.
    Signed(ImageBlob),
    Empty {
        placeholder: Option<String>,
        border: Option<Border>,
    },
}

/// The thumbnail/placeholder element a user activates.
pub trait Presentation: AttributeSource {
    fn render(&mut self, preview: &Preview);

    /// Whether the region already carries a rendered image from the host page.
    fn has_rendered_image(&self) -> bool {
        false
    }
}

/// The host form field holding the persisted image encoding.
pub trait ValueSlot {
    fn value(&self) -> String;
    fn set_value(&mut self, value: &str);
}

/// Plain equality on the raw slot value.
pub fn has_changed(last_seen: &str, current: &str) -> bool {
    last_seen != current
}

pub struct SignatureField {
    id: FieldId,
    presentation: Box<dyn Presentation>,
    slot: Option<Box<dyn ValueSlot>>,
    options: FieldOptions,
    last_observed: String,
    rendered: Option<ImageBlob>,
    signed: bool,
}

impl SignatureField {
    /// Reads options and applies the initial presentation.
    pub fn new(
        id: FieldId,
        presentation: Box<dyn Presentation>,
        slot: Box<dyn ValueSlot>,
        pen: &PenConfig,
    ) -> Self {
        let options = FieldOptions::from_attributes(presentation.as_ref(), pen);
        let last_observed = slot.value();
        let signed = presentation.has_rendered_image();
        let mut field = Self {
            id,
            presentation,
            slot: Some(slot),
            options,
            last_observed,
            rendered: None,
            signed,
        };

        match codec::decode(&field.last_observed) {
            Some(blob) => field.show_image(blob),
            None if field.signed => {}
            None => field.show_empty(),
        }
        field
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn rendered_image(&self) -> Option<&ImageBlob> {
        self.rendered.as_ref()
    }

    pub fn last_observed(&self) -> &str {
        &self.last_observed
    }

    pub fn has_slot(&self) -> bool {
        self.slot.is_some()
    }

    /// Detaches the value slot, leaving the field inert.
    pub fn detach_slot(&mut self) -> Option<Box<dyn ValueSlot>> {
        self.slot.take()
    }

    /// Current slot value, or `None` once the slot is gone.
    pub fn current_value(&self) -> Option<String> {
        self.slot.as_ref().map(|s| s.value())
    }

    /// Re-reads the attribute options; done on every activation.
    pub fn refresh_options(&mut self, pen: &PenConfig) -> &FieldOptions {
        self.options = FieldOptions::from_attributes(self.presentation.as_ref(), pen);
        &self.options
    }

    /// The per-field override, else the global current width.
    pub fn effective_pen_width(&self, global_current: f64) -> f64 {
        self.options.line_width.unwrap_or(global_current)
    }

    /// Decode-and-render-or-empty for the current slot value. Returns whether
    /// the slot value differed from the last one seen.
    pub fn reconcile(&mut self) -> bool {
        let Some(value) = self.current_value() else {
            return false;
        };
        let changed = has_changed(&self.last_observed, &value);

        match codec::decode(&value) {
            Some(blob) => {
                if self.rendered.as_ref() != Some(&blob) {
                    self.show_image(blob);
                }
            }
            None => self.show_empty(),
        }
        self.last_observed = value;
        changed
    }

    /// Poll step: reconcile only when the raw value moved.
    pub fn poll(&mut self) -> bool {
        match self.current_value() {
            Some(value) if has_changed(&self.last_observed, &value) => self.reconcile(),
            _ => false,
        }
    }

    /// Writes a committed image into the slot and shows it. Without a slot
    /// nothing is persisted, so the presentation is left alone too.
    pub fn commit(&mut self, blob: ImageBlob) -> Result<()> {
        let Some(slot) = self.slot.as_mut() else {
            return Err(SigpadError::MissingSlot(self.id.0));
        };
        slot.set_value(blob.as_str());
        self.last_observed = blob.as_str().to_string();
        self.show_image(blob);
        Ok(())
    }

    fn show_image(&mut self, blob: ImageBlob) {
        self.presentation.render(&Preview::Signed(blob.clone()));
        self.rendered = Some(blob);
        self.signed = true;
    }

    fn show_empty(&mut self) {
        let preview = Preview::Empty {
            placeholder: self.options.visible_placeholder().map(str::to_string),
            border: self.options.border(),
        };
        self.presentation.render(&preview);
        self.rendered = None;
        self.signed = false;
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    pub struct RegionState {
        pub attrs: HashMap<String, String>,
        pub renders: Vec<Preview>,
        pub prerendered: bool,
    }

    impl RegionState {
        pub fn last(&self) -> Option<&Preview> {
            self.renders.last()
        }
    }

    /// Presentation whose state stays observable from the test.
    #[derive(Clone, Default)]
    pub struct FakeRegion(pub Rc<RefCell<RegionState>>);

    impl FakeRegion {
        pub fn with_attrs(pairs: &[(&str, &str)]) -> Self {
            let region = Self::default();
            for (k, v) in pairs {
                region.0.borrow_mut().attrs.insert(k.to_string(), v.to_string());
            }
            region
        }
    }

    impl AttributeSource for FakeRegion {
        fn attribute(&self, name: &str) -> Option<String> {
            self.0.borrow().attrs.get(name).cloned()
        }
    }

    impl Presentation for FakeRegion {
        fn render(&mut self, preview: &Preview) {
            self.0.borrow_mut().renders.push(preview.clone());
        }

        fn has_rendered_image(&self) -> bool {
            self.0.borrow().prerendered
        }
    }

    #[derive(Clone, Default)]
    pub struct FakeSlot(pub Rc<RefCell<String>>);

    impl FakeSlot {
        pub fn with_value(value: &str) -> Self {
            Self(Rc::new(RefCell::new(value.to_string())))
        }

        pub fn set(&self, value: &str) {
            *self.0.borrow_mut() = value.to_string();
        }

        pub fn get(&self) -> String {
            self.0.borrow().clone()
        }
    }

    impl ValueSlot for FakeSlot {
        fn value(&self) -> String {
            self.0.borrow().clone()
        }

        fn set_value(&mut self, value: &str) {
            *self.0.borrow_mut() = value.to_string();
        }
    }
}
