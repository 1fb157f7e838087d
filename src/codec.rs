//! Converts between the raster buffer and the persisted `data:` URL form.
//!
//! Commits are always written as PNG at the backing store's device-pixel
//! resolution. Reading is lenient: anything that is not a base64 data URL for
//! one of the accepted raster formats is simply "no image".

use std::fmt;
use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use png::{BitDepth, ColorType, Decoder as PngDecoder, Encoder as PngEncoder, Transformations};

use crate::api::ImageData;
use crate::error::{Result, SigpadError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }

    fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }
}

/// A persisted value that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBlob {
    data_url: String,
    format: ImageFormat,
    payload_start: usize,
}

impl ImageBlob {
    pub fn as_str(&self) -> &str {
        &self.data_url
    }

    pub fn into_string(self) -> String {
        self.data_url
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// The base64 text after the comma.
    pub fn payload(&self) -> &str {
        self.data_url.get(self.payload_start..).unwrap_or_default()
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(BASE64_STANDARD.decode(self.payload())?)
    }

    /// Rasterizes the blob for re-display. Only PNG is decoded here.
    pub fn to_image_data(&self) -> Result<ImageData> {
        if self.format != ImageFormat::Png {
            return Err(SigpadError::UnsupportedFormat(self.format.mime()));
        }
        decode_png(&self.bytes()?)
    }
}

impl fmt::Display for ImageBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data_url)
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Validates `value` as `data:image/<png|jpeg|jpg|gif|webp>;base64,...`,
/// case-insensitively and ignoring surrounding whitespace. Never fails loudly.
pub fn decode(value: &str) -> Option<ImageBlob> {
    let trimmed = value.trim();
    let rest = strip_prefix_ignore_case(trimmed, "data:image/")?;
    let semi = rest.find(';')?;
    let format = ImageFormat::from_subtype(&rest[..semi])?;
    let after = strip_prefix_ignore_case(&rest[semi..], ";base64,")?;

    Some(ImageBlob {
        data_url: trimmed.to_string(),
        format,
        payload_start: trimmed.len() - after.len(),
    })
}

/// Serializes pixels as a PNG data URL.
pub fn encode(image: &ImageData) -> Result<ImageBlob> {
    if !image.is_well_formed() || image.width == 0 || image.height == 0 {
        return Err(SigpadError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    let mut png_bytes = Vec::new();
    let mut encoder = PngEncoder::new(&mut png_bytes, image.width, image.height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.data)?;
    writer.finish()?;

    let prefix = "data:image/png;base64,";
    let encoded = BASE64_STANDARD.encode(png_bytes);
    Ok(ImageBlob {
        data_url: format!("{prefix}{encoded}"),
        format: ImageFormat::Png,
        payload_start: prefix.len(),
    })
}

fn decode_png(bytes: &[u8]) -> Result<ImageData> {
    let mut decoder = PngDecoder::new(Cursor::new(bytes));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let size = reader.output_buffer_size().ok_or(SigpadError::InvalidDimensions {
        width: reader.info().width,
        height: reader.info().height,
    })?;
    let mut buf = vec![0; size];
    let frame = reader.next_frame(&mut buf)?;
    if frame.bit_depth != BitDepth::Eight {
        return Err(SigpadError::UnsupportedFormat("image/png"));
    }

    let mut out = ImageData::new(frame.width, frame.height);
    let row_len = frame.width as usize;
    for (y, line) in buf.chunks(frame.line_size).take(frame.height as usize).enumerate() {
        for x in 0..row_len {
            let rgba = match frame.color_type {
                ColorType::Rgba => [line[x * 4], line[x * 4 + 1], line[x * 4 + 2], line[x * 4 + 3]],
                ColorType::Rgb => [line[x * 3], line[x * 3 + 1], line[x * 3 + 2], 255],
                ColorType::GrayscaleAlpha => {
                    let g = line[x * 2];
                    [g, g, g, line[x * 2 + 1]]
                }
                ColorType::Grayscale => [line[x], line[x], line[x], 255],
                _ => return Err(SigpadError::UnsupportedFormat("image/png")),
            };
            let idx = (y * row_len + x) * 4;
            out.data[idx..idx + 4].copy_from_slice(&rgba);
        }
    }
    Ok(out)
}
