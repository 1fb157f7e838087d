pub type Result<T> = std::result::Result<T, SigpadError>;

#[derive(Debug, thiserror::Error)]
pub enum SigpadError {
    #[error("sigpad encountered a backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("sigpad encountered an error")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("png encoding failed: {0}")]
    PngEncode(#[from] png::EncodingError),
    #[error("png decoding failed: {0}")]
    PngDecode(#[from] png::DecodingError),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image format {0} cannot be rasterized")]
    UnsupportedFormat(&'static str),
    #[error("invalid backing store dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("pointer capture failed for pointer {0}")]
    PointerCapture(i32),
    #[error("no drawing session is open")]
    NoSession,
    #[error("unknown signature field {0}")]
    UnknownField(usize),
    #[error("signature field {0} has no value slot")]
    MissingSlot(usize),
}

impl From<std::io::Error> for SigpadError {
    fn from(err: std::io::Error) -> Self {
        SigpadError::Other(Box::new(err))
    }
}

#[cfg(feature = "cairo")]
impl From<cairo::Error> for SigpadError {
    fn from(err: cairo::Error) -> Self {
        SigpadError::Backend(Box::new(err))
    }
}

#[cfg(feature = "cairo")]
impl From<cairo::BorrowError> for SigpadError {
    fn from(err: cairo::BorrowError) -> Self {
        SigpadError::Backend(Box::new(err))
    }
}
