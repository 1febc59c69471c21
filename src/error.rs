use qrcode::types::QrError;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StylingError {
    // Controller
    #[error("QR code is empty")]
    EmptyQr,
    #[error("container should be a single node that accepts children")]
    InvalidTarget,

    // Encoder
    #[error("failed to encode data: {0}")]
    Encode(#[from] QrError),

    // Renderer
    #[error("failed to load image {src}: {reason}")]
    ImageLoad { src: String, reason: String },
    #[error("drawing was superseded by a newer update")]
    Superseded,

    // Export
    #[error("download failed: {0}")]
    Download(String),
}

impl StylingError {
    // Data URIs can be huge, only the head is kept for display
    pub(crate) fn image_load(src: &str, reason: impl ToString) -> Self {
        let src = match src.char_indices().nth(64) {
            Some((i, _)) => format!("{}...", &src[..i]),
            None => src.to_string(),
        };
        Self::ImageLoad { src, reason: reason.to_string() }
    }
}

pub type StylingResult<T> = Result<T, StylingError>;
