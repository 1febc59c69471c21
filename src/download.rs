//! Export plumbing: data URIs and the trigger that delivers them.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::info;

use crate::error::{StylingError, StylingResult};

pub const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;charset=utf-8,";

/// Percent-encodes an SVG document into a `data:` URI.
pub fn svg_data_uri(source: &str) -> String {
    format!("{SVG_DATA_URI_PREFIX}{}", urlencoding::encode(source))
}

/// Decodes the payload of a `data:` URI, base64 or percent-encoded.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let rest = uri.strip_prefix("data:").ok_or("not a data URI")?;
    let (header, data) = rest.split_once(',').ok_or("data URI without payload")?;
    if header.ends_with(";base64") {
        STANDARD.decode(data.trim()).map_err(|e| e.to_string())
    } else {
        Ok(urlencoding::decode_binary(data.as_bytes()).into_owned())
    }
}

// Download trigger
//------------------------------------------------------------------------------

/// Delivers an exported document to the user.
pub trait DownloadTrigger: Send + Sync {
    fn trigger(&self, uri: &str, filename: &str) -> StylingResult<()>;
}

/// Saves downloads into a directory.
#[derive(Debug, Clone)]
pub struct SaveToDir {
    dir: PathBuf,
}

impl SaveToDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for SaveToDir {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DownloadTrigger for SaveToDir {
    fn trigger(&self, uri: &str, filename: &str) -> StylingResult<()> {
        let Some(name) = Path::new(filename).file_name() else {
            return Err(StylingError::Download(format!("invalid file name {filename:?}")));
        };
        let bytes = decode_data_uri(uri).map_err(StylingError::Download)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes).map_err(|e| StylingError::Download(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "saved");
        Ok(())
    }
}
