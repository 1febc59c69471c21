use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageReader;
use tracing::debug;

use crate::{
    download::decode_data_uri,
    error::{StylingError, StylingResult},
};

// Image loading
//------------------------------------------------------------------------------

/// An image ready to be embedded, `href` is always a base64 data URI.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoadedImage {
    pub w: u32,
    pub h: u32,
    pub href: String,
}

/// Reads `src` from a `data:` URI or a file path and probes its dimensions.
pub(crate) async fn load_image(src: &str) -> StylingResult<LoadedImage> {
    let bytes = if src.starts_with("data:") {
        decode_data_uri(src).map_err(|e| StylingError::image_load(src, e))?
    } else if src.starts_with("http://") || src.starts_with("https://") {
        return Err(StylingError::image_load(src, "remote images are not supported"));
    } else {
        tokio::fs::read(src).await.map_err(|e| StylingError::image_load(src, e))?
    };

    let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format().map_err(|e| StylingError::image_load(src, e))?;
    let Some(format) = reader.format() else {
        return Err(StylingError::image_load(src, "unrecognized image format"));
    };
    let (w, h) = reader.into_dimensions().map_err(|e| StylingError::image_load(src, e))?;
    debug!(w, h, ?format, "image loaded");

    let href = format!("data:{};base64,{}", format.to_mime_type(), STANDARD.encode(&bytes));
    Ok(LoadedImage { w, h, href })
}

/// Whether loading `src` touches the file system.
pub(crate) fn needs_io(src: &str) -> bool {
    !src.starts_with("data:")
}

// Image sizing
//------------------------------------------------------------------------------

/// Size of the drawn image in pixels and of the module area hidden behind it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct ImageSize {
    pub w: f64,
    pub h: f64,
    pub hide_x: f64,
    pub hide_y: f64,
}

/// Fits an image of `orig_w` by `orig_h` into at most `max_hidden` modules, no wider or taller
/// than `max_axis` modules. Hidden areas always span an odd number of modules so they center
/// on the grid.
pub(crate) fn calculate_image_size(orig_w: f64, orig_h: f64, max_hidden: f64, max_axis: f64, dot_size: f64) -> ImageSize {
    if orig_w <= 0.0 || orig_h <= 0.0 || max_hidden <= 0.0 || dot_size <= 0.0 {
        return ImageSize::default();
    }
    let k = orig_h / orig_w;
    let axis_limited = |n: f64| max_axis > 0.0 && max_axis < n;

    let mut hide_x = (max_hidden / k).sqrt().floor().max(1.0);
    if axis_limited(hide_x) {
        hide_x = max_axis;
    }
    if hide_x % 2.0 == 0.0 {
        hide_x -= 1.0;
    }
    let mut w = hide_x * dot_size;
    let mut hide_y = 1.0 + 2.0 * ((hide_x * k - 1.0) / 2.0).ceil();
    let mut h = (w * k).round();

    if hide_y * hide_x > max_hidden || axis_limited(hide_y) {
        if axis_limited(hide_y) {
            hide_y = max_axis;
            if hide_y % 2.0 == 0.0 {
                hide_y -= 1.0;
            }
        } else {
            hide_y -= 2.0;
        }
        h = hide_y * dot_size;
        hide_x = 1.0 + 2.0 * ((hide_y / k - 1.0) / 2.0).ceil();
        w = (h / k).round();
    }

    ImageSize { w, h, hide_x, hide_y }
}
