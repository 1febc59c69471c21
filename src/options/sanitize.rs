use std::str::FromStr;

use palette::{Srgb, Srgba};
use tracing::warn;

use super::{
    ColorStop, Gradient, Options, DEFAULT_BACKGROUND_COLOR, DEFAULT_DOTS_COLOR, DEFAULT_IMAGE_SIZE, DEFAULT_SIZE,
    MAX_TYPE_NUMBER,
};

/// Repairs values that decoded fine but can't be drawn: non-finite or out of range numbers,
/// unparsable colors, gradients without stops.
pub fn sanitize(mut opts: Options) -> Options {
    let drawing = &mut opts.drawing_options;
    drawing.width = positive_or(drawing.width, DEFAULT_SIZE);
    drawing.height = positive_or(drawing.height, DEFAULT_SIZE);
    drawing.margin = non_negative(drawing.margin);
    let max_margin = drawing.width.min(drawing.height);
    if drawing.margin > max_margin {
        drawing.margin = max_margin;
    }

    if opts.qr_options.type_number > MAX_TYPE_NUMBER {
        warn!(type_number = opts.qr_options.type_number, "type number clamped");
        opts.qr_options.type_number = MAX_TYPE_NUMBER;
    }

    let dots = &mut opts.dots_options;
    dots.color = color_or(&dots.color, DEFAULT_DOTS_COLOR);
    dots.gradient = dots.gradient.take().and_then(sanitize_gradient);

    let square = &mut opts.corners_square_options;
    square.color = square.color.take().and_then(optional_color);
    square.gradient = square.gradient.take().and_then(sanitize_gradient);

    let dot = &mut opts.corners_dot_options;
    dot.color = dot.color.take().and_then(optional_color);
    dot.gradient = dot.gradient.take().and_then(sanitize_gradient);

    let bg = &mut opts.background_options;
    bg.color = color_or(&bg.color, DEFAULT_BACKGROUND_COLOR);
    bg.gradient = bg.gradient.take().and_then(sanitize_gradient);
    bg.round = if bg.round.is_finite() { bg.round.clamp(0.0, 1.0) } else { 0.0 };

    let img = &mut opts.image_options;
    img.source = img.source.take().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    img.image_size = if img.image_size.is_finite() { img.image_size.clamp(0.0, 1.0) } else { DEFAULT_IMAGE_SIZE };
    img.margin = non_negative(img.margin);

    opts
}

fn positive_or(v: f64, default: f64) -> f64 {
    if !v.is_finite() {
        warn!(value = v, default, "non-finite size replaced");
        return default;
    }
    v.max(1.0)
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

fn sanitize_gradient(mut gradient: Gradient) -> Option<Gradient> {
    if !gradient.rotation.is_finite() {
        gradient.rotation = 0.0;
    }
    gradient.color_stops = gradient
        .color_stops
        .into_iter()
        .filter_map(|stop| {
            let color = optional_color(stop.color)?;
            let offset = if stop.offset.is_finite() { stop.offset.clamp(0.0, 1.0) } else { 0.0 };
            Some(ColorStop { offset, color })
        })
        .collect();

    if gradient.color_stops.is_empty() {
        warn!("gradient without color stops dropped");
        return None;
    }
    Some(gradient)
}

// Colors
//------------------------------------------------------------------------------

/// Accepts hex colors with 3, 4, 6 or 8 digits, `rgb()`/`rgba()`/`hsl()`/`hsla()`, SVG color
/// keywords and `transparent`/`none`.
pub fn is_valid_color(color: &str) -> bool {
    let color = color.trim();
    if color.starts_with('#') {
        return Srgb::<u8>::from_str(color).is_ok() || Srgba::<u8>::from_str(color).is_ok();
    }
    if color.ends_with(')') {
        return is_functional_color(color);
    }
    let name = color.to_ascii_lowercase();
    matches!(name.as_str(), "transparent" | "none") || palette::named::from_str(&name).is_some()
}

fn is_functional_color(color: &str) -> bool {
    let Some((name, args)) = color.strip_suffix(')').and_then(|c| c.split_once('(')) else {
        return false;
    };
    let hue_first = match name.trim().to_ascii_lowercase().as_str() {
        "rgb" | "rgba" => false,
        "hsl" | "hsla" => true,
        _ => return false,
    };
    let parts: Vec<&str> = args.split([',', ' ', '/']).filter(|p| !p.is_empty()).collect();
    matches!(parts.len(), 3 | 4) && parts.iter().enumerate().all(|(i, p)| is_css_number(p, hue_first && i == 0))
}

fn is_css_number(s: &str, angle: bool) -> bool {
    let num = match s.strip_suffix('%') {
        Some(n) => n,
        None if angle => s.strip_suffix("deg").unwrap_or(s),
        None => s,
    };
    num.parse::<f64>().is_ok_and(f64::is_finite)
}

fn color_or(color: &str, default: &str) -> String {
    if is_valid_color(color) {
        color.trim().to_string()
    } else {
        warn!(color, default, "invalid color replaced");
        default.to_string()
    }
}

fn optional_color(color: String) -> Option<String> {
    if is_valid_color(&color) {
        Some(color.trim().to_string())
    } else {
        warn!(%color, "invalid color dropped");
        None
    }
}
