//! Styling options.
//!
//! [`Options`] is the fully resolved configuration driving a single render. Callers never
//! build it field by field; they supply a [`PartialOptions`] document which [`normalize`]
//! deep-merges onto a previous configuration and then repairs into a usable one.
//!
//! ```rust
//! use qrstyle::options::{normalize, Options, PartialOptions};
//! use serde_json::json;
//!
//! let partial = PartialOptions::from(json!({
//!     "data": "https://example.com",
//!     "dotsOptions": { "type": "rounded", "color": "#4267b2" },
//! }));
//! let options = normalize(&Options::default(), &partial);
//! assert_eq!(options.drawing_options.width, 300.0);
//! assert_eq!(options.dots_options.color, "#4267b2");
//! ```

mod lenient;
mod merge;
mod sanitize;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use merge::merge_deep;
pub use sanitize::{is_valid_color, sanitize};

// Normalizer
//------------------------------------------------------------------------------

/// Merges `partial` onto `base` and repairs the result. Never fails and never mutates `base`.
pub fn normalize(base: &Options, partial: &PartialOptions) -> Options {
    let mut merged = match serde_json::to_value(base) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(%err, "failed to serialize base options");
            return sanitize(base.clone());
        }
    };
    merge_deep(&mut merged, partial.as_value());
    sanitize(lenient::repair_value(&merged))
}

/// A partial options document. Keys follow the camelCase names of [`Options`]; missing keys
/// keep their previous value and unrecognized keys are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialOptions(Value);

impl PartialOptions {
    pub fn new() -> Self {
        Self(Value::Object(Default::default()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Object(m) => m.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }
}

impl Default for PartialOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for PartialOptions {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&Options> for PartialOptions {
    fn from(options: &Options) -> Self {
        Self(serde_json::to_value(options).unwrap_or_default())
    }
}

impl FromStr for PartialOptions {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map(Self)
    }
}

// Options
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub data: String,
    #[serde(deserialize_with = "lenient::repair")]
    pub qr_options: QrOptions,
    #[serde(deserialize_with = "lenient::repair")]
    pub drawing_options: DrawingOptions,
    #[serde(deserialize_with = "lenient::repair")]
    pub dots_options: DotsOptions,
    #[serde(deserialize_with = "lenient::repair")]
    pub corners_square_options: CornersSquareOptions,
    #[serde(deserialize_with = "lenient::repair")]
    pub corners_dot_options: CornersDotOptions,
    #[serde(deserialize_with = "lenient::repair")]
    pub background_options: BackgroundOptions,
    #[serde(deserialize_with = "lenient::repair")]
    pub image_options: ImageOptions,
}

impl Options {
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrOptions {
    /// QR version, `0` picks the smallest version that fits the data.
    #[serde(deserialize_with = "lenient::saturating_u8")]
    pub type_number: u8,
    pub error_correction_level: ErrorCorrectionLevel,
    /// Encoding mode, detected from the data when unset.
    pub mode: Option<Mode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    #[serde(alias = "l")]
    L,
    #[serde(alias = "m")]
    M,
    #[default]
    #[serde(alias = "q")]
    Q,
    #[serde(alias = "h")]
    H,
}

impl ErrorCorrectionLevel {
    /// Share of modules the level can restore, used as the budget for dots hidden under an image.
    pub fn recovery_ratio(self) -> f64 {
        match self {
            Self::L => 0.07,
            Self::M => 0.15,
            Self::Q => 0.25,
            Self::H => 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(alias = "numeric")]
    Numeric,
    #[serde(alias = "alphanumeric")]
    Alphanumeric,
    #[serde(alias = "byte")]
    Byte,
    #[serde(alias = "kanji")]
    Kanji,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawingOptions {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Default for DrawingOptions {
    fn default() -> Self {
        Self { width: DEFAULT_SIZE, height: DEFAULT_SIZE, margin: 0.0 }
    }
}

// Shape styles
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotType {
    #[default]
    Square,
    Dots,
    Rounded,
    Classy,
    ClassyRounded,
    ExtraRounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerSquareType {
    Square,
    Dot,
    ExtraRounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerDotType {
    Square,
    Dot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DotsOptions {
    #[serde(rename = "type")]
    pub kind: DotType,
    pub color: String,
    pub gradient: Option<Gradient>,
}

impl Default for DotsOptions {
    fn default() -> Self {
        Self { kind: DotType::Square, color: DEFAULT_DOTS_COLOR.to_string(), gradient: None }
    }
}

/// Finder ring styling. Unset fields fall back to the dot styling.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CornersSquareOptions {
    #[serde(rename = "type")]
    pub kind: Option<CornerSquareType>,
    pub color: Option<String>,
    pub gradient: Option<Gradient>,
}

/// Finder center styling. Unset fields fall back to the dot styling.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CornersDotOptions {
    #[serde(rename = "type")]
    pub kind: Option<CornerDotType>,
    pub color: Option<String>,
    pub gradient: Option<Gradient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackgroundOptions {
    pub color: String,
    pub gradient: Option<Gradient>,
    /// Corner rounding of the background, `0` is a plain rectangle and `1` a circle.
    pub round: f64,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self { color: DEFAULT_BACKGROUND_COLOR.to_string(), gradient: None, round: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageOptions {
    /// `data:` URI or file path of the image drawn at the center.
    pub source: Option<String>,
    pub hide_background_dots: bool,
    /// Fraction of the recoverable area the image may cover.
    pub image_size: f64,
    pub margin: f64,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self { source: None, hide_background_dots: true, image_size: DEFAULT_IMAGE_SIZE, margin: 0.0 }
    }
}

// Gradient
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientType {
    #[default]
    Linear,
    Radial,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gradient {
    #[serde(rename = "type")]
    pub kind: GradientType,
    /// Rotation in radians, linear gradients only.
    pub rotation: f64,
    pub color_stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: String,
}

// Global constants
//------------------------------------------------------------------------------

pub const DEFAULT_SIZE: f64 = 300.0;
pub const DEFAULT_DOTS_COLOR: &str = "#000";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#fff";
pub const DEFAULT_IMAGE_SIZE: f64 = 0.4;
pub const MAX_TYPE_NUMBER: u8 = 40;
