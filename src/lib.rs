//! # qrstyle
//!
//! A Rust library for rendering styled QR codes as SVG. The QR symbol itself comes from the
//! `qrcode` encoder; this crate draws it with custom dot and corner shapes, gradients, a
//! rounded background and an embedded center image, and keeps the drawing up to date as
//! options change.
//!
//! ## Features
//!
//! - **Dot styles**: square, dots, rounded, extra-rounded, classy and classy-rounded modules
//! - **Corner styles**: finder rings and centers drawn as squares, circles or rounded outlines
//! - **Gradients**: linear and radial gradients for dots, corners and background
//! - **Embedded images**: a centered image with the dots behind it cleared within the error
//!   correction budget
//! - **Incremental updates**: partial options deep-merge onto the current configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use qrstyle::{PartialOptions, QrCodeStyling};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QrCodeStyling::new(&PartialOptions::from(json!({
//!     "data": "https://example.com",
//!     "qrOptions": { "errorCorrectionLevel": "H" },
//!     "dotsOptions": { "type": "rounded", "color": "#4267b2" },
//!     "cornersSquareOptions": { "type": "extra-rounded" },
//!     "backgroundOptions": { "color": "#e9ebee" },
//! })))?;
//!
//! let doc = qr.export_vector().await?;
//! assert_eq!(doc.mime, "image/svg+xml");
//! assert!(doc.as_str().unwrap().starts_with("<?xml"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Options
//!
//! Options are JSON documents with camelCase keys. Every update merges into the previous
//! configuration: objects merge key by key, everything else replaces. Values that can't be
//! used are repaired instead of rejected, e.g. an unparsable color falls back to its default.
//!
//! | Group | Keys |
//! |---|---|
//! | `qrOptions` | `typeNumber` (0 = smallest fit), `errorCorrectionLevel`, `mode` |
//! | `drawingOptions` | `width`, `height`, `margin` |
//! | `dotsOptions` | `type`, `color`, `gradient` |
//! | `cornersSquareOptions` | `type`, `color`, `gradient` |
//! | `cornersDotOptions` | `type`, `color`, `gradient` |
//! | `backgroundOptions` | `color`, `gradient`, `round` |
//! | `imageOptions` | `source`, `hideBackgroundDots`, `imageSize`, `margin` |

#![allow(clippy::items_after_test_module)]

pub mod dom;
pub mod download;
pub mod encode;
pub mod error;
pub mod options;
pub mod render;
pub mod styling;

pub use download::{DownloadTrigger, SaveToDir};
pub use encode::ModuleMatrix;
pub use error::{StylingError, StylingResult};
pub use options::{Options, PartialOptions};
pub use render::QrSvg;
pub use styling::{QrCodeStyling, VectorDocument};
