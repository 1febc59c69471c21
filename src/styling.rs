use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{
    dom::NodeRef,
    download::{svg_data_uri, DownloadTrigger, SaveToDir},
    encode::{encode, ModuleMatrix},
    error::{StylingError, StylingResult},
    options::{normalize, Options, PartialOptions},
    render::{Generation, QrSvg},
};

pub const SVG_PROLOG: &str = "<?xml version=\"1.0\" standalone=\"no\"?>\r\n";
pub const SVG_MIME: &str = "image/svg+xml";
pub const DEFAULT_FILENAME: &str = "qr";

/// A serialized drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorDocument {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl VectorDocument {
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

// Controller
//------------------------------------------------------------------------------

/// Keeps options, module matrix and drawing in sync across updates.
///
/// ```rust
/// use qrstyle::{dom::NodeRef, PartialOptions, QrCodeStyling};
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut qr = QrCodeStyling::new(&PartialOptions::from(json!({ "data": "hello" })))?;
/// let body = NodeRef::element("div");
/// qr.attach(&body)?;
/// qr.update(Some(&PartialOptions::from(json!({ "dotsOptions": { "type": "dots" } }))))?;
/// assert_eq!(body.child_count(), 1);
/// # Ok(())
/// # }
/// ```
pub struct QrCodeStyling {
    options: Arc<Options>,
    container: Option<NodeRef>,
    qr: Option<Arc<ModuleMatrix>>,
    svg: Option<QrSvg>,
    generation: Generation,
    downloader: Box<dyn DownloadTrigger>,
}

impl QrCodeStyling {
    pub fn new(partial: &PartialOptions) -> StylingResult<Self> {
        let mut styling = Self {
            options: Arc::new(normalize(&Options::default(), partial)),
            container: None,
            qr: None,
            svg: None,
            generation: Generation::new(),
            downloader: Box::new(SaveToDir::default()),
        };
        styling.update(None)?;
        Ok(styling)
    }

    /// Replaces the trigger used by [`Self::export_file`].
    pub fn with_download_trigger(mut self, trigger: impl DownloadTrigger + 'static) -> Self {
        self.downloader = Box::new(trigger);
        self
    }

    /// Merges `partial` into the options and redraws. `None` redraws with the current options.
    ///
    /// Without data the controller is left empty. If encoding fails, the error is returned
    /// and the controller is left empty as well.
    pub fn update(&mut self, partial: Option<&PartialOptions>) -> StylingResult<()> {
        if let Some(container) = &self.container {
            container.clear_children();
        }
        if let Some(partial) = partial {
            self.options = Arc::new(normalize(&self.options, partial));
        }
        self.qr = None;
        self.svg = None;
        let token = self.generation.advance();

        if !self.options.has_data() {
            debug!(gen = token.generation(), "no data to draw");
            return Ok(());
        }

        let qr = Arc::new(encode(&self.options.data, &self.options.qr_options)?);
        let svg = QrSvg::new(self.options.clone(), qr.clone(), token);
        debug!(gen = svg.generation(), version = qr.version(), "drawing created");
        if let Some(container) = &self.container {
            container.append_child(svg.root().clone())?;
        }
        self.qr = Some(qr);
        self.svg = Some(svg);
        Ok(())
    }

    /// Moves the drawing into `target` and keeps it there across updates.
    ///
    /// The root has a single parent: it leaves the previous target, and attaching to the same
    /// target again leaves one copy at the end of its children.
    pub fn attach(&mut self, target: &NodeRef) -> StylingResult<()> {
        if !target.accepts_children() {
            return Err(StylingError::InvalidTarget);
        }
        if let Some(svg) = &self.svg {
            let root = svg.root();
            if target.is_within(root) {
                return Err(StylingError::InvalidTarget);
            }
            if let Some(prev) = &self.container {
                prev.remove_child(root);
            }
            target.remove_child(root);
            target.append_child(root.clone())?;
        }
        self.container = Some(target.clone());
        Ok(())
    }

    /// Serializes the finished drawing into a standalone SVG document.
    pub async fn export_vector(&self) -> StylingResult<VectorDocument> {
        let svg = self.rendered()?;
        svg.wait().await?;

        let xml = svg.to_xml();
        let mut text = String::with_capacity(SVG_PROLOG.len() + xml.len());
        text.push_str(SVG_PROLOG);
        text.push_str(&xml);
        Ok(VectorDocument { mime: SVG_MIME, bytes: text.into_bytes() })
    }

    /// Exports the drawing through the download trigger as `<name>.svg`, `qr.svg` by default.
    pub async fn export_file(&self, name: Option<&str>) -> StylingResult<()> {
        let doc = self.export_vector().await?;
        let source = String::from_utf8_lossy(&doc.bytes);
        let filename = format!("{}.svg", name.unwrap_or(DEFAULT_FILENAME));
        debug!(%filename, bytes = doc.bytes.len(), "exporting");
        self.downloader.trigger(&svg_data_uri(&source), &filename)
    }

    fn rendered(&self) -> StylingResult<QrSvg> {
        let qr = self.qr.as_ref().ok_or(StylingError::EmptyQr)?;
        Ok(match &self.svg {
            Some(svg) => svg.clone(),
            None => QrSvg::new(self.options.clone(), qr.clone(), self.generation.current()),
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn module_matrix(&self) -> Option<&ModuleMatrix> {
        self.qr.as_deref()
    }

    pub fn drawing(&self) -> Option<&QrSvg> {
        self.svg.as_ref()
    }

    pub fn container(&self) -> Option<&NodeRef> {
        self.container.as_ref()
    }
}

impl fmt::Debug for QrCodeStyling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrCodeStyling")
            .field("options", &self.options)
            .field("container", &self.container)
            .field("svg", &self.svg)
            .finish_non_exhaustive()
    }
}
