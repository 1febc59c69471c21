//! Styled SVG renderer.
//!
//! A [`QrSvg`] owns the root `<svg>` node of one drawing. The root exists as soon as the
//! renderer is created; its children are computed by a shared future and published in one go
//! once drawing completes. Drawings carry a [`RenderToken`], a drawing whose generation has
//! been superseded stops before publishing anything.

mod corner;
mod dot;
mod gradient;
mod image;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use futures_util::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use tokio::runtime::Handle;
use tracing::debug;

use crate::{
    dom::{Element, Node, NodeRef},
    encode::ModuleMatrix,
    error::{StylingError, StylingResult},
    options::{Gradient, Options},
};
use corner::{corner_dot, corner_square, dot_mask, square_mask};
use dot::Dot;
use gradient::gradient_def;
use self::image::{calculate_image_size, load_image, needs_io, ImageSize, LoadedImage};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

static INSTANCES: AtomicU64 = AtomicU64::new(0);

pub(crate) fn fmt_rotation(deg: i32, cx: f64, cy: f64) -> String {
    format!("rotate({deg},{cx},{cy})")
}

// Generation
//------------------------------------------------------------------------------

/// Monotonic counter of drawing generations shared by a controller and its drawings.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for the latest generation.
    pub fn current(&self) -> RenderToken {
        RenderToken { gen: self.0.load(Ordering::Acquire), latest: self.0.clone() }
    }

    /// Starts a new generation, superseding every token handed out so far.
    pub fn advance(&self) -> RenderToken {
        let gen = self.0.fetch_add(1, Ordering::AcqRel) + 1;
        RenderToken { gen, latest: self.0.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct RenderToken {
    gen: u64,
    latest: Arc<AtomicU64>,
}

impl RenderToken {
    pub fn generation(&self) -> u64 {
        self.gen
    }

    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.gen
    }
}

#[cfg(test)]
mod generation_tests {
    use super::Generation;

    #[test]
    fn test_advance_supersedes() {
        let gen = Generation::new();
        let first = gen.advance();
        assert_eq!(first.generation(), 1);
        assert!(!first.is_superseded());
        assert!(!gen.current().is_superseded());

        let second = gen.clone().advance();
        assert_eq!(second.generation(), 2);
        assert!(first.is_superseded());
        assert!(!second.is_superseded());
    }
}

// QR SVG
//------------------------------------------------------------------------------

type Drawing = Shared<BoxFuture<'static, StylingResult<()>>>;

/// One drawing of a module matrix. Cloning shares the root node and the drawing.
#[derive(Clone)]
pub struct QrSvg {
    root: NodeRef,
    drawing: Drawing,
    gen: u64,
}

impl QrSvg {
    /// Creates the root node and starts drawing.
    ///
    /// With a tokio runtime around, drawing is spawned onto it. Without one, a drawing that
    /// needs no file access completes before this returns; others run when first awaited and
    /// then need a tokio runtime.
    pub fn new(options: Arc<Options>, qr: Arc<ModuleMatrix>, token: RenderToken) -> Self {
        let id = INSTANCES.fetch_add(1, Ordering::Relaxed);
        let d = &options.drawing_options;
        let root = NodeRef::new(
            Element::new("svg")
                .attr("xmlns", SVG_NS)
                .attr("width", d.width)
                .attr("height", d.height)
                .attr("viewBox", format!("0 0 {} {}", d.width, d.height)),
        );
        let gen = token.generation();
        let io = options.image_options.source.as_deref().is_some_and(needs_io);

        let drawing = draw(options, qr, token, root.clone(), id).boxed().shared();
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(drawing.clone());
            }
            Err(_) if !io => {
                let _ = drawing.clone().now_or_never();
            }
            Err(_) => debug!(gen, "drawing deferred until awaited"),
        }
        Self { root, drawing, gen }
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    pub fn generation(&self) -> u64 {
        self.gen
    }

    /// Resolves once drawing has finished.
    pub async fn wait(&self) -> StylingResult<()> {
        self.drawing.clone().await
    }

    pub fn is_drawn(&self) -> bool {
        matches!(self.drawing.peek(), Some(Ok(())))
    }

    pub fn to_xml(&self) -> String {
        self.root.to_xml()
    }
}

impl std::fmt::Debug for QrSvg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrSvg").field("root", &self.root).field("gen", &self.gen).finish_non_exhaustive()
    }
}

async fn draw(
    options: Arc<Options>,
    qr: Arc<ModuleMatrix>,
    token: RenderToken,
    root: NodeRef,
    id: u64,
) -> StylingResult<()> {
    let image = match &options.image_options.source {
        Some(src) => Some(load_image(src).await),
        None => None,
    };
    if token.is_superseded() {
        debug!(gen = token.generation(), "drawing superseded");
        return Err(StylingError::Superseded);
    }
    let image = image.transpose()?;

    let children = Canvas::new(&options, &qr, image.as_ref(), id).draw();
    root.replace_children(children);
    debug!(gen = token.generation(), modules = qr.module_count(), "drawing published");
    Ok(())
}

// Canvas
//------------------------------------------------------------------------------

// Finder pattern origins in units of `n - 7` modules, with their rotation in degrees
const FINDERS: [(i32, i32, i32); 3] = [(0, 0, 0), (1, 0, 90), (0, 1, -90)];

struct Canvas<'a> {
    opts: &'a Options,
    qr: &'a ModuleMatrix,
    image: Option<&'a LoadedImage>,
    n: i32,
    dot: f64,
    x0: f64,
    y0: f64,
    hidden: ImageSize,
    id: u64,
    defs: Vec<Element>,
}

impl<'a> Canvas<'a> {
    fn new(opts: &'a Options, qr: &'a ModuleMatrix, image: Option<&'a LoadedImage>, id: u64) -> Self {
        let n = qr.module_count() as i32;
        let d = &opts.drawing_options;
        let min_size = d.width.min(d.height) - 2.0 * d.margin;
        let dot = (min_size / n as f64).floor().max(0.0);
        let x0 = ((d.width - n as f64 * dot) / 2.0).floor();
        let y0 = ((d.height - n as f64 * dot) / 2.0).floor();

        let hidden = match image {
            Some(img) => {
                let cover = opts.image_options.image_size * qr.ec_level().recovery_ratio();
                let max_hidden = (cover * (n * n) as f64).floor();
                calculate_image_size(img.w as f64, img.h as f64, max_hidden, (n - 14) as f64, dot)
            }
            None => ImageSize::default(),
        };

        Self { opts, qr, image, n, dot, x0, y0, hidden, id, defs: Vec::new() }
    }

    fn draw(mut self) -> Vec<Node> {
        let opts = self.opts;
        let d = &opts.drawing_options;
        let dots_opts = &opts.dots_options;

        let background = self.draw_background();
        let mut dots = self.draw_dots();
        let corners = self.draw_corners(&mut dots);
        let fill = self.paint("dots-color", &dots_opts.color, dots_opts.gradient.as_ref(), 0, 0.0, 0.0, d.width, d.height);
        let image = self.draw_image();

        let mut children: Vec<Node> = Vec::new();
        if !self.defs.is_empty() {
            children.push(group(Element::new("defs"), std::mem::take(&mut self.defs)).into());
        }
        children.push(background.into());
        children.push(group(Element::new("g").attr("class", "dots").attr("fill", fill), dots).into());
        children.extend(corners.into_iter().map(Node::from));
        children.extend(image.map(Node::from));
        children
    }

    /// Returns the fill value for a paint, registering a gradient definition when needed.
    #[allow(clippy::too_many_arguments)]
    fn paint(&mut self, name: &str, color: &str, gradient: Option<&Gradient>, rotation: i32, x: f64, y: f64, w: f64, h: f64) -> String {
        match gradient {
            Some(g) => {
                let id = format!("{name}-{}", self.id);
                self.defs.push(gradient_def(&id, g, (rotation as f64).to_radians(), x, y, w, h));
                format!("url(#{id})")
            }
            None => color.to_string(),
        }
    }

    fn is_hidden(&self, r: i32, c: i32) -> bool {
        if self.image.is_none() || !self.opts.image_options.hide_background_dots {
            return false;
        }
        let (n, r, c) = (self.n as f64, r as f64, c as f64);
        let ImageSize { hide_x, hide_y, .. } = self.hidden;
        c >= (n - hide_x) / 2.0 && c < (n + hide_x) / 2.0 && r >= (n - hide_y) / 2.0 && r < (n + hide_y) / 2.0
    }

    /// Dark modules drawn as plain dots, finder patterns and the image area excluded.
    fn is_drawable(&self, r: i32, c: i32) -> bool {
        if !self.qr.is_dark(r, c) {
            return false;
        }
        let n = self.n;
        let in_finder = (r < 7 && c < 7) || (r < 7 && c >= n - 7) || (r >= n - 7 && c < 7);
        !in_finder && !self.is_hidden(r, c)
    }
}

fn group(parent: Element, shapes: Vec<Element>) -> Element {
    shapes.into_iter().fold(parent, |g, s| g.child(s))
}

// Background
//------------------------------------------------------------------------------

impl Canvas<'_> {
    fn draw_background(&mut self) -> Element {
        let opts = self.opts;
        let (d, bg) = (&opts.drawing_options, &opts.background_options);
        let fill = self.paint("background-color", &bg.color, bg.gradient.as_ref(), 0, 0.0, 0.0, d.width, d.height);

        let rect = if bg.round > 0.0 {
            let size = d.width.min(d.height);
            Element::new("rect")
                .attr("x", (d.width - size) / 2.0)
                .attr("y", (d.height - size) / 2.0)
                .attr("width", size)
                .attr("height", size)
                .attr("rx", bg.round * size / 2.0)
        } else {
            Element::new("rect").attr("x", 0).attr("y", 0).attr("width", d.width).attr("height", d.height)
        };
        rect.attr("class", "background").attr("fill", fill)
    }
}

// Dots
//------------------------------------------------------------------------------

impl Canvas<'_> {
    fn draw_dots(&self) -> Vec<Element> {
        let dot = Dot(self.opts.dots_options.kind);
        let mut shapes = Vec::new();
        for r in 0..self.n {
            for c in 0..self.n {
                if !self.is_drawable(r, c) {
                    continue;
                }
                let (x, y) = (self.x0 + c as f64 * self.dot, self.y0 + r as f64 * self.dot);
                shapes.push(dot.draw(x, y, self.dot, |dx, dy| self.is_drawable(r + dy, c + dx)));
            }
        }
        shapes
    }
}

// Corners
//------------------------------------------------------------------------------

impl Canvas<'_> {
    /// Draws the finder patterns. Shapes without a paint of their own go into `dots`.
    fn draw_corners(&mut self, dots: &mut Vec<Element>) -> Vec<Element> {
        let opts = self.opts;
        let (sq, cd) = (&opts.corners_square_options, &opts.corners_dot_options);
        let fallback = Dot(opts.dots_options.kind);
        let span = (self.n - 7) as f64 * self.dot;
        let mut groups = Vec::new();

        for (i, (col, row, rotation)) in FINDERS.into_iter().enumerate() {
            let x = self.x0 + col as f64 * span;
            let y = self.y0 + row as f64 * span;

            let size = 7.0 * self.dot;
            let shapes = match sq.kind {
                Some(kind) => vec![corner_square(kind, x, y, size, rotation)],
                None => self.masked(fallback, x, y, square_mask),
            };
            if sq.color.is_some() || sq.gradient.is_some() {
                let color = sq.color.as_deref().unwrap_or(&opts.dots_options.color);
                let name = format!("corners-square-color-{i}");
                let fill = self.paint(&name, color, sq.gradient.as_ref(), rotation, x, y, size, size);
                groups.push(group(Element::new("g").attr("class", "corners-square").attr("fill", fill), shapes));
            } else {
                dots.extend(shapes);
            }

            let size = 3.0 * self.dot;
            let (dx, dy) = (x + 2.0 * self.dot, y + 2.0 * self.dot);
            let shapes = match cd.kind {
                Some(kind) => vec![corner_dot(kind, dx, dy, size, rotation)],
                None => self.masked(fallback, x, y, dot_mask),
            };
            if cd.color.is_some() || cd.gradient.is_some() {
                let color = cd.color.as_deref().unwrap_or(&opts.dots_options.color);
                let name = format!("corners-dot-color-{i}");
                let fill = self.paint(&name, color, cd.gradient.as_ref(), rotation, dx, dy, size, size);
                groups.push(group(Element::new("g").attr("class", "corners-dot").attr("fill", fill), shapes));
            } else {
                dots.extend(shapes);
            }
        }
        groups
    }

    // Module by module over a 7x7 frame, neighbours come from the mask
    fn masked(&self, dot: Dot, x: f64, y: f64, mask: fn(i32, i32) -> bool) -> Vec<Element> {
        let mut shapes = Vec::new();
        for r in 0..7 {
            for c in 0..7 {
                if !mask(r, c) {
                    continue;
                }
                let (mx, my) = (x + c as f64 * self.dot, y + r as f64 * self.dot);
                shapes.push(dot.draw(mx, my, self.dot, |dx, dy| mask(r + dy, c + dx)));
            }
        }
        shapes
    }
}

// Image
//------------------------------------------------------------------------------

impl Canvas<'_> {
    fn draw_image(&self) -> Option<Element> {
        let img = self.image?;
        let m = self.opts.image_options.margin;
        let ImageSize { w, h, .. } = self.hidden;
        let (dw, dh) = (w - 2.0 * m, h - 2.0 * m);
        if dw <= 0.0 || dh <= 0.0 {
            debug!(w, h, margin = m, "image too small to draw");
            return None;
        }
        let grid = self.n as f64 * self.dot;
        let dx = self.x0 + m + (grid - w) / 2.0;
        let dy = self.y0 + m + (grid - h) / 2.0;
        Some(
            Element::new("image")
                .attr("href", &img.href)
                .attr("x", dx)
                .attr("y", dy)
                .attr("width", dw)
                .attr("height", dh),
        )
    }
}

#[cfg(test)]
mod qr_svg_tests {
    use std::sync::Arc;

    use futures_util::FutureExt;
    use serde_json::json;

    use super::{Generation, QrSvg};
    use crate::{
        dom::{Element, Node},
        encode::{encode, ModuleMatrix},
        error::StylingError,
        options::{normalize, Options, PartialOptions},
    };

    const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn render(value: serde_json::Value) -> (QrSvg, Arc<ModuleMatrix>) {
        let opts = normalize(&Options::default(), &PartialOptions::from(value));
        let qr = Arc::new(encode(&opts.data, &opts.qr_options).unwrap());
        let svg = QrSvg::new(Arc::new(opts), qr.clone(), Generation::new().advance());
        (svg, qr)
    }

    fn children(svg: &QrSvg) -> Vec<Element> {
        svg.root().with(|node| match node {
            Node::Element(el) => el
                .children()
                .iter()
                .filter_map(|c| match c {
                    Node::Element(el) => Some(el.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    fn by_class<'a>(children: &'a [Element], class: &str) -> Vec<&'a Element> {
        children.iter().filter(|el| el.get_attr("class") == Some(class)).collect()
    }

    #[test]
    fn test_root() {
        let (svg, _) = render(json!({ "data": "hello", "drawingOptions": { "width": 200, "height": 100 } }));
        assert!(svg.is_drawn());
        svg.root().with(|node| {
            let Node::Element(el) = node else { panic!("root should be an element") };
            assert_eq!(el.name(), "svg");
            assert_eq!(el.get_attr("xmlns"), Some("http://www.w3.org/2000/svg"));
            assert_eq!(el.get_attr("width"), Some("200"));
            assert_eq!(el.get_attr("height"), Some("100"));
            assert_eq!(el.get_attr("viewBox"), Some("0 0 200 100"));
        });
    }

    #[test]
    fn test_square_dots_cover_dark_modules() {
        let (svg, qr) = render(json!({ "data": "hello" }));
        let children = children(&svg);
        assert_eq!(children[0].get_attr("class"), Some("background"));
        assert_eq!(children[0].get_attr("fill"), Some("#fff"));

        let dots = by_class(&children, "dots");
        assert_eq!(dots.len(), 1);
        assert_eq!(dots[0].get_attr("fill"), Some("#000"));
        assert_eq!(dots[0].find_all("rect").len(), qr.count_dark_modules());
    }

    #[test]
    fn test_geometry() {
        // 21 modules in 300px: 14px dots, centered with 3px slack
        let (svg, _) = render(json!({ "data": "hello", "qrOptions": { "errorCorrectionLevel": "L" } }));
        let children = children(&svg);
        let rects = by_class(&children, "dots")[0].find_all("rect");
        assert!(rects.iter().all(|r| r.get_attr("width") == Some("14")));
        assert!(rects.iter().any(|r| r.get_attr("x") == Some("3") && r.get_attr("y") == Some("3")));
        assert!(rects.iter().any(|r| r.get_attr("x") == Some("283") && r.get_attr("y") == Some("3")));
    }

    #[test]
    fn test_corner_styles() {
        let (svg, _) = render(json!({
            "data": "hello",
            "cornersSquareOptions": { "type": "extra-rounded", "color": "#f00" },
            "cornersDotOptions": { "type": "dot" },
        }));
        let children = children(&svg);
        let squares = by_class(&children, "corners-square");
        assert_eq!(squares.len(), 3);
        assert!(squares.iter().all(|g| g.get_attr("fill") == Some("#f00")));
        assert!(squares.iter().all(|g| g.find_all("path").len() == 1));

        // Corner dots without a paint join the dots layer
        assert!(by_class(&children, "corners-dot").is_empty());
        assert_eq!(by_class(&children, "dots")[0].find_all("circle").len(), 3);
    }

    #[test]
    fn test_gradients() {
        let (svg, _) = render(json!({
            "data": "hello",
            "dotsOptions": { "gradient": { "type": "radial", "colorStops": [
                { "offset": 0, "color": "#f00" }, { "offset": 1, "color": "#00f" },
            ] } },
            "cornersDotOptions": { "gradient": { "rotation": 0.5, "colorStops": [{ "offset": 0, "color": "#0f0" }] } },
        }));
        let children = children(&svg);
        assert_eq!(children[0].name(), "defs");
        assert_eq!(children[0].find_all("radialGradient").len(), 1);
        assert_eq!(children[0].find_all("linearGradient").len(), 3);

        let fill = by_class(&children, "dots")[0].get_attr("fill").unwrap();
        assert!(fill.starts_with("url(#dots-color-"));
        assert_eq!(by_class(&children, "corners-dot").len(), 3);
    }

    #[test]
    fn test_round_background() {
        let (svg, _) = render(json!({
            "data": "hello",
            "drawingOptions": { "width": 400, "height": 200 },
            "backgroundOptions": { "round": 0.5, "color": "red" },
        }));
        let bg = children(&svg).remove(0);
        assert_eq!(bg.get_attr("x"), Some("100"));
        assert_eq!(bg.get_attr("width"), Some("200"));
        assert_eq!(bg.get_attr("rx"), Some("50"));
        assert_eq!(bg.get_attr("fill"), Some("red"));
    }

    #[test]
    fn test_image_hides_dots() {
        let data = "https://example.com/some/long/path";
        let (plain, qr) = render(json!({ "data": data, "qrOptions": { "errorCorrectionLevel": "H" } }));
        let (with_image, _) = render(json!({
            "data": data,
            "qrOptions": { "errorCorrectionLevel": "H" },
            "imageOptions": { "source": PIXEL_PNG },
        }));
        assert!(with_image.is_drawn());

        let plain = children(&plain);
        let with_image = children(&with_image);
        let count = |c: &[Element]| by_class(c, "dots")[0].find_all("rect").len();
        assert_eq!(count(plain.as_slice()), qr.count_dark_modules());
        assert!(count(with_image.as_slice()) < count(plain.as_slice()));

        let image = with_image.last().unwrap();
        assert_eq!(image.name(), "image");
        assert!(image.get_attr("href").unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_image_kept_dots() {
        let data = "https://example.com/some/long/path";
        let (plain, _) = render(json!({ "data": data }));
        let (with_image, _) = render(json!({
            "data": data,
            "imageOptions": { "source": PIXEL_PNG, "hideBackgroundDots": false },
        }));
        let count = |svg: &QrSvg| by_class(&children(svg), "dots")[0].find_all("rect").len();
        assert_eq!(count(&with_image), count(&plain));
    }

    #[test]
    fn test_broken_image_fails_drawing() {
        let (svg, _) = render(json!({ "data": "hello", "imageOptions": { "source": "data:image/png;base64,AAAA" } }));
        let res = svg.wait().now_or_never().unwrap();
        assert!(matches!(res, Err(StylingError::ImageLoad { .. })));
        assert!(!svg.is_drawn());
        assert_eq!(svg.root().child_count(), 0);
    }

    #[test]
    fn test_superseded_drawing_publishes_nothing() {
        let opts = normalize(&Options::default(), &PartialOptions::from(json!({ "data": "hello" })));
        let qr = Arc::new(encode(&opts.data, &opts.qr_options).unwrap());
        let gen = Generation::new();
        let stale = gen.advance();
        gen.advance();

        let svg = QrSvg::new(Arc::new(opts), qr, stale);
        assert_eq!(svg.wait().now_or_never(), Some(Err(StylingError::Superseded)));
        assert_eq!(svg.root().child_count(), 0);
    }

    #[tokio::test]
    async fn test_spawned_on_runtime() {
        let (svg, _) = render(json!({ "data": "hello", "dotsOptions": { "type": "classy-rounded" } }));
        svg.wait().await.unwrap();
        assert!(svg.is_drawn());
        assert!(svg.root().child_count() >= 2);
        assert_eq!(svg.clone().to_xml(), svg.to_xml());
    }
}
