use crate::{dom::Element, options::DotType};

use super::fmt_rotation;

// Dot
//------------------------------------------------------------------------------

/// Draws a single module in one of the dot styles.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Dot(pub DotType);

impl Dot {
    /// `neighbor(dx, dy)` reports whether the module offset by `dx` columns and `dy` rows is a
    /// visible dark module.
    pub fn draw(self, x: f64, y: f64, size: f64, neighbor: impl Fn(i32, i32) -> bool) -> Element {
        match self.0 {
            DotType::Square => basic_square(x, y, size, 0),
            DotType::Dots => basic_dot(x, y, size, 0),
            DotType::Rounded => rounded(x, y, size, &neighbor, basic_corner_rounded),
            DotType::ExtraRounded => rounded(x, y, size, &neighbor, basic_corner_extra_rounded),
            DotType::Classy => classy(x, y, size, &neighbor, basic_corner_rounded),
            DotType::ClassyRounded => classy(x, y, size, &neighbor, basic_corner_extra_rounded),
        }
    }
}

type Shape = fn(f64, f64, f64, i32) -> Element;

struct Neighbors {
    left: bool,
    right: bool,
    top: bool,
    bottom: bool,
}

impl Neighbors {
    fn of(neighbor: &impl Fn(i32, i32) -> bool) -> Self {
        Self { left: neighbor(-1, 0), right: neighbor(1, 0), top: neighbor(0, -1), bottom: neighbor(0, 1) }
    }

    fn count(&self) -> u8 {
        self.left as u8 + self.right as u8 + self.top as u8 + self.bottom as u8
    }
}

fn rounded(x: f64, y: f64, size: f64, neighbor: &impl Fn(i32, i32) -> bool, corner: Shape) -> Element {
    let n = Neighbors::of(neighbor);
    match n.count() {
        0 => basic_dot(x, y, size, 0),
        c if c > 2 || (n.left && n.right) || (n.top && n.bottom) => basic_square(x, y, size, 0),
        2 => {
            let rotation = match (n.left, n.top, n.right, n.bottom) {
                (true, true, _, _) => 90,
                (_, true, true, _) => 180,
                (_, _, true, true) => -90,
                _ => 0,
            };
            corner(x, y, size, rotation)
        }
        _ => {
            let rotation = if n.top {
                90
            } else if n.right {
                180
            } else if n.bottom {
                -90
            } else {
                0
            };
            basic_side_rounded(x, y, size, rotation)
        }
    }
}

fn classy(x: f64, y: f64, size: f64, neighbor: &impl Fn(i32, i32) -> bool, corner: Shape) -> Element {
    let n = Neighbors::of(neighbor);
    if n.count() == 0 {
        return basic_corners_rounded(x, y, size, 90);
    }
    if !n.left && !n.top {
        return corner(x, y, size, -90);
    }
    if !n.right && !n.bottom {
        return corner(x, y, size, 90);
    }
    basic_square(x, y, size, 0)
}

// Basic figures
//------------------------------------------------------------------------------

fn rotate(el: Element, x: f64, y: f64, size: f64, rotation: i32) -> Element {
    match rotation {
        0 => el,
        r => el.attr("transform", fmt_rotation(r, x + size / 2.0, y + size / 2.0)),
    }
}

pub(crate) fn basic_dot(x: f64, y: f64, size: f64, rotation: i32) -> Element {
    let el = Element::new("circle").attr("cx", x + size / 2.0).attr("cy", y + size / 2.0).attr("r", size / 2.0);
    rotate(el, x, y, size, rotation)
}

pub(crate) fn basic_square(x: f64, y: f64, size: f64, rotation: i32) -> Element {
    let el = Element::new("rect").attr("x", x).attr("y", y).attr("width", size).attr("height", size);
    rotate(el, x, y, size, rotation)
}

// Flat on the left, half circle on the right
fn basic_side_rounded(x: f64, y: f64, size: f64, rotation: i32) -> Element {
    let h = size / 2.0;
    let d = format!("M {x} {y} v {size} h {h} a {h} {h} 0 0 0 0 {}", -size);
    rotate(Element::new("path").attr("d", d), x, y, size, rotation)
}

// Top right corner rounded
fn basic_corner_rounded(x: f64, y: f64, size: f64, rotation: i32) -> Element {
    let h = size / 2.0;
    let d = format!("M {x} {y} v {size} h {size} v {} a {h} {h} 0 0 0 {} {}", -h, -h, -h);
    rotate(Element::new("path").attr("d", d), x, y, size, rotation)
}

// Top right corner replaced by a quarter circle spanning the whole module
fn basic_corner_extra_rounded(x: f64, y: f64, size: f64, rotation: i32) -> Element {
    let d = format!("M {x} {y} v {size} h {size} a {size} {size} 0 0 0 {} {}", -size, -size);
    rotate(Element::new("path").attr("d", d), x, y, size, rotation)
}

// Bottom left and top right corners rounded
fn basic_corners_rounded(x: f64, y: f64, size: f64, rotation: i32) -> Element {
    let h = size / 2.0;
    let d = format!("M {x} {y} v {h} a {h} {h} 0 0 0 {h} {h} h {h} v {} a {h} {h} 0 0 0 {} {}", -h, -h, -h);
    rotate(Element::new("path").attr("d", d), x, y, size, rotation)
}

#[cfg(test)]
mod dot_tests {
    use test_case::test_case;

    use super::Dot;
    use crate::options::DotType;

    fn neighbors(left: bool, right: bool, top: bool, bottom: bool) -> impl Fn(i32, i32) -> bool {
        move |dx, dy| match (dx, dy) {
            (-1, 0) => left,
            (1, 0) => right,
            (0, -1) => top,
            (0, 1) => bottom,
            _ => false,
        }
    }

    #[test]
    fn test_square() {
        let el = Dot(DotType::Square).draw(10.0, 20.0, 5.0, neighbors(true, true, true, true));
        assert_eq!(el.to_xml(), r#"<rect x="10" y="20" width="5" height="5"/>"#);
    }

    #[test]
    fn test_dots() {
        let el = Dot(DotType::Dots).draw(0.0, 0.0, 10.0, neighbors(false, false, false, false));
        assert_eq!(el.to_xml(), r#"<circle cx="5" cy="5" r="5"/>"#);
    }

    #[test_case(false, false, false, false, "circle", None; "isolated")]
    #[test_case(true, true, false, false, "rect", None; "horizontal_line")]
    #[test_case(true, false, true, true, "rect", None; "three_neighbors")]
    #[test_case(true, false, false, true, "path", None; "corner_left_bottom")]
    #[test_case(true, false, true, false, "path", Some("rotate(90,5,5)"); "corner_left_top")]
    #[test_case(false, true, true, false, "path", Some("rotate(180,5,5)"); "corner_top_right")]
    #[test_case(false, true, false, true, "path", Some("rotate(-90,5,5)"); "corner_right_bottom")]
    #[test_case(true, false, false, false, "path", None; "side_left")]
    #[test_case(false, false, true, false, "path", Some("rotate(90,5,5)"); "side_top")]
    #[test_case(false, true, false, false, "path", Some("rotate(180,5,5)"); "side_right")]
    #[test_case(false, false, false, true, "path", Some("rotate(-90,5,5)"); "side_bottom")]
    fn test_rounded(left: bool, right: bool, top: bool, bottom: bool, name: &str, transform: Option<&str>) {
        let el = Dot(DotType::Rounded).draw(0.0, 0.0, 10.0, neighbors(left, right, top, bottom));
        assert_eq!(el.name(), name);
        assert_eq!(el.get_attr("transform"), transform);
    }

    #[test]
    fn test_rounded_paths() {
        let corner = Dot(DotType::Rounded).draw(0.0, 0.0, 10.0, neighbors(true, false, false, true));
        assert_eq!(corner.get_attr("d"), Some("M 0 0 v 10 h 10 v -5 a 5 5 0 0 0 -5 -5"));
        let extra = Dot(DotType::ExtraRounded).draw(0.0, 0.0, 10.0, neighbors(true, false, false, true));
        assert_eq!(extra.get_attr("d"), Some("M 0 0 v 10 h 10 a 10 10 0 0 0 -10 -10"));
        let side = Dot(DotType::Rounded).draw(0.0, 0.0, 10.0, neighbors(true, false, false, false));
        assert_eq!(side.get_attr("d"), Some("M 0 0 v 10 h 5 a 5 5 0 0 0 0 -10"));
    }

    #[test_case(false, false, false, false, "path", Some("rotate(90,5,5)"); "isolated")]
    #[test_case(false, true, false, true, "path", Some("rotate(-90,5,5)"); "open_top_left")]
    #[test_case(true, false, true, false, "path", Some("rotate(90,5,5)"); "open_bottom_right")]
    #[test_case(true, true, true, true, "rect", None; "surrounded")]
    fn test_classy(left: bool, right: bool, top: bool, bottom: bool, name: &str, transform: Option<&str>) {
        let el = Dot(DotType::Classy).draw(0.0, 0.0, 10.0, neighbors(left, right, top, bottom));
        assert_eq!(el.name(), name);
        assert_eq!(el.get_attr("transform"), transform);
    }

    #[test]
    fn test_classy_rounded_uses_extra_rounded_corner() {
        let el = Dot(DotType::ClassyRounded).draw(0.0, 0.0, 10.0, neighbors(false, true, false, true));
        assert_eq!(el.get_attr("d"), Some("M 0 0 v 10 h 10 a 10 10 0 0 0 -10 -10"));
    }
}
