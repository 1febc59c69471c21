use crate::{
    dom::Element,
    options::{CornerDotType, CornerSquareType},
};

use super::{
    dot::{basic_dot, basic_square},
    fmt_rotation,
};

// Finder masks
//------------------------------------------------------------------------------

/// Modules of the 7x7 finder ring.
pub(crate) fn square_mask(r: i32, c: i32) -> bool {
    (0..7).contains(&r) && (0..7).contains(&c) && (r == 0 || r == 6 || c == 0 || c == 6)
}

/// Modules of the 3x3 finder center, in the same 7x7 frame as [`square_mask`].
pub(crate) fn dot_mask(r: i32, c: i32) -> bool {
    (2..5).contains(&r) && (2..5).contains(&c)
}


// Corner square
//------------------------------------------------------------------------------

/// Draws the finder ring as one figure of `size` (seven modules) with its top left at `(x, y)`.
pub(crate) fn corner_square(kind: CornerSquareType, x: f64, y: f64, size: f64, rotation: i32) -> Element {
    let d = size / 7.0;
    let path = match kind {
        CornerSquareType::Dot => {
            let (cx, cy, r) = (x + size / 2.0, y + size / 2.0, size / 2.0);
            let inner = r - d;
            format!("M {cx} {} a {r} {r} 0 1 0 0.1 0 z m 0 {d} a {inner} {inner} 0 1 1 -0.1 0 Z", cy - r)
        }
        CornerSquareType::Square => {
            let inner = size - 2.0 * d;
            format!(
                "M {x} {y} h {size} v {size} h {} z M {} {} h {inner} v {inner} h {} z",
                -size,
                x + d,
                y + d,
                -inner
            )
        }
        CornerSquareType::ExtraRounded => {
            let (o, i) = (2.5 * d, 1.5 * d);
            let side = 2.0 * d;
            format!(
                "M {x} {} v {side} a {o} {o} 0 0 0 {o} {o} h {side} a {o} {o} 0 0 0 {o} {} v {} \
                 a {o} {o} 0 0 0 {} {} h {} a {o} {o} 0 0 0 {} {o} \
                 M {} {} h {side} a {i} {i} 0 0 1 {i} {i} v {side} a {i} {i} 0 0 1 {} {i} \
                 h {} a {i} {i} 0 0 1 {} {} v {} a {i} {i} 0 0 1 {i} {}",
                y + o,
                -o,
                -side,
                -o,
                -o,
                -side,
                -o,
                x + o,
                y + d,
                -i,
                -side,
                -i,
                -i,
                -side,
                -i,
            )
        }
    };
    let el = Element::new("path").attr("fill-rule", "evenodd").attr("d", path);
    match rotation {
        0 => el,
        r => el.attr("transform", fmt_rotation(r, x + size / 2.0, y + size / 2.0)),
    }
}

// Corner dot
//------------------------------------------------------------------------------

/// Draws the finder center as one figure of `size` (three modules) with its top left at `(x, y)`.
pub(crate) fn corner_dot(kind: CornerDotType, x: f64, y: f64, size: f64, rotation: i32) -> Element {
    match kind {
        CornerDotType::Dot => basic_dot(x, y, size, rotation),
        CornerDotType::Square => basic_square(x, y, size, rotation),
    }
}

#[cfg(test)]
mod corner_tests {
    use super::{corner_dot, corner_square};
    use crate::options::{CornerDotType, CornerSquareType};

    #[test]
    fn test_square_ring() {
        let el = corner_square(CornerSquareType::Square, 0.0, 0.0, 70.0, 0);
        assert_eq!(el.get_attr("d"), Some("M 0 0 h 70 v 70 h -70 z M 10 10 h 50 v 50 h -50 z"));
        assert_eq!(el.get_attr("fill-rule"), Some("evenodd"));
        assert_eq!(el.get_attr("transform"), None);
    }

    #[test]
    fn test_dot_ring() {
        let el = corner_square(CornerSquareType::Dot, 0.0, 0.0, 70.0, 90);
        assert_eq!(el.get_attr("d"), Some("M 35 0 a 35 35 0 1 0 0.1 0 z m 0 10 a 25 25 0 1 1 -0.1 0 Z"));
        assert_eq!(el.get_attr("transform"), Some("rotate(90,35,35)"));
    }

    #[test]
    fn test_extra_rounded_ring_closes() {
        let el = corner_square(CornerSquareType::ExtraRounded, 0.0, 0.0, 70.0, 0);
        let d = el.get_attr("d").unwrap();
        assert!(d.starts_with("M 0 25 v 20 a 25 25 0 0 0 25 25 h 20"));
        assert!(d.contains("M 25 10 h 20 a 15 15 0 0 1 15 15"));
    }

    #[test]
    fn test_corner_dot() {
        assert_eq!(corner_dot(CornerDotType::Dot, 20.0, 20.0, 30.0, 0).to_xml(), r#"<circle cx="35" cy="35" r="15"/>"#);
        assert_eq!(
            corner_dot(CornerDotType::Square, 20.0, 20.0, 30.0, -90).to_xml(),
            r#"<rect x="20" y="20" width="30" height="30" transform="rotate(-90,35,35)"/>"#
        );
    }
}
