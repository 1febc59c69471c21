use std::f64::consts::PI;

use crate::{
    dom::Element,
    options::{Gradient, GradientType},
};

/// Builds the `<linearGradient>`/`<radialGradient>` definition for a paint covering the box at
/// `(x, y)` of `w` by `h`. `extra_rotation` (radians) is added to the gradient's own rotation.
pub(crate) fn gradient_def(id: &str, gradient: &Gradient, extra_rotation: f64, x: f64, y: f64, w: f64, h: f64) -> Element {
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    let mut el = match gradient.kind {
        GradientType::Radial => Element::new("radialGradient")
            .attr("id", id)
            .attr("gradientUnits", "userSpaceOnUse")
            .attr("fx", cx)
            .attr("fy", cy)
            .attr("cx", cx)
            .attr("cy", cy)
            .attr("r", w.max(h) / 2.0),
        GradientType::Linear => {
            let (x1, y1, x2, y2) = linear_endpoints(gradient.rotation + extra_rotation, cx, cy, w, h);
            Element::new("linearGradient")
                .attr("id", id)
                .attr("gradientUnits", "userSpaceOnUse")
                .attr("x1", round(x1))
                .attr("y1", round(y1))
                .attr("x2", round(x2))
                .attr("y2", round(y2))
        }
    };

    for stop in &gradient.color_stops {
        el.push(Element::new("stop").attr("offset", format!("{}%", 100.0 * stop.offset)).attr("stop-color", &stop.color));
    }
    el
}

// Endpoints sit on the box edge the gradient direction points at
fn linear_endpoints(rotation: f64, cx: f64, cy: f64, w: f64, h: f64) -> (f64, f64, f64, f64) {
    let rotation = rotation % (2.0 * PI);
    let positive = rotation.rem_euclid(2.0 * PI);
    let (hw, hh) = (w / 2.0, h / 2.0);

    if positive <= 0.25 * PI || positive > 1.75 * PI {
        let dy = hh * rotation.tan();
        (cx - hw, cy - dy, cx + hw, cy + dy)
    } else if positive <= 0.75 * PI {
        let dx = hw / rotation.tan();
        (cx - dx, cy - hh, cx + dx, cy + hh)
    } else if positive <= 1.25 * PI {
        let dy = hh * rotation.tan();
        (cx + hw, cy + dy, cx - hw, cy - dy)
    } else {
        let dx = hw / rotation.tan();
        (cx + dx, cy + hh, cx - dx, cy - hh)
    }
}

// Avoids printing "-0"
fn round(v: f64) -> f64 {
    v.round() + 0.0
}
