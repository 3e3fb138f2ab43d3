//! Pure calculation functions for derivative dimensions.
//!
//! Rounding follows the usual "round half away from zero" so results are
//! reproducible across platforms.

/// Dimensions after capping the width at `max_width`, keeping the aspect
/// ratio. Never upscales.
///
/// ```
/// # use pushkind_vehicles::imaging::calculations::cap_width;
/// assert_eq!(cap_width((3000, 2000), 1920), (1920, 1280));
/// assert_eq!(cap_width((500, 300), 1920), (500, 300));
/// ```
pub fn cap_width(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= max_width || src_w == 0 {
        return source;
    }
    let h = (src_h as f64 * max_width as f64 / src_w as f64).round() as u32;
    (max_width, h.max(1))
}

/// Largest dimensions that fit inside `bounds` with the source aspect ratio.
/// Sources already inside the box are returned unchanged.
///
/// ```
/// # use pushkind_vehicles::imaging::calculations::fit_inside;
/// assert_eq!(fit_inside((1600, 1200), (800, 600)), (800, 600));
/// assert_eq!(fit_inside((1000, 1000), (800, 600)), (600, 600));
/// assert_eq!(fit_inside((640, 480), (800, 600)), (640, 480));
/// ```
pub fn fit_inside(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;
    if (src_w <= max_w && src_h <= max_h) || src_w == 0 || src_h == 0 {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_width_keeps_aspect_ratio() {
        assert_eq!(cap_width((3840, 2160), 1920), (1920, 1080));
        assert_eq!(cap_width((1921, 1), 1920), (1920, 1));
    }

    #[test]
    fn cap_width_never_upscales() {
        assert_eq!(cap_width((1920, 4000), 1920), (1920, 4000));
        assert_eq!(cap_width((10, 10), 1920), (10, 10));
    }

    #[test]
    fn fit_inside_limits_the_binding_edge() {
        assert_eq!(fit_inside((4000, 1000), (800, 600)), (800, 200));
        assert_eq!(fit_inside((1000, 4000), (800, 600)), (150, 600));
    }

    #[test]
    fn fit_inside_handles_one_edge_over_the_box() {
        assert_eq!(fit_inside((700, 900), (800, 600)), (467, 600));
    }
}
