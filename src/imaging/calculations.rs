//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `source` to fit within a `bound`×`bound` box, preserving aspect ratio.
///
/// Images already inside the box are returned unchanged; thumbnails never
/// upscale. Neither output edge drops below 1px.
///
/// # Examples
/// ```
/// # use photoscan::imaging::fit_within;
/// assert_eq!(fit_within((4000, 3000), 800), (800, 600));
/// assert_eq!(fit_within((3000, 4000), 800), (600, 800));
/// assert_eq!(fit_within((320, 200), 800), (320, 200));
/// ```
pub fn fit_within(source: (u32, u32), bound: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let longer = src_w.max(src_h);
    if longer <= bound || longer == 0 {
        return source;
    }

    let ratio = bound as f64 / longer as f64;
    if src_w >= src_h {
        (bound, ((src_h as f64 * ratio).round() as u32).max(1))
    } else {
        (((src_w as f64 * ratio).round() as u32).max(1), bound)
    }
}

/// Side of the square canvas and the offset at which `image` is centred on it.
///
/// Returns `(side, x, y)`.
pub fn square_padding(image: (u32, u32)) -> (u32, u32, u32) {
    let (w, h) = image;
    let side = w.max(h);
    (side, (side - w) / 2, (side - h) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // fit_within
    // =========================================================================

    #[test]
    fn fit_landscape() {
        assert_eq!(fit_within((1600, 1200), 640), (640, 480));
    }

    #[test]
    fn fit_portrait() {
        assert_eq!(fit_within((1200, 1600), 640), (480, 640));
    }

    #[test]
    fn fit_square() {
        assert_eq!(fit_within((2000, 2000), 75), (75, 75));
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_within((50, 40), 75), (50, 40));
        assert_eq!(fit_within((75, 10), 75), (75, 10));
    }

    #[test]
    fn fit_extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within((10000, 2), 100), (100, 1));
    }

    #[test]
    fn fit_rounds_to_nearest() {
        // 1000x333 → 150x49.95
        assert_eq!(fit_within((1000, 333), 150), (150, 50));
    }

    // =========================================================================
    // square_padding
    // =========================================================================

    #[test]
    fn padding_landscape_centres_vertically() {
        assert_eq!(square_padding((75, 56)), (75, 0, 9));
    }

    #[test]
    fn padding_portrait_centres_horizontally() {
        assert_eq!(square_padding((56, 75)), (75, 9, 0));
    }

    #[test]
    fn padding_already_square() {
        assert_eq!(square_padding((75, 75)), (75, 0, 0));
    }
}
