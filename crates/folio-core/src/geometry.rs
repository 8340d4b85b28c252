#![forbid(unsafe_code)]

//! Geometric primitives and viewport tests.

/// Fraction of the viewport height that an element's top must reach before a
/// reveal animation fires.
pub const REVEAL_THRESHOLD: f64 = 0.85;

/// A client rectangle as reported by `getBoundingClientRect`.
///
/// Uses CSS pixels relative to the viewport origin (top-left). Edges may be
/// negative when the element is scrolled above or left of the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top edge.
    pub top: f64,
    /// Left edge.
    pub left: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// The same rectangle moved vertically by `dy`.
    #[inline]
    pub fn translate_y(&self, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            ..*self
        }
    }

    /// The same rectangle grown by `margin` on every side.
    #[inline]
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            top: self.top - margin,
            left: self.left - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }
}

/// Size of the visual viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The viewport as a rectangle anchored at the origin.
    #[inline]
    pub const fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Layout box of an element in document coordinates (`offsetTop`/`offsetHeight`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffsetBox {
    pub top: f64,
    pub height: f64,
}

impl OffsetBox {
    #[inline]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Whether `y` falls in `[top, top + height)`.
    #[inline]
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

/// Strict containment: every edge of `rect` lies inside the window.
#[must_use]
pub fn is_in_viewport(rect: &Rect, viewport: Viewport) -> bool {
    rect.top >= 0.0
        && rect.left >= 0.0
        && rect.bottom() <= viewport.height
        && rect.right() <= viewport.width
}

/// Partial visibility used by reveal triggers.
///
/// True once the element's top has risen to the lower 85% band of the window
/// and its bottom has not yet left through the top.
#[must_use]
pub fn is_partially_visible(rect: &Rect, viewport: Viewport) -> bool {
    rect.top <= viewport.height * REVEAL_THRESHOLD && rect.bottom() >= 0.0
}

/// Whether `rect` intersects the window grown by `margin` pixels on each side.
#[must_use]
pub fn intersects_with_margin(rect: &Rect, viewport: Viewport, margin: f64) -> bool {
    let zone = viewport.rect().expand(margin);
    rect.left < zone.right()
        && rect.right() > zone.left
        && rect.top < zone.bottom()
        && rect.bottom() > zone.top
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport::new(1280.0, 800.0);

    #[test]
    fn strict_containment_requires_all_edges() {
        assert!(is_in_viewport(&Rect::new(0.0, 0.0, 1280.0, 800.0), VIEW));
        assert!(!is_in_viewport(&Rect::new(0.0, -1.0, 100.0, 100.0), VIEW));
        assert!(!is_in_viewport(&Rect::new(0.0, 750.0, 100.0, 100.0), VIEW));
        assert!(!is_in_viewport(&Rect::new(1200.0, 0.0, 100.0, 100.0), VIEW));
    }

    #[test]
    fn partial_visibility_uses_lower_band() {
        // 85% of 800 is 680.
        assert!(is_partially_visible(&Rect::new(0.0, 680.0, 10.0, 500.0), VIEW));
        assert!(!is_partially_visible(&Rect::new(0.0, 681.0, 10.0, 500.0), VIEW));
        assert!(is_partially_visible(&Rect::new(0.0, -400.0, 10.0, 400.0), VIEW));
        assert!(!is_partially_visible(&Rect::new(0.0, -401.0, 10.0, 400.0), VIEW));
    }

    #[test]
    fn partial_and_strict_tests_disagree_on_tall_elements() {
        let tall = Rect::new(0.0, 100.0, 100.0, 2000.0);
        assert!(is_partially_visible(&tall, VIEW));
        assert!(!is_in_viewport(&tall, VIEW));
    }

    #[test]
    fn margin_extends_the_window() {
        let below = Rect::new(0.0, 950.0, 50.0, 20.0);
        assert!(!intersects_with_margin(&below, VIEW, 0.0));
        assert!(intersects_with_margin(&below, VIEW, 200.0));
    }

    #[test]
    fn offset_box_range_is_half_open() {
        let section = OffsetBox::new(500.0, 700.0);
        assert!(section.contains_y(500.0));
        assert!(section.contains_y(1199.0));
        assert!(!section.contains_y(1200.0));
    }
}
