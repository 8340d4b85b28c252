#![forbid(unsafe_code)]

//! Page capabilities consumed by the controllers.
//!
//! The controllers never hold DOM nodes. The host hands out [`ElementId`]
//! handles (indices into its element arena) and answers queries through three
//! traits:
//!
//! - [`Dom`]: element lookup and class/attribute/style/text mutation,
//! - [`LayoutQuery`]: scroll position, viewport size and element geometry,
//! - [`Browser`]: window-level actions (scrolling, navigation, events).
//!
//! Selectors passed to [`Dom::query_all`] and friends are plain CSS selectors.
//! Controllers only use compound selectors (`tag`, `#id`, `.class`, `[attr]`,
//! `[attr="value"]`) and comma-separated lists of them, so lightweight hosts
//! need not implement combinators.

use crate::geometry::{OffsetBox, Rect, Viewport};

/// Stable handle to an element, valid for the page lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u32);

impl ElementId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Element lookup and mutation.
pub trait Dom {
    /// `document.getElementById`.
    fn element_by_id(&mut self, id: &str) -> Option<ElementId>;

    /// `document.querySelectorAll`, in document order.
    fn query_all(&mut self, selector: &str) -> Vec<ElementId>;

    /// `root.querySelectorAll`, in document order.
    fn query_within(&mut self, root: ElementId, selector: &str) -> Vec<ElementId>;

    /// `el.closest(selector)`, including `el` itself.
    fn closest(&mut self, el: ElementId, selector: &str) -> Option<ElementId>;

    /// `document.body`.
    fn body(&mut self) -> Option<ElementId>;

    /// First match of `selector` inside `root`.
    fn query_first_within(&mut self, root: ElementId, selector: &str) -> Option<ElementId> {
        self.query_within(root, selector).into_iter().next()
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str);
    fn remove_attribute(&mut self, el: ElementId, name: &str);

    fn has_attribute(&self, el: ElementId, name: &str) -> bool {
        self.attribute(el, name).is_some()
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool;
    fn add_class(&mut self, el: ElementId, class: &str);
    fn remove_class(&mut self, el: ElementId, class: &str);

    /// Flip `class`; returns whether it is now present.
    fn toggle_class(&mut self, el: ElementId, class: &str) -> bool {
        if self.has_class(el, class) {
            self.remove_class(el, class);
            false
        } else {
            self.add_class(el, class);
            true
        }
    }

    /// Replace the whole `class` attribute.
    fn set_class_name(&mut self, el: ElementId, value: &str);

    fn text(&self, el: ElementId) -> String;
    fn set_text(&mut self, el: ElementId, text: &str);

    /// Inline style property value (empty when unset).
    fn style(&self, el: ElementId, property: &str) -> String;
    fn set_style(&mut self, el: ElementId, property: &str, value: &str);

    /// Live value of an `<input>` or `<textarea>`.
    fn field_value(&self, el: ElementId) -> String;

    fn set_disabled(&mut self, el: ElementId, disabled: bool);

    /// `form.reset()`.
    fn reset_form(&mut self, form: ElementId);
}

/// Read-only layout geometry.
pub trait LayoutQuery {
    /// `window.scrollY`.
    fn scroll_y(&self) -> f64;

    /// `innerWidth` / `innerHeight`.
    fn viewport(&self) -> Viewport;

    /// `el.getBoundingClientRect()`.
    fn bounding_rect(&self, el: ElementId) -> Rect;

    /// `el.offsetTop` / `el.offsetHeight`.
    fn offset_box(&self, el: ElementId) -> OffsetBox;
}

/// Scroll animation style for [`Browser::scroll_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// Window-level actions.
pub trait Browser {
    /// `window.scrollTo({ top, behavior })`.
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);

    /// `window.location.href = uri`.
    fn navigate(&mut self, uri: &str);

    /// Dispatch a payload-free custom event on the window.
    fn dispatch_custom_event(&mut self, name: &str);

    /// Append a `<style>` element with `css` to the document head.
    fn inject_stylesheet(&mut self, css: &str);

    /// `matchMedia('(prefers-reduced-motion: reduce)').matches`.
    fn prefers_reduced_motion(&self) -> bool;

    /// `location.hostname`.
    fn hostname(&self) -> String;
}

/// Everything a controller may touch.
pub trait Page: Dom + LayoutQuery + Browser {}

impl<T: Dom + LayoutQuery + Browser + ?Sized> Page for T {}
