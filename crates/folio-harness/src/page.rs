#![forbid(unsafe_code)]

//! An in-memory document implementing the Folio page traits.

use std::collections::BTreeMap;

use folio_core::geometry::{OffsetBox, Rect, Viewport};
use folio_core::page::{Browser, Dom, ElementId, LayoutQuery, ScrollBehavior};

use crate::selector::{Matchable, SelectorList};

/// Default window size used by [`FakePage::new`].
pub const DEFAULT_VIEWPORT: Viewport = Viewport::new(1280.0, 800.0);

/// One element of the fake document.
///
/// `rect` is in document coordinates; the page derives client rectangles
/// from it and the current scroll position.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    pub text: String,
    pub value: String,
    pub disabled: bool,
    pub rect: Rect,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl FakeElement {
    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    #[must_use]
    pub fn class_name(&self) -> String {
        self.classes.join(" ")
    }
}

impl Matchable for FakeElement {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Element builder for [`FakePage::append`].
#[derive(Debug, Clone)]
pub struct El(FakeElement);

impl El {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self(FakeElement {
            tag: tag.to_ascii_lowercase(),
            ..FakeElement::default()
        })
    }

    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.0
            .classes
            .extend(class.split_whitespace().map(str::to_owned));
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.0.attrs.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.0.style.insert(property.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.0.text = text.to_owned();
        self
    }

    #[must_use]
    pub fn value(mut self, value: &str) -> Self {
        self.0.value = value.to_owned();
        self
    }

    /// Place the element at document y `top`, spanning the window width.
    #[must_use]
    pub fn at(mut self, top: f64, height: f64) -> Self {
        self.0.rect = Rect::new(0.0, top, DEFAULT_VIEWPORT.width, height);
        self
    }

    #[must_use]
    pub fn rect(mut self, rect: Rect) -> Self {
        self.0.rect = rect;
        self
    }
}

/// Fake document plus window.
///
/// Every window-level side effect is recorded for inspection.
#[derive(Debug, Clone)]
pub struct FakePage {
    elements: Vec<FakeElement>,
    body: ElementId,
    scroll_y: f64,
    viewport: Viewport,
    reduced_motion: bool,
    hostname: String,
    pub scrolls: Vec<(f64, ScrollBehavior)>,
    pub navigations: Vec<String>,
    pub custom_events: Vec<String>,
    pub stylesheets: Vec<String>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT)
    }
}

impl FakePage {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            elements: vec![El::new("body").0],
            body: ElementId(0),
            scroll_y: 0.0,
            viewport,
            reduced_motion: false,
            hostname: "example.com".to_owned(),
            scrolls: Vec::new(),
            navigations: Vec::new(),
            custom_events: Vec::new(),
            stylesheets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_reduced_motion(mut self, on: bool) -> Self {
        self.reduced_motion = on;
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: &str) -> Self {
        hostname.clone_into(&mut self.hostname);
        self
    }

    #[must_use]
    pub const fn body_id(&self) -> ElementId {
        self.body
    }

    /// Append `el` as the last child of `parent`.
    pub fn append(&mut self, parent: ElementId, el: El) -> ElementId {
        let id = ElementId(u32::try_from(self.elements.len()).unwrap_or(u32::MAX));
        let mut element = el.0;
        element.parent = Some(parent);
        self.elements.push(element);
        self.elements[parent.index()].children.push(id);
        id
    }

    /// Append `el` to `body`.
    pub fn add(&mut self, el: El) -> ElementId {
        self.append(self.body, el)
    }

    #[must_use]
    pub fn element(&self, el: ElementId) -> &FakeElement {
        &self.elements[el.index()]
    }

    pub fn element_mut(&mut self, el: ElementId) -> &mut FakeElement {
        &mut self.elements[el.index()]
    }

    /// Element whose `id` attribute is `id`.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<ElementId> {
        self.preorder(self.body)
            .into_iter()
            .find(|&el| self.element(el).attr("id") == Some(id))
    }

    pub fn set_scroll_y(&mut self, y: f64) {
        self.scroll_y = y;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Simulate typing into a field.
    pub fn set_value(&mut self, el: ElementId, value: &str) {
        value.clone_into(&mut self.elements[el.index()].value);
    }

    #[must_use]
    pub fn is_disabled(&self, el: ElementId) -> bool {
        self.element(el).disabled
    }

    /// `root` and its descendants in document order.
    fn preorder(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(self.elements[el.index()].children.iter().rev());
        }
        out
    }

    fn select(&self, root: ElementId, selector: &str, include_root: bool) -> Vec<ElementId> {
        let list = match SelectorList::parse(selector) {
            Ok(list) => list,
            Err(err) => panic!("{err}"),
        };
        self.preorder(root)
            .into_iter()
            .skip(usize::from(!include_root))
            .filter(|&el| list.matches(self.element(el)))
            .collect()
    }
}

impl Dom for FakePage {
    fn element_by_id(&mut self, id: &str) -> Option<ElementId> {
        self.find(id)
    }

    fn query_all(&mut self, selector: &str) -> Vec<ElementId> {
        self.select(self.body, selector, true)
    }

    fn query_within(&mut self, root: ElementId, selector: &str) -> Vec<ElementId> {
        self.select(root, selector, false)
    }

    fn closest(&mut self, el: ElementId, selector: &str) -> Option<ElementId> {
        let list = match SelectorList::parse(selector) {
            Ok(list) => list,
            Err(err) => panic!("{err}"),
        };
        let mut cursor = Some(el);
        while let Some(current) = cursor {
            let element = self.element(current);
            if list.matches(element) {
                return Some(current);
            }
            cursor = element.parent;
        }
        None
    }

    fn body(&mut self) -> Option<ElementId> {
        Some(self.body)
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        let element = self.element(el);
        if name == "class" {
            return (!element.classes.is_empty()).then(|| element.class_name());
        }
        element.attrs.get(name).cloned()
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if name == "class" {
            self.set_class_name(el, value);
            return;
        }
        self.element_mut(el)
            .attrs
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&mut self, el: ElementId, name: &str) {
        if name == "class" {
            self.element_mut(el).classes.clear();
            return;
        }
        self.element_mut(el).attrs.remove(name);
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        Matchable::has_class(self.element(el), class)
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if !Matchable::has_class(self.element(el), class) {
            self.element_mut(el).classes.push(class.to_owned());
        }
    }

    fn remove_class(&mut self, el: ElementId, class: &str) {
        self.element_mut(el).classes.retain(|c| c != class);
    }

    fn set_class_name(&mut self, el: ElementId, value: &str) {
        self.element_mut(el).classes = value.split_whitespace().map(str::to_owned).collect();
    }

    fn text(&self, el: ElementId) -> String {
        self.element(el).text.clone()
    }

    fn set_text(&mut self, el: ElementId, text: &str) {
        text.clone_into(&mut self.element_mut(el).text);
    }

    fn style(&self, el: ElementId, property: &str) -> String {
        self.element(el)
            .style
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        let style = &mut self.element_mut(el).style;
        if value.is_empty() {
            style.remove(property);
        } else {
            style.insert(property.to_owned(), value.to_owned());
        }
    }

    fn field_value(&self, el: ElementId) -> String {
        self.element(el).value.clone()
    }

    fn set_disabled(&mut self, el: ElementId, disabled: bool) {
        self.element_mut(el).disabled = disabled;
    }

    fn reset_form(&mut self, form: ElementId) {
        for el in self.select(form, "input, textarea", false) {
            self.element_mut(el).value.clear();
        }
    }
}

impl LayoutQuery for FakePage {
    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn bounding_rect(&self, el: ElementId) -> Rect {
        self.element(el).rect.translate_y(-self.scroll_y)
    }

    fn offset_box(&self, el: ElementId) -> OffsetBox {
        let rect = self.element(el).rect;
        OffsetBox::new(rect.top, rect.height)
    }
}

impl Browser for FakePage {
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        self.scrolls.push((top, behavior));
        self.scroll_y = top.max(0.0);
    }

    fn navigate(&mut self, uri: &str) {
        self.navigations.push(uri.to_owned());
    }

    fn dispatch_custom_event(&mut self, name: &str) {
        self.custom_events.push(name.to_owned());
    }

    fn inject_stylesheet(&mut self, css: &str) {
        self.stylesheets.push(css.to_owned());
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (FakePage, ElementId, ElementId) {
        let mut page = FakePage::default();
        let card = page.add(El::new("div").class("project-card").at(1000.0, 300.0));
        let title = page.append(card, El::new("h3").class("project-title").text("Rope"));
        let links = page.append(card, El::new("div").class("project-links"));
        let link = page.append(links, El::new("a").attr("href", "https://x.test"));
        (page, title, link)
    }

    #[test]
    fn queries_follow_document_order() {
        let (mut page, title, link) = sample();
        let found = page.query_all(".project-title, a[href]");
        assert_eq!(found, vec![title, link]);
    }

    #[test]
    fn query_within_excludes_root() {
        let (mut page, _, _) = sample();
        let card = page.query_all(".project-card")[0];
        assert!(page.query_within(card, ".project-card").is_empty());
        assert_eq!(page.query_within(card, "a").len(), 1);
    }

    #[test]
    fn closest_walks_ancestors() {
        let (mut page, _, link) = sample();
        let card = page.closest(link, ".project-card").unwrap();
        assert!(page.has_class(card, "project-card"));
        assert_eq!(page.closest(link, "a"), Some(link));
        assert_eq!(page.closest(link, "#missing"), None);
    }

    #[test]
    fn client_rect_tracks_scroll() {
        let (mut page, title, _) = sample();
        let card = page.query_all(".project-card")[0];
        page.set_scroll_y(400.0);
        assert_eq!(page.bounding_rect(card).top, 600.0);
        assert_eq!(page.offset_box(card), OffsetBox::new(1000.0, 300.0));
        assert_eq!(page.bounding_rect(title).top, -400.0);
    }

    #[test]
    fn class_attribute_round_trips() {
        let (mut page, title, _) = sample();
        page.set_class_name(title, "form-status success");
        assert_eq!(page.attribute(title, "class").as_deref(), Some("form-status success"));
        assert!(page.toggle_class(title, "hidden"));
        assert!(!page.toggle_class(title, "hidden"));
    }
}
