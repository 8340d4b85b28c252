#![forbid(unsafe_code)]

//! The page traits over the live browser DOM.
//!
//! Elements are interned into an arena on first sight; a JS `Map` keyed by
//! node identity maps them back to their [`ElementId`], so the same node
//! always yields the same handle.

use js_sys::Map;
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CustomEvent, Document, Element, HtmlButtonElement, HtmlElement, HtmlFormElement,
    HtmlInputElement, HtmlTextAreaElement, NodeList, ScrollToOptions, Window,
};

use folio_core::geometry::{OffsetBox, Rect, Viewport};
use folio_core::page::{Browser, Dom, ElementId, LayoutQuery, ScrollBehavior};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

pub struct WebPage {
    window: Window,
    document: Document,
    elements: Vec<Element>,
    index: Map,
}

impl WebPage {
    pub fn new(window: Window) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self {
            window,
            document,
            elements: Vec::new(),
            index: Map::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Handle for `el`, allocating one on first sight.
    pub fn intern(&mut self, el: Element) -> ElementId {
        if let Some(index) = self.index.get(&el).as_f64() {
            return ElementId(index as u32);
        }
        let id = ElementId(self.elements.len() as u32);
        self.index.set(&el, &JsValue::from_f64(f64::from(id.0)));
        self.elements.push(el);
        id
    }

    /// Handle for an event target, when it is an element.
    pub fn intern_target(&mut self, target: Option<web_sys::EventTarget>) -> Option<ElementId> {
        target
            .and_then(|t| t.dyn_into::<Element>().ok())
            .map(|el| self.intern(el))
    }

    fn el(&self, id: ElementId) -> &Element {
        &self.elements[id.index()]
    }

    fn html(&self, id: ElementId) -> Option<&HtmlElement> {
        self.el(id).dyn_ref::<HtmlElement>()
    }

    fn collect(&mut self, list: Result<NodeList, JsValue>, selector: &str) -> Vec<ElementId> {
        let list = match list {
            Ok(list) => list,
            Err(err) => {
                warn!(selector, error = ?err, "selector rejected");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|el| self.intern(el))
            .collect()
    }
}

fn log_err(what: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        warn!(error = ?err, "{what} failed");
    }
}

impl Dom for WebPage {
    fn element_by_id(&mut self, id: &str) -> Option<ElementId> {
        let el = self.document.get_element_by_id(id)?;
        Some(self.intern(el))
    }

    fn query_all(&mut self, selector: &str) -> Vec<ElementId> {
        let list = self.document.query_selector_all(selector);
        self.collect(list, selector)
    }

    fn query_within(&mut self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let list = self.el(root).query_selector_all(selector);
        self.collect(list, selector)
    }

    fn closest(&mut self, el: ElementId, selector: &str) -> Option<ElementId> {
        let found = self.el(el).closest(selector).ok().flatten()?;
        Some(self.intern(found))
    }

    fn body(&mut self) -> Option<ElementId> {
        let body: Element = self.document.body()?.into();
        Some(self.intern(body))
    }

    fn query_first_within(&mut self, root: ElementId, selector: &str) -> Option<ElementId> {
        let found = self.el(root).query_selector(selector).ok().flatten()?;
        Some(self.intern(found))
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.el(el).get_attribute(name)
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        log_err("setAttribute", self.el(el).set_attribute(name, value));
    }

    fn remove_attribute(&mut self, el: ElementId, name: &str) {
        log_err("removeAttribute", self.el(el).remove_attribute(name));
    }

    fn has_attribute(&self, el: ElementId, name: &str) -> bool {
        self.el(el).has_attribute(name)
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.el(el).class_list().contains(class)
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        log_err("classList.add", self.el(el).class_list().add_1(class));
    }

    fn remove_class(&mut self, el: ElementId, class: &str) {
        log_err("classList.remove", self.el(el).class_list().remove_1(class));
    }

    fn set_class_name(&mut self, el: ElementId, value: &str) {
        self.el(el).set_class_name(value);
    }

    fn text(&self, el: ElementId) -> String {
        self.el(el).text_content().unwrap_or_default()
    }

    fn set_text(&mut self, el: ElementId, text: &str) {
        self.el(el).set_text_content(Some(text));
    }

    fn style(&self, el: ElementId, property: &str) -> String {
        self.html(el)
            .and_then(|h| h.style().get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        if let Some(h) = self.html(el) {
            log_err("style.setProperty", h.style().set_property(property, value));
        }
    }

    fn field_value(&self, el: ElementId) -> String {
        let el = self.el(el);
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn set_disabled(&mut self, el: ElementId, disabled: bool) {
        let el = self.el(el);
        if let Some(button) = el.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if disabled {
            log_err("setAttribute", el.set_attribute("disabled", ""));
        } else {
            log_err("removeAttribute", el.remove_attribute("disabled"));
        }
    }

    fn reset_form(&mut self, form: ElementId) {
        if let Some(form) = self.el(form).dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }
}

impl LayoutQuery for WebPage {
    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport(&self) -> Viewport {
        let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(dim(self.window.inner_width()), dim(self.window.inner_height()))
    }

    fn bounding_rect(&self, el: ElementId) -> Rect {
        let r = self.el(el).get_bounding_client_rect();
        Rect::new(r.left(), r.top(), r.width(), r.height())
    }

    fn offset_box(&self, el: ElementId) -> OffsetBox {
        self.html(el)
            .map(|h| OffsetBox::new(f64::from(h.offset_top()), f64::from(h.offset_height())))
            .unwrap_or_default()
    }
}

impl Browser for WebPage {
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn navigate(&mut self, uri: &str) {
        log_err("location.href", self.window.location().set_href(uri));
    }

    fn dispatch_custom_event(&mut self, name: &str) {
        let dispatched = CustomEvent::new(name)
            .and_then(|event| self.window.dispatch_event(&event))
            .map(|_| ());
        log_err("dispatchEvent", dispatched);
    }

    fn inject_stylesheet(&mut self, css: &str) {
        let appended = self.document.create_element("style").and_then(|style| {
            style.set_text_content(Some(css));
            match self.document.head() {
                Some(head) => head.append_child(&style).map(|_| ()),
                None => Err(JsValue::from_str("document has no head")),
            }
        });
        log_err("inject stylesheet", appended);
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.window
            .match_media(REDUCED_MOTION_QUERY)
            .ok()
            .flatten()
            .is_some_and(|query| query.matches())
    }

    fn hostname(&self) -> String {
        self.window.location().hostname().unwrap_or_default()
    }
}
