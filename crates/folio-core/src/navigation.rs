#![forbid(unsafe_code)]

//! Sticky header, active-link highlighting, mobile menu and in-page scrolling.
//!
//! # Invariants
//!
//! 1. The header carries `scrolled` iff the last debounced scroll saw
//!    `scroll_y > 50`.
//! 2. When several sections contain the probe point, the last one in document
//!    order wins. When none does, link state is left as it was.
//! 3. Every operation is a no-op for elements missing from the page.

use std::time::Duration;

use tracing::debug;

use crate::config::SiteConfig;
use crate::debounce::Debounce;
use crate::event::{Controller, Handled, PageEvent};
use crate::geometry::OffsetBox;
use crate::page::{ElementId, Page, ScrollBehavior};

/// Scroll distance past which the header switches to its compact look.
pub const SCROLLED_THRESHOLD: f64 = 50.0;

/// Extra look-ahead added to the probe point on top of the scroll offset.
pub const ACTIVE_LOOKAHEAD: f64 = 100.0;

const SCROLL_DEBOUNCE: Duration = Duration::from_millis(10);

const ACTIVE: &str = "active";
const SCROLLED: &str = "scrolled";

/// Index of the section containing `probe`, last match in document order.
#[must_use]
pub fn current_section(sections: &[OffsetBox], probe: f64) -> Option<usize> {
    sections.iter().rposition(|section| section.contains_y(probe))
}

/// Document y used to pick the active section for a given scroll position.
#[must_use]
pub fn probe_point(scroll_y: f64, scroll_offset: f64) -> f64 {
    scroll_y + scroll_offset + ACTIVE_LOOKAHEAD
}

/// Navigation chrome controller.
#[derive(Debug)]
pub struct Navigation {
    navbar: Option<ElementId>,
    menu: Option<ElementId>,
    toggle: Option<ElementId>,
    links: Vec<ElementId>,
    scroll_offset: f64,
    scroll: Debounce<()>,
}

impl Navigation {
    /// Look up the navigation elements.
    pub fn bind<P: Page>(config: &SiteConfig, page: &mut P) -> Self {
        Self {
            navbar: page.element_by_id("navbar"),
            menu: page.element_by_id("navMenu"),
            toggle: page.element_by_id("mobileMenuBtn"),
            links: page.query_all(".nav-link"),
            scroll_offset: config.scroll_offset,
            scroll: Debounce::new(SCROLL_DEBOUNCE),
        }
    }

    /// Apply the scroll-dependent header state and active link.
    pub fn on_scroll<P: Page>(&mut self, page: &mut P) {
        let scroll_y = page.scroll_y();
        if let Some(navbar) = self.navbar {
            if scroll_y > SCROLLED_THRESHOLD {
                page.add_class(navbar, SCROLLED);
            } else {
                page.remove_class(navbar, SCROLLED);
            }
        }
        self.update_active_link(page);
    }

    /// Highlight the link of the section under the probe point.
    pub fn update_active_link<P: Page>(&mut self, page: &mut P) {
        let sections = page.query_all("section[id]");
        let boxes: Vec<OffsetBox> = sections.iter().map(|&s| page.offset_box(s)).collect();
        let probe = probe_point(page.scroll_y(), self.scroll_offset);
        let Some(index) = current_section(&boxes, probe) else {
            return;
        };
        let Some(id) = page.attribute(sections[index], "id") else {
            return;
        };
        let href = format!("#{id}");
        for &link in &self.links {
            if page.attribute(link, "href").as_deref() == Some(href.as_str()) {
                page.add_class(link, ACTIVE);
            } else {
                page.remove_class(link, ACTIVE);
            }
        }
        debug!(section = %id, probe, "active section");
    }

    pub fn toggle_mobile_menu<P: Page>(&mut self, page: &mut P) {
        for el in [self.menu, self.toggle].into_iter().flatten() {
            page.toggle_class(el, ACTIVE);
        }
    }

    pub fn close_mobile_menu<P: Page>(&mut self, page: &mut P) {
        for el in [self.menu, self.toggle].into_iter().flatten() {
            page.remove_class(el, ACTIVE);
        }
    }

    /// Whether the mobile menu is currently expanded.
    pub fn is_menu_open<P: Page>(&self, page: &P) -> bool {
        self.menu.is_some_and(|menu| page.has_class(menu, ACTIVE))
    }

    fn on_link_click<P: Page>(&mut self, link: ElementId, page: &mut P) {
        if let Some(href) = page.attribute(link, "href") {
            let target = href
                .strip_prefix('#')
                .filter(|id| !id.is_empty())
                .and_then(|id| page.element_by_id(id));
            if let Some(target) = target {
                let top = page.offset_box(target).top - self.scroll_offset;
                page.scroll_to(top, ScrollBehavior::Smooth);
            }
        }
        self.close_mobile_menu(page);
    }

    fn on_click<P: Page>(&mut self, target: ElementId, page: &mut P) -> Handled {
        let mut handled = Handled::NONE;
        if let Some(toggle) = self.toggle
            && page.closest(target, "#mobileMenuBtn") == Some(toggle)
        {
            self.toggle_mobile_menu(page);
        }
        if let Some(link) = page.closest(target, ".nav-link")
            && self.links.contains(&link)
        {
            self.on_link_click(link, page);
            handled |= Handled::PREVENT_DEFAULT | Handled::CONSUMED;
        }
        if page.closest(target, ".nav-wrapper").is_none() {
            self.close_mobile_menu(page);
        }
        handled
    }
}

impl Controller for Navigation {
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        now: Duration,
        _prior: Handled,
        page: &mut P,
    ) -> Handled {
        match *event {
            PageEvent::Scroll => {
                self.scroll.call(now, ());
                Handled::NONE
            }
            PageEvent::Click { target } => self.on_click(target, page),
            _ => Handled::NONE,
        }
    }

    fn advance<P: Page>(&mut self, now: Duration, page: &mut P) {
        if self.scroll.poll(now).is_some() {
            self.on_scroll(page);
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.scroll.deadline()
    }
}
