#![forbid(unsafe_code)]

//! Small page behaviors: lazy image markers, in-page hash links, project link
//! logging, the load-time report and the console greeting.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::SiteConfig;
use crate::event::{Controller, Handled, PageEvent};
use crate::geometry::{Rect, Viewport, intersects_with_margin};
use crate::page::{ElementId, Page, ScrollBehavior};
use crate::reveal::{RevealAction, RevealOnVisible};
use crate::timer::TimerQueue;

// ---------------------------------------------------------------------------
// Lazy images
// ---------------------------------------------------------------------------

pub const LAZY_IMAGE_SELECTOR: &str = "img[loading=\"lazy\"]";
pub const LOADED_CLASS: &str = "loaded";

const LAZY_IMAGE_DEBOUNCE: Duration = Duration::from_millis(50);

/// Adds [`LOADED_CLASS`] to an image the first time any part of it enters
/// the window.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkLoaded;

impl RevealAction for MarkLoaded {
    type Task = ();
    const NAME: &'static str = "lazy-image";

    fn qualifies(&self, rect: &Rect, viewport: Viewport) -> bool {
        intersects_with_margin(rect, viewport, 0.0)
    }

    fn start<P: Page>(
        &mut self,
        el: ElementId,
        _now: Duration,
        page: &mut P,
        _timers: &mut TimerQueue<()>,
    ) {
        page.add_class(el, LOADED_CLASS);
    }

    fn fire<P: Page>(&mut self, _task: (), _page: &mut P) {}
}

pub type LazyImages = RevealOnVisible<MarkLoaded>;

pub fn lazy_images<P: Page>(now: Duration, page: &mut P) -> LazyImages {
    RevealOnVisible::bind(LAZY_IMAGE_SELECTOR, LAZY_IMAGE_DEBOUNCE, MarkLoaded, now, page)
}

// ---------------------------------------------------------------------------
// Hash links
// ---------------------------------------------------------------------------

/// Smooth scrolling for `a[href^="#"]` links outside the navigation menu.
///
/// A bare `#` is left to the browser. Any other hash link has its default
/// prevented, and scrolls to its target when the target exists.
#[derive(Debug, Clone)]
pub struct HashLinks {
    scroll_offset: f64,
}

impl HashLinks {
    #[must_use]
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            scroll_offset: config.scroll_offset,
        }
    }

    fn on_click<P: Page>(&self, target: ElementId, page: &mut P) -> Handled {
        let Some(anchor) = page.closest(target, "a[href]") else {
            return Handled::NONE;
        };
        let Some(href) = page.attribute(anchor, "href") else {
            return Handled::NONE;
        };
        let Some(id) = href.strip_prefix('#') else {
            return Handled::NONE;
        };
        if id.is_empty() {
            return Handled::NONE;
        }
        if let Some(section) = page.element_by_id(id) {
            let top = page.offset_box(section).top - self.scroll_offset;
            page.scroll_to(top, ScrollBehavior::Smooth);
        }
        Handled::PREVENT_DEFAULT | Handled::CONSUMED
    }
}

impl Controller for HashLinks {
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        _now: Duration,
        prior: Handled,
        page: &mut P,
    ) -> Handled {
        match *event {
            PageEvent::Click { target } if !prior.is_consumed() => self.on_click(target, page),
            _ => Handled::NONE,
        }
    }

    fn advance<P: Page>(&mut self, _now: Duration, _page: &mut P) {}

    fn next_deadline(&self) -> Option<Duration> {
        None
    }
}

// ---------------------------------------------------------------------------
// Project links
// ---------------------------------------------------------------------------

/// Logs which project a visitor opened.
#[derive(Debug, Default)]
pub struct ProjectLinks {
    links: Vec<ElementId>,
}

impl ProjectLinks {
    pub fn bind<P: Page>(page: &mut P) -> Self {
        let mut links = page.query_all(".project-link");
        for group in page.query_all(".project-links") {
            links.extend(page.query_within(group, "a"));
        }
        links.sort_unstable();
        links.dedup();
        Self { links }
    }

    #[must_use]
    pub fn links(&self) -> &[ElementId] {
        &self.links
    }

    /// The tracked link a click on `target` landed in. A `.project-link`
    /// may wrap an anchor, so the nearest of each is resolved independently.
    /// Tracked anchors are exactly the ones inside `.project-links`.
    fn resolve<P: Page>(&self, target: ElementId, page: &mut P) -> Option<ElementId> {
        [".project-link", "a"]
            .into_iter()
            .filter_map(|selector| page.closest(target, selector))
            .find(|link| self.links.binary_search(link).is_ok())
    }

    /// Title of the project card enclosing `link`.
    pub fn project_title<P: Page>(link: ElementId, page: &mut P) -> Option<String> {
        let card = page.closest(link, ".project-card")?;
        let title = page.query_first_within(card, ".project-title")?;
        Some(page.text(title))
    }
}

impl Controller for ProjectLinks {
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        _now: Duration,
        _prior: Handled,
        page: &mut P,
    ) -> Handled {
        if let PageEvent::Click { target } = *event
            && let Some(link) = self.resolve(target, page)
        {
            let title = Self::project_title(link, page);
            info!(project = title.as_deref().unwrap_or("unknown"), "project link clicked");
        }
        Handled::NONE
    }

    fn advance<P: Page>(&mut self, _now: Duration, _page: &mut P) {}

    fn next_deadline(&self) -> Option<Duration> {
        None
    }
}

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// Load time above which a warning is logged.
pub const SLOW_LOAD: Duration = Duration::from_millis(3000);

/// Reports how long the page took to load.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadReport {
    load_time: Option<Duration>,
}

impl LoadReport {
    #[must_use]
    pub const fn load_time(&self) -> Option<Duration> {
        self.load_time
    }
}

impl Controller for LoadReport {
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        _now: Duration,
        _prior: Handled,
        _page: &mut P,
    ) -> Handled {
        if let PageEvent::Load {
            elapsed: Some(elapsed),
        } = *event
        {
            self.load_time = Some(elapsed);
            let ms = elapsed.as_millis();
            info!(load_time_ms = ms as u64, "page loaded");
            if elapsed > SLOW_LOAD {
                warn!(
                    load_time_ms = ms as u64,
                    "page load time exceeds 3 seconds, consider optimizing assets"
                );
            }
        }
        Handled::NONE
    }

    fn advance<P: Page>(&mut self, _now: Duration, _page: &mut P) {}

    fn next_deadline(&self) -> Option<Duration> {
        None
    }
}

// ---------------------------------------------------------------------------
// Greeting
// ---------------------------------------------------------------------------

/// One `%c`-styled console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub text: String,
    pub css: &'static str,
}

const BANNER_CSS: &str = "background: linear-gradient(135deg, #2563eb, #8b5cf6);color: white;\
padding: 10px 20px;border-radius: 8px;font-weight: bold;font-size: 14px";
const ACCENT_CSS: &str = "color: #2563eb; font-size: 12px; font-weight: bold;";
const MUTED_CSS: &str = "color: #6b7280; font-size: 12px;";

/// The developer console greeting.
#[must_use]
pub fn greeting(config: &SiteConfig) -> Vec<ConsoleLine> {
    let line = |text: String, css| ConsoleLine { text, css };
    vec![
        line("\u{1f44b} Hi there, fellow developer!".to_owned(), BANNER_CSS),
        line("Liked what you see? Let's work together!".to_owned(), ACCENT_CSS),
        line(format!("\u{1f4e7} {}", config.contact_address), MUTED_CSS),
        line(format!("\u{1f517} {}", config.profile_url), MUTED_CSS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_names_contact_and_profile() {
        let config = SiteConfig::default();
        let lines = greeting(&config);
        assert_eq!(lines.len(), 4);
        assert!(lines[2].text.ends_with("hadi.hennawi2005@gmail.com"));
        assert!(lines[3].text.ends_with("https://github.com/hadi-hannawi1"));
        assert!(lines.iter().all(|l| !l.css.is_empty()));
    }
}
