#![forbid(unsafe_code)]

//! "Back to top" button.

use std::time::Duration;

use crate::event::{Controller, Handled, PageEvent};
use crate::debounce::Debounce;
use crate::page::{ElementId, Page, ScrollBehavior};

/// Scroll distance past which the button is shown.
pub const VISIBLE_THRESHOLD: f64 = 300.0;

const SCROLL_DEBOUNCE: Duration = Duration::from_millis(100);

/// Shows `#scrollTopBtn` once the page is scrolled down and scrolls back up on click.
#[derive(Debug)]
pub struct ScrollToTop {
    button: Option<ElementId>,
    scroll: Debounce<()>,
}

impl ScrollToTop {
    pub fn bind<P: Page>(page: &mut P) -> Self {
        Self {
            button: page.element_by_id("scrollTopBtn"),
            scroll: Debounce::new(SCROLL_DEBOUNCE),
        }
    }

    fn on_scroll<P: Page>(&self, page: &mut P) {
        let Some(button) = self.button else {
            return;
        };
        if page.scroll_y() > VISIBLE_THRESHOLD {
            page.add_class(button, "visible");
        } else {
            page.remove_class(button, "visible");
        }
    }
}

impl Controller for ScrollToTop {
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        now: Duration,
        _prior: Handled,
        page: &mut P,
    ) -> Handled {
        match *event {
            PageEvent::Scroll => self.scroll.call(now, ()),
            PageEvent::Click { target } => {
                if let Some(button) = self.button
                    && page.closest(target, "#scrollTopBtn") == Some(button)
                {
                    page.scroll_to(0.0, ScrollBehavior::Smooth);
                }
            }
            _ => {}
        }
        Handled::NONE
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
