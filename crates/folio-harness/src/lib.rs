#![forbid(unsafe_code)]

//! Deterministic test bed for Folio.
//!
//! - [`FakePage`]: an in-memory document implementing the page traits, with
//!   every window-level side effect recorded.
//! - [`Site`]: an [`App`] booted on a [`FakePage`] plus a virtual clock. Time
//!   only moves when a test says so, and every debounce or timer that falls
//!   inside a step fires at its own deadline.
//! - [`capture_logs`]: collects `tracing` events for assertions.
//! - [`fixtures`]: a representative portfolio document.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use folio_harness::{El, FakePage, Site};
//!
//! let mut page = FakePage::default();
//! page.add(El::new("button").id("scrollTopBtn"));
//! let mut site = Site::boot(page).unwrap();
//! site.scroll(500.0);
//! site.advance_by(Duration::from_millis(100));
//! let button = site.page.find("scrollTopBtn").unwrap();
//! assert!(site.page.element(button).classes.contains(&"visible".to_string()));
//! ```

pub mod fixtures;
pub mod logs;
pub mod page;
pub mod selector;

use std::time::Duration;

use folio_core::event::{Handled, PageEvent};
use folio_core::page::ElementId;
use folio_core::{App, BootError, SiteConfig};

pub use fixtures::{FormOmissions, FormParts, portfolio, portfolio_with};
pub use logs::{CapturedEvent, LogCapture, capture_logs, init_test_logging};
pub use page::{DEFAULT_VIEWPORT, El, FakeElement, FakePage};

/// Interval between synthetic animation frames.
pub const FRAME: Duration = Duration::from_millis(16);

/// Upper bound on deadline steps inside one [`Site::advance_by`].
const MAX_STEPS: usize = 100_000;

/// An [`App`] running on a [`FakePage`] under a virtual clock.
#[derive(Debug)]
pub struct Site {
    pub app: App,
    pub page: FakePage,
    now: Duration,
}

impl Site {
    /// Boot with the default configuration at t = 0.
    pub fn boot(page: FakePage) -> Result<Self, BootError> {
        Self::boot_with(SiteConfig::default(), page)
    }

    pub fn boot_with(config: SiteConfig, mut page: FakePage) -> Result<Self, BootError> {
        let app = App::boot(config, &mut page, Duration::ZERO)?;
        Ok(Self {
            app,
            page,
            now: Duration::ZERO,
        })
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    pub fn dispatch(&mut self, event: PageEvent) -> Handled {
        self.app.dispatch(&event, &mut self.page, self.now)
    }

    /// Move the clock forward, firing every deadline on the way.
    pub fn advance_by(&mut self, dt: Duration) {
        let target = self.now + dt;
        let mut steps = 0;
        while let Some(deadline) = self.app.next_deadline()
            && deadline <= target
        {
            steps += 1;
            assert!(steps < MAX_STEPS, "deadline at {deadline:?} never cleared");
            self.now = self.now.max(deadline);
            self.app.advance(self.now, &mut self.page);
        }
        self.now = target;
        self.app.advance(self.now, &mut self.page);
    }

    /// Set the scroll position and deliver a scroll event.
    pub fn scroll(&mut self, y: f64) -> Handled {
        self.page.set_scroll_y(y);
        self.dispatch(PageEvent::Scroll)
    }

    pub fn click(&mut self, target: ElementId) -> Handled {
        self.dispatch(PageEvent::Click { target })
    }

    pub fn type_into(&mut self, field: ElementId, value: &str) -> Handled {
        self.page.set_value(field, value);
        self.dispatch(PageEvent::Input { target: field })
    }

    pub fn blur(&mut self, field: ElementId) -> Handled {
        self.dispatch(PageEvent::Blur { target: field })
    }

    pub fn submit(&mut self, form: ElementId) -> Handled {
        self.dispatch(PageEvent::Submit { form })
    }

    pub fn idle(&mut self) -> Handled {
        self.dispatch(PageEvent::Idle)
    }

    /// Render one frame: advance by [`FRAME`], run batched callbacks, then
    /// deliver [`PageEvent::Frame`].
    pub fn frame(&mut self) {
        self.advance_by(FRAME);
        self.app.take_frame_batch().run();
        self.dispatch(PageEvent::Frame);
    }

    /// Render frames while the app asks for them, at most `limit`.
    ///
    /// Returns how many frames were rendered.
    pub fn run_frames(&mut self, limit: usize) -> usize {
        let mut rendered = 0;
        while rendered < limit && self.app.wants_frame() {
            self.frame();
            rendered += 1;
        }
        rendered
    }
}
