#![forbid(unsafe_code)]

//! Canonical page events pushed by the host.

use std::time::Duration;

use bitflags::bitflags;

use crate::page::{ElementId, Page};

/// A browser event, reduced to what the controllers need.
///
/// Click, input, blur and submit carry the event target; the host delegates
/// listeners at document level, so the target may be a descendant of the
/// element a controller cares about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageEvent {
    /// Window scrolled. Geometry is read back through the page.
    Scroll,
    /// Click anywhere in the document.
    Click { target: ElementId },
    /// Keystroke-level edit of a form field.
    Input { target: ElementId },
    /// A form field lost focus.
    Blur { target: ElementId },
    /// A form is about to be submitted.
    Submit { form: ElementId },
    /// Window resized.
    Resize,
    /// Document visibility changed.
    Visibility { hidden: bool },
    /// Window `load` fired; `elapsed` is the time since navigation start.
    Load { elapsed: Option<Duration> },
    /// Page is being left.
    Unload,
    /// An animation frame is being rendered.
    Frame,
    /// The browser reported an idle period.
    Idle,
}

bitflags! {
    /// What the host must do after a dispatch.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Handled: u8 {
        /// Call `preventDefault()` on the originating event.
        const PREVENT_DEFAULT = 0b0001;
        /// A controller fully handled the event; later generic handlers skip it.
        const CONSUMED = 0b0010;
    }
}

impl Handled {
    /// Nothing for the host to do.
    pub const NONE: Self = Self::empty();

    #[must_use]
    pub const fn prevents_default(self) -> bool {
        self.contains(Self::PREVENT_DEFAULT)
    }

    #[must_use]
    pub const fn is_consumed(self) -> bool {
        self.contains(Self::CONSUMED)
    }
}

/// A page controller driven by host events.
///
/// The bootstrap calls every controller for every event, in registration
/// order, passing the flags accumulated so far in `prior`.
pub trait Controller {
    /// React to one event.
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        now: Duration,
        prior: Handled,
        page: &mut P,
    ) -> Handled;

    /// Fire debounces and timers due at `now`.
    fn advance<P: Page>(&mut self, now: Duration, page: &mut P);

    /// Earliest instant at which [`advance`](Self::advance) has work.
    fn next_deadline(&self) -> Option<Duration>;

    /// Whether the controller needs [`PageEvent::Frame`] events.
    fn wants_frame(&self) -> bool {
        false
    }
}
