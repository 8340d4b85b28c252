#![forbid(unsafe_code)]

//! Page-wide performance tweaks.
//!
//! [`PerfLayer`] bundles the small behaviors that are not tied to a single
//! widget:
//!
//! - reduced-motion handling, applied once before any animator binds,
//! - temporary GPU compositing hints on heavy elements,
//! - image attribute normalization and link prefetching on the first idle tick,
//! - the `scrolling` and `page-hidden` body classes,
//! - a debounced `optimizedResize` window event,
//! - read/write frame batching and the frame-rate gate behind the host hooks,
//! - frame rate sampling on development hosts.

pub mod fps;
pub mod frame_batch;
pub mod prefetch;

use std::time::Duration;

use bitflags::bitflags;
use tracing::{debug, info, warn};

use crate::debounce::Debounce;
use crate::event::{Controller, Handled, PageEvent};
use crate::page::{ElementId, Page};
use crate::reveal::REVEALED_CLASS;
use crate::timer::{TimerQueue, earliest};

pub use fps::FpsSampler;
pub use frame_batch::{FrameBatch, FrameCallback, FrameGate, ReadyBatch};
pub use prefetch::Prefetcher;

/// Quiet period after the last scroll before `scrolling` is removed.
pub const SCROLL_SETTLE: Duration = Duration::from_millis(150);

/// Quiet period after the last resize before `optimizedResize` fires.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

/// How long GPU hints stay in place after boot.
pub const GPU_HINT_LIFETIME: Duration = Duration::from_millis(3000);

/// Custom window event dispatched after a resize settles.
pub const RESIZE_EVENT: &str = "optimizedResize";

/// Elements that receive compositing hints at boot.
pub const GPU_HINT_SELECTOR: &str = ".project-card, .hero-section, .nav-container, [data-aos]";

/// Stylesheet injected when the user prefers reduced motion.
pub const REDUCED_MOTION_CSS: &str = "*, *::before, *::after { \
animation-duration: 0.01ms !important; \
transition-duration: 0.01ms !important; }";

pub const SCROLLING_CLASS: &str = "scrolling";
pub const HIDDEN_CLASS: &str = "page-hidden";

bitflags! {
    /// Body-level state mirrored into classes.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct PerfState: u8 {
        const SCROLLING = 0b001;
        const HIDDEN = 0b010;
        const REDUCED_MOTION = 0b100;
    }
}

/// Deferred work for the first idle period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdleTask {
    NormalizeImages,
    WatchLinks,
}

#[derive(Debug)]
enum PerfTask {
    ExpireGpuHints,
}

/// Make every `[data-aos]` element final and collapse CSS animation time.
///
/// Returns the number of elements affected.
pub fn apply_reduced_motion<P: Page>(page: &mut P) -> usize {
    let targets = page.query_all("[data-aos]");
    for &el in &targets {
        page.remove_attribute(el, "data-aos");
        page.add_class(el, REVEALED_CLASS);
    }
    page.inject_stylesheet(REDUCED_MOTION_CSS);
    targets.len()
}

/// Add compositing hints to [`GPU_HINT_SELECTOR`] matches.
pub fn apply_gpu_hints<P: Page>(page: &mut P) -> Vec<ElementId> {
    let targets = page.query_all(GPU_HINT_SELECTOR);
    for &el in &targets {
        page.set_style(el, "will-change", "transform, opacity");
        page.set_style(el, "transform", "translateZ(0)");
        page.set_style(el, "backface-visibility", "hidden");
    }
    targets
}

/// Give every `img` lazy loading and async decoding unless it already
/// declares them. Returns how many images were touched.
pub fn normalize_images<P: Page>(page: &mut P) -> usize {
    let mut touched = 0;
    for img in page.query_all("img") {
        let mut changed = false;
        if !page.has_attribute(img, "loading") {
            page.set_attribute(img, "loading", "lazy");
            changed = true;
        }
        if !page.has_attribute(img, "decoding") {
            page.set_attribute(img, "decoding", "async");
            changed = true;
        }
        touched += usize::from(changed);
    }
    touched
}

#[derive(Debug)]
pub struct PerfLayer {
    body: Option<ElementId>,
    state: PerfState,
    idle: Vec<IdleTask>,
    scroll_settle: Debounce<()>,
    resize: Debounce<()>,
    gpu_hinted: Vec<ElementId>,
    timers: TimerQueue<PerfTask>,
    frames: FrameBatch,
    gate: FrameGate,
    fps: Option<FpsSampler>,
    prefetch: Prefetcher,
}

impl PerfLayer {
    /// Apply the boot-time tweaks and queue the idle work.
    pub fn boot<P: Page>(now: Duration, page: &mut P) -> Self {
        let mut state = PerfState::empty();
        if page.prefers_reduced_motion() {
            let count = apply_reduced_motion(page);
            state |= PerfState::REDUCED_MOTION;
            info!(elements = count, "reduced motion preferred, animations disabled");
        }

        let gpu_hinted = apply_gpu_hints(page);
        let mut timers = TimerQueue::new();
        if !gpu_hinted.is_empty() {
            timers.schedule_after(now, GPU_HINT_LIFETIME, PerfTask::ExpireGpuHints);
        }

        let hostname = page.hostname();
        let fps = fps::is_dev_host(&hostname).then(|| {
            debug!(%hostname, "frame rate sampling enabled");
            FpsSampler::new(now)
        });

        Self {
            body: page.body(),
            state,
            idle: vec![IdleTask::NormalizeImages, IdleTask::WatchLinks],
            scroll_settle: Debounce::new(SCROLL_SETTLE),
            resize: Debounce::new(RESIZE_DEBOUNCE),
            gpu_hinted,
            timers,
            frames: FrameBatch::new(),
            gate: FrameGate::new(now),
            fps,
            prefetch: Prefetcher::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> PerfState {
        self.state
    }

    /// Whether work is waiting for an idle period.
    #[must_use]
    pub fn wants_idle(&self) -> bool {
        !self.idle.is_empty()
    }

    /// Queue a layout read for the next frame; `true` when a frame must be requested.
    pub fn schedule_read(&mut self, callback: FrameCallback) -> bool {
        self.frames.schedule_read(callback)
    }

    /// Queue a DOM write for the next frame; `true` when a frame must be requested.
    pub fn schedule_write(&mut self, callback: FrameCallback) -> bool {
        self.frames.schedule_write(callback)
    }

    /// Detach the batch for the frame being rendered.
    pub fn take_frame_batch(&mut self) -> ReadyBatch {
        self.frames.take()
    }

    /// Frame-rate gate for `optimizedRAF`.
    pub fn admit_frame(&mut self, now: Duration) -> bool {
        self.gate.admit(now)
    }

    fn set_body_class<P: Page>(&self, page: &mut P, class: &str, on: bool) {
        let Some(body) = self.body else {
            return;
        };
        if on {
            page.add_class(body, class);
        } else {
            page.remove_class(body, class);
        }
    }

    fn run_idle<P: Page>(&mut self, page: &mut P) {
        for task in std::mem::take(&mut self.idle) {
            match task {
                IdleTask::NormalizeImages => {
                    let count = normalize_images(page);
                    debug!(images = count, "normalized image loading");
                }
                IdleTask::WatchLinks => {
                    self.prefetch.watch(page);
                    debug!(links = self.prefetch.watched(), "watching links for prefetch");
                }
            }
        }
    }

    fn sample_frame(&mut self, now: Duration) {
        let Some(fps) = self.fps.as_mut().and_then(|sampler| sampler.frame(now)) else {
            return;
        };
        debug!(fps, "frame rate");
        if fps < fps::LOW_FPS {
            warn!(fps, "low frame rate");
        }
    }
}

impl Controller for PerfLayer {
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        now: Duration,
        _prior: Handled,
        page: &mut P,
    ) -> Handled {
        match *event {
            PageEvent::Scroll => {
                if !self.state.contains(PerfState::SCROLLING) {
                    self.state |= PerfState::SCROLLING;
                    self.set_body_class(page, SCROLLING_CLASS, true);
                }
                self.scroll_settle.call(now, ());
                self.prefetch.check(page);
            }
            PageEvent::Resize => self.resize.call(now, ()),
            PageEvent::Visibility { hidden } => {
                self.state.set(PerfState::HIDDEN, hidden);
                self.set_body_class(page, HIDDEN_CLASS, hidden);
            }
            PageEvent::Idle => self.run_idle(page),
            PageEvent::Frame => self.sample_frame(now),
            PageEvent::Unload => {
                self.timers.clear();
                self.scroll_settle.cancel();
                self.resize.cancel();
            }
            _ => {}
        }
        Handled::NONE
    }

    fn advance<P: Page>(&mut self, now: Duration, page: &mut P) {
        if self.scroll_settle.poll(now).is_some() {
            self.state.remove(PerfState::SCROLLING);
            self.set_body_class(page, SCROLLING_CLASS, false);
        }
        if self.resize.poll(now).is_some() {
            page.dispatch_custom_event(RESIZE_EVENT);
        }
        while let Some(task) = self.timers.pop_due(now) {
            match task {
                PerfTask::ExpireGpuHints => {
                    for &el in &self.gpu_hinted {
                        page.set_style(el, "will-change", "auto");
                    }
                    debug!(elements = self.gpu_hinted.len(), "released gpu hints");
                    self.gpu_hinted.clear();
                }
            }
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        earliest(
            earliest(self.scroll_settle.deadline(), self.resize.deadline()),
            self.timers.next_deadline(),
        )
    }

    fn wants_frame(&self) -> bool {
        self.fps.is_some() || self.frames.is_pending()
    }
}
