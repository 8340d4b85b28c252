#![forbid(unsafe_code)]

//! "Animate once when visible" controllers.
//!
//! [`RevealOnVisible`] enumerates its targets once at bind time into an
//! indexed list and tracks visited status in a parallel `Vec<bool>`. On bind
//! and after every debounced scroll it runs its [`RevealAction`] for each
//! target that is partially visible and not yet visited, then marks it.
//!
//! Three actions are provided:
//!
//! | Action | Targets | Effect |
//! |--------|---------|--------|
//! | [`CountUp`] | `.stat-number[data-count]` | counts from 0 to `data-count` over frames |
//! | [`FadeIn`] | `[data-aos]` | adds `aos-animate` after `data-aos-delay` ms |
//! | [`SkillBarFill`] | `.pro-skill-fill` | collapses the bar and restores its width 100ms later |
//!
//! # Invariants
//!
//! - A visited target never runs its action again, however many scroll events
//!   follow.
//! - A counter's displayed value never decreases and never exceeds its target;
//!   the final frame shows exactly the target.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::debounce::Debounce;
use crate::event::{Controller, Handled, PageEvent};
use crate::geometry::{Rect, Viewport, is_partially_visible};
use crate::page::{ElementId, Page};
use crate::timer::{TimerQueue, earliest};

/// Nominal frame length used to size counter increments.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Delay between collapsing a skill bar and restoring its width.
pub const SKILL_BAR_RESTORE: Duration = Duration::from_millis(100);

/// Class applied to revealed `[data-aos]` elements.
pub const REVEALED_CLASS: &str = "aos-animate";

/// Parse the leading decimal digits of `raw`, ignoring leading whitespace.
///
/// `"150+"` yields `150`; `"abc"`, `""` and negative numbers yield `None`.
#[must_use]
pub fn parse_leading_uint(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if end == 0 {
        return None;
    }
    // Saturate absurdly long digit runs instead of rejecting them.
    Some(trimmed[..end].parse().unwrap_or(u64::MAX))
}

/// Effect run once per target.
pub trait RevealAction {
    /// Delayed work scheduled by [`start`](Self::start).
    type Task: std::fmt::Debug;

    /// Short name used in logs.
    const NAME: &'static str;

    /// Whether `rect` counts as visible. Defaults to the reveal band.
    fn qualifies(&self, rect: &Rect, viewport: Viewport) -> bool {
        is_partially_visible(rect, viewport)
    }

    /// Begin the effect on `el`.
    fn start<P: Page>(
        &mut self,
        el: ElementId,
        now: Duration,
        page: &mut P,
        timers: &mut TimerQueue<Self::Task>,
    );

    /// Run a task scheduled by [`start`](Self::start).
    fn fire<P: Page>(&mut self, task: Self::Task, page: &mut P);

    /// Advance frame-driven effects by one frame.
    fn on_frame<P: Page>(&mut self, _page: &mut P) {}

    /// Whether frame-driven effects are still running.
    fn wants_frame(&self) -> bool {
        false
    }
}

/// Generic reveal-on-visible controller.
#[derive(Debug)]
pub struct RevealOnVisible<A: RevealAction> {
    targets: Vec<ElementId>,
    visited: Vec<bool>,
    scroll: Debounce<()>,
    timers: TimerQueue<A::Task>,
    action: A,
}

impl<A: RevealAction> RevealOnVisible<A> {
    /// Enumerate `selector` and run the first visibility check.
    pub fn bind<P: Page>(
        selector: &str,
        debounce: Duration,
        action: A,
        now: Duration,
        page: &mut P,
    ) -> Self {
        let targets = page.query_all(selector);
        let mut this = Self {
            visited: vec![false; targets.len()],
            targets,
            scroll: Debounce::new(debounce),
            timers: TimerQueue::new(),
            action,
        };
        this.check(now, page);
        this
    }

    /// Run the action on every newly visible target.
    pub fn check<P: Page>(&mut self, now: Duration, page: &mut P) {
        if self.targets.is_empty() {
            return;
        }
        let viewport = page.viewport();
        for (index, &el) in self.targets.iter().enumerate() {
            if self.visited[index] || !self.action.qualifies(&page.bounding_rect(el), viewport) {
                continue;
            }
            self.visited[index] = true;
            debug!(action = A::NAME, element = el.0, "reveal");
            self.action.start(el, now, page, &mut self.timers);
        }
    }

    #[must_use]
    pub fn targets(&self) -> &[ElementId] {
        &self.targets
    }

    /// Number of targets whose action has run.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|v| **v).count()
    }

    #[must_use]
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Drop pending delayed work.
    pub fn cancel_timers(&mut self) {
        self.timers.clear();
        self.scroll.cancel();
    }
}

impl<A: RevealAction> Controller for RevealOnVisible<A> {
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        now: Duration,
        _prior: Handled,
        page: &mut P,
    ) -> Handled {
        match event {
            PageEvent::Scroll if !self.targets.is_empty() => self.scroll.call(now, ()),
            PageEvent::Frame => self.action.on_frame(page),
            PageEvent::Unload => self.cancel_timers(),
            _ => {}
        }
        Handled::NONE
    }

    fn advance<P: Page>(&mut self, now: Duration, page: &mut P) {
        if self.scroll.poll(now).is_some() {
            self.check(now, page);
        }
        while let Some(task) = self.timers.pop_due(now) {
            self.action.fire(task, page);
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        earliest(self.scroll.deadline(), self.timers.next_deadline())
    }

    fn wants_frame(&self) -> bool {
        self.action.wants_frame()
    }
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

/// Linear frame-stepped count from 0 to a target.
///
/// Each [`step`](Self::step) adds `target / (duration / 16ms)`. While the
/// running value is below the target the floor is displayed; the first step
/// that reaches or passes the target displays exactly the target and
/// completes the tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterTween {
    target: u64,
    increment: f64,
    current: f64,
    done: bool,
}

impl CounterTween {
    #[must_use]
    pub fn new(target: u64, duration: Duration) -> Self {
        let frames = duration.as_secs_f64() / FRAME_INTERVAL.as_secs_f64();
        let increment = if frames > 0.0 {
            target as f64 / frames
        } else {
            f64::INFINITY
        };
        Self {
            target,
            increment,
            current: 0.0,
            done: false,
        }
    }

    /// Advance one frame and return the value to display.
    pub fn step(&mut self) -> u64 {
        if self.done {
            return self.target;
        }
        self.current += self.increment;
        if self.current < self.target as f64 {
            (self.current.floor() as u64).min(self.target)
        } else {
            self.done = true;
            self.target
        }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub const fn target(&self) -> u64 {
        self.target
    }
}

/// Counts `data-count` elements up from zero.
#[derive(Debug)]
pub struct CountUp {
    duration: Duration,
    running: Vec<(ElementId, CounterTween)>,
}

impl CountUp {
    #[must_use]
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            duration: config.counter_duration,
            running: Vec::new(),
        }
    }

    /// Counters still animating.
    #[must_use]
    pub fn running(&self) -> usize {
        self.running.len()
    }
}

impl RevealAction for CountUp {
    type Task = ();
    const NAME: &'static str = "counter";

    fn start<P: Page>(
        &mut self,
        el: ElementId,
        _now: Duration,
        page: &mut P,
        _timers: &mut TimerQueue<()>,
    ) {
        let raw = page.attribute(el, "data-count").unwrap_or_default();
        let Some(target) = parse_leading_uint(&raw) else {
            warn!(element = el.0, value = %raw, "counter target is not a number");
            return;
        };
        let mut tween = CounterTween::new(target, self.duration);
        page.set_text(el, &tween.step().to_string());
        if !tween.is_done() {
            self.running.push((el, tween));
        }
    }

    fn fire<P: Page>(&mut self, _task: (), _page: &mut P) {}

    fn on_frame<P: Page>(&mut self, page: &mut P) {
        self.running.retain_mut(|(el, tween)| {
            page.set_text(*el, &tween.step().to_string());
            !tween.is_done()
        });
    }

    fn wants_frame(&self) -> bool {
        !self.running.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Fade-in
// ---------------------------------------------------------------------------

/// Adds [`REVEALED_CLASS`] after the element's `data-aos-delay`.
#[derive(Debug, Default)]
pub struct FadeIn;

impl RevealAction for FadeIn {
    type Task = ElementId;
    const NAME: &'static str = "fade";

    fn start<P: Page>(
        &mut self,
        el: ElementId,
        now: Duration,
        page: &mut P,
        timers: &mut TimerQueue<ElementId>,
    ) {
        let delay = page
            .attribute(el, "data-aos-delay")
            .and_then(|raw| parse_leading_uint(&raw))
            .unwrap_or(0);
        timers.schedule_after(now, Duration::from_millis(delay), el);
    }

    fn fire<P: Page>(&mut self, el: ElementId, page: &mut P) {
        page.add_class(el, REVEALED_CLASS);
    }
}

// ---------------------------------------------------------------------------
// Skill bars
// ---------------------------------------------------------------------------

/// Replays a skill bar's width transition from zero.
#[derive(Debug, Default)]
pub struct SkillBarFill;

/// Pending width restore for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreWidth {
    pub el: ElementId,
    pub width: String,
}

impl RevealAction for SkillBarFill {
    type Task = RestoreWidth;
    const NAME: &'static str = "skill-bar";

    fn start<P: Page>(
        &mut self,
        el: ElementId,
        now: Duration,
        page: &mut P,
        timers: &mut TimerQueue<RestoreWidth>,
    ) {
        let width = page.style(el, "width");
        page.set_style(el, "width", "0%");
        timers.schedule_after(now, SKILL_BAR_RESTORE, RestoreWidth { el, width });
    }

    fn fire<P: Page>(&mut self, task: RestoreWidth, page: &mut P) {
        page.set_style(task.el, "width", &task.width);
    }
}

/// Counter controller bound to `.stat-number[data-count]`.
pub type Counters = RevealOnVisible<CountUp>;
/// Fade-in controller bound to `[data-aos]`.
pub type ScrollReveals = RevealOnVisible<FadeIn>;
/// Skill bar controller bound to `.pro-skill-fill`.
pub type SkillBars = RevealOnVisible<SkillBarFill>;

pub const COUNTER_SELECTOR: &str = ".stat-number[data-count]";
pub const REVEAL_SELECTOR: &str = "[data-aos]";
pub const SKILL_BAR_SELECTOR: &str = ".pro-skill-fill";

/// Bind the counter controller.
pub fn counters<P: Page>(config: &SiteConfig, now: Duration, page: &mut P) -> Counters {
    RevealOnVisible::bind(
        COUNTER_SELECTOR,
        Duration::from_millis(100),
        CountUp::new(config),
        now,
        page,
    )
}

/// Bind the fade-in controller.
pub fn scroll_reveals<P: Page>(now: Duration, page: &mut P) -> ScrollReveals {
    RevealOnVisible::bind(REVEAL_SELECTOR, Duration::from_millis(50), FadeIn, now, page)
}

/// Bind the skill bar controller.
pub fn skill_bars<P: Page>(now: Duration, page: &mut P) -> SkillBars {
    RevealOnVisible::bind(
        SKILL_BAR_SELECTOR,
        Duration::from_millis(100),
        SkillBarFill,
        now,
        page,
    )
}
