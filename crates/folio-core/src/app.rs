#![forbid(unsafe_code)]

//! Bootstrap and event routing.
//!
//! [`App`] owns one instance of every controller. The host calls
//! [`App::dispatch`] for each browser event, [`App::advance`] when the
//! deadline from [`App::next_deadline`] passes, and renders frames or idle
//! callbacks while [`App::wants_frame`] / [`App::wants_idle`] say so.
//!
//! Controllers see events in bootstrap order. Each one receives the flags
//! produced by the controllers before it, so a later generic handler can
//! skip an event an earlier one already consumed.

use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::config::{ConfigError, SiteConfig};
use crate::contact::{ContactForm, Courier, FormError};
use crate::event::{Controller, Handled, PageEvent};
use crate::extras::{self, ConsoleLine, HashLinks, LazyImages, LoadReport, ProjectLinks};
use crate::navigation::Navigation;
use crate::page::Page;
use crate::perf::{FrameCallback, PerfLayer, ReadyBatch};
use crate::reveal::{self, Counters, ScrollReveals, SkillBars};
use crate::scroll_top::ScrollToTop;
use crate::timer::earliest;

/// Why the site could not start.
#[derive(Debug)]
pub enum BootError {
    /// Options passed by the embedding page are unusable.
    Config(ConfigError),
    /// The contact form is present but incomplete.
    Form(FormError),
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid site options: {err}"),
            Self::Form(err) => write!(f, "contact form unusable: {err}"),
        }
    }
}

impl std::error::Error for BootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Form(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BootError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<FormError> for BootError {
    fn from(err: FormError) -> Self {
        Self::Form(err)
    }
}

/// The running site.
#[derive(Debug)]
pub struct App {
    config: SiteConfig,
    perf: PerfLayer,
    navigation: Navigation,
    scroll_top: ScrollToTop,
    counters: Counters,
    reveals: ScrollReveals,
    contact: Option<ContactForm>,
    skill_bars: SkillBars,
    project_links: ProjectLinks,
    lazy_images: LazyImages,
    hash_links: HashLinks,
    load_report: LoadReport,
    greeting: Vec<ConsoleLine>,
}

fn route<C: Controller, P: Page>(
    controller: &mut C,
    event: &PageEvent,
    now: Duration,
    handled: &mut Handled,
    page: &mut P,
) {
    *handled |= controller.handle(event, now, *handled, page);
}

impl App {
    /// Bind every controller to `page`.
    pub fn boot<P: Page>(config: SiteConfig, page: &mut P, now: Duration) -> Result<Self, BootError> {
        info!("initializing portfolio");

        let perf = PerfLayer::boot(now, page);
        let navigation = Navigation::bind(&config, page);
        let scroll_top = ScrollToTop::bind(page);
        let counters = reveal::counters(&config, now, page);
        let reveals = reveal::scroll_reveals(now, page);
        let contact = ContactForm::bind(&config, page)?;
        let skill_bars = reveal::skill_bars(now, page);
        let project_links = ProjectLinks::bind(page);
        let lazy_images = extras::lazy_images(now, page);
        let hash_links = HashLinks::new(&config);
        let greeting = extras::greeting(&config);

        info!(
            counters = counters.targets().len(),
            reveals = reveals.targets().len(),
            skill_bars = skill_bars.targets().len(),
            contact_form = contact.is_some(),
            "portfolio initialized"
        );

        Ok(Self {
            config,
            perf,
            navigation,
            scroll_top,
            counters,
            reveals,
            contact,
            skill_bars,
            project_links,
            lazy_images,
            hash_links,
            load_report: LoadReport::default(),
            greeting,
        })
    }

    /// Route one host event, then run whatever became due.
    pub fn dispatch<P: Page>(&mut self, event: &PageEvent, page: &mut P, now: Duration) -> Handled {
        let mut handled = Handled::NONE;
        route(&mut self.perf, event, now, &mut handled, page);
        route(&mut self.navigation, event, now, &mut handled, page);
        route(&mut self.scroll_top, event, now, &mut handled, page);
        route(&mut self.counters, event, now, &mut handled, page);
        route(&mut self.reveals, event, now, &mut handled, page);
        if let Some(contact) = self.contact.as_mut() {
            route(contact, event, now, &mut handled, page);
        }
        route(&mut self.skill_bars, event, now, &mut handled, page);
        route(&mut self.project_links, event, now, &mut handled, page);
        route(&mut self.lazy_images, event, now, &mut handled, page);
        route(&mut self.hash_links, event, now, &mut handled, page);
        route(&mut self.load_report, event, now, &mut handled, page);
        self.advance(now, page);
        handled
    }

    /// Fire every debounce and timer due at `now`.
    pub fn advance<P: Page>(&mut self, now: Duration, page: &mut P) {
        self.perf.advance(now, page);
        self.navigation.advance(now, page);
        self.scroll_top.advance(now, page);
        self.counters.advance(now, page);
        self.reveals.advance(now, page);
        if let Some(contact) = self.contact.as_mut() {
            contact.advance(now, page);
        }
        self.skill_bars.advance(now, page);
        self.lazy_images.advance(now, page);
    }

    /// Earliest instant at which [`advance`](Self::advance) has work.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        [
            self.perf.next_deadline(),
            self.navigation.next_deadline(),
            self.scroll_top.next_deadline(),
            self.counters.next_deadline(),
            self.reveals.next_deadline(),
            self.contact.as_ref().and_then(|contact| contact.next_deadline()),
            self.skill_bars.next_deadline(),
            self.lazy_images.next_deadline(),
        ]
        .into_iter()
        .fold(None, earliest)
    }

    /// Whether the host should deliver [`PageEvent::Frame`] next frame.
    #[must_use]
    pub fn wants_frame(&self) -> bool {
        self.perf.wants_frame() || self.counters.wants_frame()
    }

    /// Whether the host should deliver [`PageEvent::Idle`].
    #[must_use]
    pub fn wants_idle(&self) -> bool {
        self.perf.wants_idle()
    }

    pub fn schedule_read(&mut self, callback: FrameCallback) -> bool {
        self.perf.schedule_read(callback)
    }

    pub fn schedule_write(&mut self, callback: FrameCallback) -> bool {
        self.perf.schedule_write(callback)
    }

    /// Callbacks to run in the current frame, reads first.
    pub fn take_frame_batch(&mut self) -> ReadyBatch {
        self.perf.take_frame_batch()
    }

    /// Frame-rate gate behind the `optimizedRAF` hook.
    pub fn admit_frame(&mut self, now: Duration) -> bool {
        self.perf.admit_frame(now)
    }

    /// Replace the contact form's delivery channel.
    pub fn set_courier(&mut self, courier: Box<dyn Courier>) {
        if let Some(contact) = self.contact.take() {
            self.contact = Some(contact.with_courier(courier));
        }
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    #[must_use]
    pub fn greeting(&self) -> &[ConsoleLine] {
        &self.greeting
    }

    #[must_use]
    pub fn perf(&self) -> &PerfLayer {
        &self.perf
    }

    #[must_use]
    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    #[must_use]
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    #[must_use]
    pub fn reveals(&self) -> &ScrollReveals {
        &self.reveals
    }

    #[must_use]
    pub fn skill_bars(&self) -> &SkillBars {
        &self.skill_bars
    }

    #[must_use]
    pub fn contact(&self) -> Option<&ContactForm> {
        self.contact.as_ref()
    }

    #[must_use]
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }
}
