#![forbid(unsafe_code)]

//! Browser host: listener wiring, timer arming and the exported JS API.
//!
//! One [`Host`] lives per page in a thread-local. Browser callbacks look it up,
//! translate their event into a [`PageEvent`], dispatch it through the
//! [`App`] and then re-arm the single timeout, animation frame and idle
//! callback the app currently asks for.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tracing::{Level, debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventTarget, IdleRequestOptions, Window};

use folio_core::perf::FrameCallback;
use folio_core::{App, ElementId, PageEvent, SiteConfig};

use crate::console;
use crate::dom::WebPage;

/// Upper bound the browser may defer idle work by.
const IDLE_TIMEOUT_MS: u32 = 2000;

/// Fallback delay when `requestIdleCallback` is unavailable.
const IDLE_FALLBACK_MS: i32 = 1;

thread_local! {
    static HOST: RefCell<Option<Rc<Host>>> = const { RefCell::new(None) };
}

fn host() -> Option<Rc<Host>> {
    HOST.with(|slot| slot.borrow().clone())
}

fn to_duration(ms: f64) -> Duration {
    Duration::from_secs_f64((ms / 1000.0).max(0.0))
}

struct Runtime {
    app: App,
    page: WebPage,
}

#[derive(Default)]
struct Schedule {
    timeout: Option<(i32, Duration)>,
    frame_pending: bool,
    idle_pending: bool,
}

struct Hooks {
    timer: Closure<dyn FnMut()>,
    frame: Closure<dyn FnMut(f64)>,
    idle: Closure<dyn FnMut()>,
}

#[derive(Clone, Copy)]
enum Phase {
    Read,
    Write,
}

struct Host {
    window: Window,
    runtime: RefCell<Runtime>,
    schedule: RefCell<Schedule>,
    /// Frame callbacks queued while the runtime was borrowed.
    deferred: RefCell<Vec<(Phase, FrameCallback)>>,
    has_idle_callback: bool,
    hooks: Hooks,
    unloading: Cell<bool>,
}

impl Host {
    fn new(window: Window, runtime: Runtime) -> Self {
        let has_idle_callback =
            js_sys::Reflect::has(&window, &JsValue::from_str("requestIdleCallback"))
                .unwrap_or(false);
        let hooks = Hooks {
            timer: Closure::wrap(Box::new(|| {
                if let Some(host) = host() {
                    host.on_timer();
                }
            }) as Box<dyn FnMut()>),
            frame: Closure::wrap(Box::new(|_timestamp: f64| {
                if let Some(host) = host() {
                    host.on_frame();
                }
            }) as Box<dyn FnMut(f64)>),
            idle: Closure::wrap(Box::new(|| {
                if let Some(host) = host() {
                    host.on_idle();
                }
            }) as Box<dyn FnMut()>),
        };
        Self {
            window,
            runtime: RefCell::new(runtime),
            schedule: RefCell::new(Schedule::default()),
            deferred: RefCell::new(Vec::new()),
            has_idle_callback,
            hooks,
            unloading: Cell::new(false),
        }
    }

    fn now(&self) -> Duration {
        self.window
            .performance()
            .map(|perf| to_duration(perf.now()))
            .unwrap_or_default()
    }

    /// Dispatch one event. Events raised while another is being handled
    /// (a custom event listener calling back in, say) are dropped.
    fn dispatch(&self, event: &Event, make: impl FnOnce(&mut WebPage) -> Option<PageEvent>) {
        let now = self.now();
        let handled = {
            let Ok(mut runtime) = self.runtime.try_borrow_mut() else {
                debug!(kind = %event.type_(), "re-entrant event dropped");
                return;
            };
            let Runtime { app, page } = &mut *runtime;
            let Some(page_event) = make(page) else {
                return;
            };
            app.dispatch(&page_event, page, now)
        };
        if handled.prevents_default() {
            event.prevent_default();
        }
        self.rearm();
    }

    /// Dispatch an event that has no cancelable browser counterpart.
    fn dispatch_plain(&self, page_event: PageEvent) {
        let now = self.now();
        if let Ok(mut runtime) = self.runtime.try_borrow_mut() {
            let Runtime { app, page } = &mut *runtime;
            app.dispatch(&page_event, page, now);
        }
        self.rearm();
    }

    fn on_timer(&self) {
        self.schedule.borrow_mut().timeout = None;
        let now = self.now();
        if let Ok(mut runtime) = self.runtime.try_borrow_mut() {
            let Runtime { app, page } = &mut *runtime;
            app.advance(now, page);
        }
        self.rearm();
    }

    fn on_frame(&self) {
        self.schedule.borrow_mut().frame_pending = false;
        let batch = match self.runtime.try_borrow_mut() {
            Ok(mut runtime) => runtime.app.take_frame_batch(),
            Err(_) => {
                self.rearm();
                return;
            }
        };
        // User callbacks may schedule more work, so run them unborrowed.
        let ran = batch.run();
        if ran > 0 {
            debug!(callbacks = ran, "frame batch ran");
        }
        self.dispatch_plain(PageEvent::Frame);
    }

    fn on_idle(&self) {
        self.schedule.borrow_mut().idle_pending = false;
        self.dispatch_plain(PageEvent::Idle);
    }

    fn enqueue(&self, phase: Phase, callback: FrameCallback) {
        self.deferred.borrow_mut().push((phase, callback));
        self.rearm();
    }

    /// Arm the browser callbacks the app currently asks for.
    fn rearm(&self) {
        if self.unloading.get() {
            return;
        }
        let (deadline, wants_frame, wants_idle) = {
            let Ok(mut runtime) = self.runtime.try_borrow_mut() else {
                return;
            };
            for (phase, callback) in self.deferred.borrow_mut().drain(..) {
                match phase {
                    Phase::Read => runtime.app.schedule_read(callback),
                    Phase::Write => runtime.app.schedule_write(callback),
                };
            }
            (
                runtime.app.next_deadline(),
                runtime.app.wants_frame(),
                runtime.app.wants_idle(),
            )
        };

        let mut schedule = self.schedule.borrow_mut();
        self.arm_timeout(&mut schedule, deadline);
        if wants_frame && !schedule.frame_pending {
            match self
                .window
                .request_animation_frame(self.hooks.frame.as_ref().unchecked_ref())
            {
                Ok(_) => schedule.frame_pending = true,
                Err(err) => warn!(error = ?err, "requestAnimationFrame failed"),
            }
        }
        if wants_idle && !schedule.idle_pending {
            match self.request_idle() {
                Ok(()) => schedule.idle_pending = true,
                Err(err) => warn!(error = ?err, "idle callback failed"),
            }
        }
    }

    fn arm_timeout(&self, schedule: &mut Schedule, deadline: Option<Duration>) {
        if schedule.timeout.map(|(_, at)| at) == deadline {
            return;
        }
        if let Some((handle, _)) = schedule.timeout.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let Some(deadline) = deadline else {
            return;
        };
        let delay = deadline.saturating_sub(self.now()).as_millis();
        let delay = i32::try_from(delay).unwrap_or(i32::MAX);
        match self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            self.hooks.timer.as_ref().unchecked_ref(),
            delay,
        ) {
            Ok(handle) => schedule.timeout = Some((handle, deadline)),
            Err(err) => warn!(error = ?err, "setTimeout failed"),
        }
    }

    fn request_idle(&self) -> Result<(), JsValue> {
        let callback = self.hooks.idle.as_ref().unchecked_ref();
        if self.has_idle_callback {
            let options = IdleRequestOptions::new();
            options.set_timeout(IDLE_TIMEOUT_MS);
            self.window
                .request_idle_callback_with_options(callback, &options)
                .map(|_| ())
        } else {
            self.window
                .set_timeout_with_callback_and_timeout_and_arguments_0(callback, IDLE_FALLBACK_MS)
                .map(|_| ())
        }
    }
}

fn listen(
    target: &EventTarget,
    kind: &str,
    options: &AddEventListenerOptions,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        callback.as_ref().unchecked_ref(),
        options,
    )?;
    callback.forget();
    Ok(())
}

/// Listen on `target`, mapping each browser event to a page event.
fn route(
    target: &EventTarget,
    kind: &str,
    options: &AddEventListenerOptions,
    make: fn(&Event, &mut WebPage) -> Option<PageEvent>,
) -> Result<(), JsValue> {
    listen(target, kind, options, move |event| {
        if let Some(host) = host() {
            host.dispatch(&event, |page| make(&event, page));
        }
    })
}

fn target_of(event: &Event, page: &mut WebPage) -> Option<ElementId> {
    page.intern_target(event.target())
}

fn bind_listeners(window: &Window) -> Result<(), JsValue> {
    let document: EventTarget = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?
        .into();
    let window_target: &EventTarget = window.as_ref();

    let plain = AddEventListenerOptions::new();
    let passive = AddEventListenerOptions::new();
    passive.set_passive(true);
    let capture = AddEventListenerOptions::new();
    capture.set_capture(true);

    route(window_target, "scroll", &passive, |_, _| Some(PageEvent::Scroll))?;
    route(window_target, "resize", &passive, |_, _| Some(PageEvent::Resize))?;
    listen(window_target, "load", &plain, |_| {
        if let Some(host) = host() {
            let elapsed = host.window.performance().map(|perf| to_duration(perf.now()));
            host.dispatch_plain(PageEvent::Load { elapsed });
        }
    })?;
    listen(window_target, "beforeunload", &plain, |_| {
        if let Some(host) = host() {
            host.dispatch_plain(PageEvent::Unload);
            host.unloading.set(true);
        }
    })?;

    route(&document, "click", &plain, |event, page| {
        target_of(event, page).map(|target| PageEvent::Click { target })
    })?;
    route(&document, "input", &plain, |event, page| {
        target_of(event, page).map(|target| PageEvent::Input { target })
    })?;
    route(&document, "submit", &plain, |event, page| {
        target_of(event, page).map(|form| PageEvent::Submit { form })
    })?;
    // `blur` does not bubble; catch it on the way down.
    route(&document, "blur", &capture, |event, page| {
        target_of(event, page).map(|target| PageEvent::Blur { target })
    })?;
    listen(&document, "visibilitychange", &plain, |_| {
        if let Some(host) = host() {
            let hidden = host.window.document().is_some_and(|doc| doc.hidden());
            host.dispatch_plain(PageEvent::Visibility { hidden });
        }
    })?;
    Ok(())
}

fn watch_fonts(window: &Window) {
    let Some(fonts) = window.document().map(|doc| doc.fonts()) else {
        return;
    };
    let Ok(ready) = fonts.ready() else {
        return;
    };
    wasm_bindgen_futures::spawn_local(async move {
        if wasm_bindgen_futures::JsFuture::from(ready).await.is_ok() {
            debug!("fonts loaded");
        }
    });
}

fn parse_options(options: Option<JsValue>) -> Result<SiteConfig, JsValue> {
    let Some(options) = options.filter(|v| !v.is_undefined() && !v.is_null()) else {
        return Ok(SiteConfig::default());
    };
    let json: String = js_sys::JSON::stringify(&options)?.into();
    SiteConfig::from_json(&json).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Handle returned by [`boot`].
#[wasm_bindgen]
pub struct Folio {
    _private: (),
}

#[wasm_bindgen]
impl Folio {
    /// Milliseconds until the next pending timer, if any.
    #[wasm_bindgen(js_name = nextDeadlineMs)]
    pub fn next_deadline_ms(&self) -> Option<f64> {
        let host = host()?;
        let deadline = host.runtime.try_borrow().ok()?.app.next_deadline()?;
        Some(deadline.saturating_sub(host.now()).as_secs_f64() * 1000.0)
    }

    /// Whether the contact form was found and bound.
    #[wasm_bindgen(getter, js_name = hasContactForm)]
    pub fn has_contact_form(&self) -> bool {
        host()
            .and_then(|host| host.runtime.try_borrow().ok().map(|rt| rt.app.contact().is_some()))
            .unwrap_or(false)
    }
}

/// Bind every controller to the current document.
///
/// `options` is an optional object of site options (`scrollOffset`,
/// `counterDurationMs`, `contactAddress`, ...). Booting twice is an error.
#[wasm_bindgen]
pub fn boot(options: Option<JsValue>) -> Result<Folio, JsValue> {
    if host().is_some() {
        return Err(JsValue::from_str("folio is already running"));
    }
    let config = parse_options(options)?;
    let max_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    console::init(max_level);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let mut page = WebPage::new(window.clone())?;
    let now = window
        .performance()
        .map(|perf| to_duration(perf.now()))
        .unwrap_or_default();
    let app = App::boot(config, &mut page, now).map_err(|err| JsValue::from_str(&err.to_string()))?;
    console::print_styled(app.greeting());

    let host = Rc::new(Host::new(window.clone(), Runtime { app, page }));
    HOST.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&host)));
    bind_listeners(&window)?;
    watch_fonts(&window);
    host.rearm();
    info!("listeners attached");
    Ok(Folio { _private: () })
}

fn frame_callback(callback: js_sys::Function) -> FrameCallback {
    Box::new(move || {
        if let Err(err) = callback.call0(&JsValue::NULL) {
            warn!(error = ?err, "frame callback threw");
        }
    })
}

/// Queue a layout read for the next animation frame.
#[wasm_bindgen(js_name = scheduleRead)]
pub fn schedule_read(callback: js_sys::Function) -> Result<(), JsValue> {
    let host = host().ok_or_else(|| JsValue::from_str("folio is not running"))?;
    host.enqueue(Phase::Read, frame_callback(callback));
    Ok(())
}

/// Queue a DOM write for the next animation frame, after every read.
#[wasm_bindgen(js_name = scheduleWrite)]
pub fn schedule_write(callback: js_sys::Function) -> Result<(), JsValue> {
    let host = host().ok_or_else(|| JsValue::from_str("folio is not running"))?;
    host.enqueue(Phase::Write, frame_callback(callback));
    Ok(())
}

/// Run `callback` on the next animation frame unless a frame already ran
/// within the last sixtieth of a second.
#[wasm_bindgen(js_name = optimizedRAF)]
pub fn optimized_raf(callback: js_sys::Function) -> Result<(), JsValue> {
    let host = host().ok_or_else(|| JsValue::from_str("folio is not running"))?;
    let on_frame = Closure::once_into_js(move |_timestamp: f64| {
        let Some(host) = self::host() else {
            return;
        };
        let now = host.now();
        let admitted = host
            .runtime
            .try_borrow_mut()
            .is_ok_and(|mut runtime| runtime.app.admit_frame(now));
        if admitted && let Err(err) = callback.call0(&JsValue::NULL) {
            warn!(error = ?err, "animation callback threw");
        }
    });
    host.window
        .request_animation_frame(on_frame.unchecked_ref())
        .map(|_| ())
}
