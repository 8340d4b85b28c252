//! Performance layer: reduced motion, body classes, resize, GPU hints, idle
//! work, prefetch, frame batching and FPS sampling.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use folio_core::PageEvent;
use folio_core::page::Dom;
use folio_core::perf::{PerfState, REDUCED_MOTION_CSS, RESIZE_EVENT};
use folio_harness::{El, FakePage, Site, capture_logs, portfolio};
use pretty_assertions::assert_eq;
use tracing::Level;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn site() -> Site {
    let (page, _) = portfolio();
    Site::boot(page).unwrap()
}

#[test]
fn reduced_motion_finalizes_reveals() {
    let (page, _) = portfolio();
    let mut site = Site::boot(page.with_reduced_motion(true)).unwrap();

    assert!(site.page.query_all("[data-aos]").is_empty());
    let revealed = site.page.query_all(".aos-animate");
    assert_eq!(revealed.len(), 1);
    assert_eq!(site.page.stylesheets, vec![REDUCED_MOTION_CSS.to_string()]);
    assert!(site.app.perf().state().contains(PerfState::REDUCED_MOTION));
    // The reveal controller found nothing left to animate.
    assert!(site.app.reveals().targets().is_empty());
}

#[test]
fn motion_allowed_injects_nothing() {
    let site = site();
    assert!(site.page.stylesheets.is_empty());
    assert!(!site.app.perf().state().contains(PerfState::REDUCED_MOTION));
}

#[test]
fn scrolling_class_clears_after_quiet_period() {
    let mut site = site();
    let body = site.page.body_id();

    site.scroll(10.0);
    assert!(site.page.has_class(body, "scrolling"));
    site.advance_by(ms(100));
    site.scroll(20.0);
    site.advance_by(ms(149));
    assert!(site.page.has_class(body, "scrolling"));
    site.advance_by(ms(1));
    assert!(!site.page.has_class(body, "scrolling"));
    assert!(!site.app.perf().state().contains(PerfState::SCROLLING));
}

#[test]
fn resize_burst_dispatches_one_event() {
    let mut site = site();
    for _ in 0..3 {
        site.dispatch(PageEvent::Resize);
        site.advance_by(ms(100));
    }
    assert!(site.page.custom_events.is_empty());
    site.advance_by(ms(150));
    assert_eq!(site.page.custom_events, vec![RESIZE_EVENT.to_string()]);
}

#[test]
fn gpu_hints_expire() {
    let mut site = site();
    let hero = site.page.query_all(".hero-section")[0];
    let card = site.page.query_all(".project-card")[0];
    for el in [hero, card] {
        assert_eq!(site.page.style(el, "will-change"), "transform, opacity");
        assert_eq!(site.page.style(el, "transform"), "translateZ(0)");
        assert_eq!(site.page.style(el, "backface-visibility"), "hidden");
    }
    site.advance_by(ms(2_999));
    assert_eq!(site.page.style(hero, "will-change"), "transform, opacity");
    site.advance_by(ms(1));
    assert_eq!(site.page.style(hero, "will-change"), "auto");
    assert_eq!(site.page.style(card, "will-change"), "auto");
}

#[test]
fn visibility_mirrors_into_body_class() {
    let mut site = site();
    let body = site.page.body_id();
    site.dispatch(PageEvent::Visibility { hidden: true });
    assert!(site.page.has_class(body, "page-hidden"));
    site.dispatch(PageEvent::Visibility { hidden: false });
    assert!(!site.page.has_class(body, "page-hidden"));
}

#[test]
fn idle_work_normalizes_images_once() {
    let mut page = FakePage::default();
    let plain = page.add(El::new("img").at(5_000.0, 10.0));
    let eager = page.add(El::new("img").attr("loading", "eager").at(5_000.0, 10.0));
    let mut site = Site::boot(page).unwrap();

    assert!(site.app.wants_idle());
    assert!(!site.page.has_attribute(plain, "loading"));
    site.idle();
    assert!(!site.app.wants_idle());

    assert_eq!(site.page.attribute(plain, "loading").as_deref(), Some("lazy"));
    assert_eq!(site.page.attribute(plain, "decoding").as_deref(), Some("async"));
    assert_eq!(site.page.attribute(eager, "loading").as_deref(), Some("eager"));
    assert_eq!(site.page.attribute(eager, "decoding").as_deref(), Some("async"));
}

#[test]
fn links_near_the_window_prefetch_their_section() {
    let mut page = FakePage::default();
    let far = page.add(El::new("section").id("far").at(5_000.0, 500.0));
    let far_img = page.append(far, El::new("img").attr("loading", "lazy").at(5_100.0, 50.0));
    let near = page.add(El::new("section").id("near").at(3_000.0, 500.0));
    let near_img = page.append(near, El::new("img").attr("loading", "lazy").at(3_100.0, 50.0));
    // In view at boot.
    page.add(El::new("a").attr("href", "#near").at(100.0, 20.0));
    // Reachable only after scrolling.
    page.add(El::new("a").attr("href", "#far").at(2_000.0, 20.0));
    let mut site = Site::boot(page).unwrap();

    site.idle();
    assert_eq!(site.page.attribute(near_img, "loading").as_deref(), Some("eager"));
    assert_eq!(site.page.attribute(far_img, "loading").as_deref(), Some("lazy"));

    // 2000 - 1100 = 900, within 200px of the 800px window.
    site.scroll(1_100.0);
    assert_eq!(site.page.attribute(far_img, "loading").as_deref(), Some("eager"));
}

#[test]
fn frame_batch_runs_reads_before_writes() {
    let mut site = site();
    let log = Rc::new(RefCell::new(Vec::new()));
    let push = |tag: &'static str| {
        let log = Rc::clone(&log);
        Box::new(move || log.borrow_mut().push(tag))
    };
    assert!(site.app.schedule_write(push("write")));
    assert!(!site.app.schedule_read(push("read")));
    assert!(site.app.wants_frame());

    site.frame();
    assert_eq!(*log.borrow(), vec!["read", "write"]);
    assert!(!site.app.wants_frame());
}

#[test]
fn frame_gate_caps_callback_rate() {
    let mut site = site();
    assert!(!site.app.admit_frame(ms(10)));
    assert!(site.app.admit_frame(ms(17)));
    assert!(!site.app.admit_frame(ms(20)));
}

#[test]
fn fps_sampling_only_on_dev_hosts() {
    let (page, _) = portfolio();
    let site = Site::boot(page).unwrap();
    assert!(!site.app.wants_frame());

    let (page, _) = portfolio();
    let site = Site::boot(page.with_hostname("localhost")).unwrap();
    assert!(site.app.wants_frame());
}

#[test]
fn slow_frames_are_reported() {
    let (page, _) = portfolio();
    let mut site = Site::boot(page.with_hostname("127.0.0.1")).unwrap();
    let ((), events) = capture_logs(|| {
        for _ in 0..30 {
            site.advance_by(ms(40));
            site.dispatch(PageEvent::Frame);
        }
    });
    let warning = events
        .iter()
        .find(|e| e.level == Level::WARN && e.message == "low frame rate")
        .expect("low frame rate warning");
    assert_eq!(warning.field("fps"), Some("25"));
}
