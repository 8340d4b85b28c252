//! Fade-in, counter, skill bar and lazy image triggers.

use std::time::Duration;

use folio_core::page::Dom;
use folio_harness::{El, FakePage, Site, portfolio};
use pretty_assertions::assert_eq;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn site() -> Site {
    let (page, _) = portfolio();
    Site::boot(page).unwrap()
}

#[test]
fn nothing_below_the_fold_fires_at_boot() {
    let site = site();
    assert_eq!(site.app.reveals().visited_count(), 0);
    assert_eq!(site.app.counters().visited_count(), 0);
    assert_eq!(site.app.skill_bars().visited_count(), 0);
}

#[test]
fn fade_in_waits_for_declared_delay() {
    let mut site = site();
    let target = site.page.query_all("[data-aos]")[0];

    // Top at 1000 - 400 = 600, inside the 85% band (680).
    site.scroll(400.0);
    site.advance_by(ms(50));
    assert_eq!(site.app.reveals().visited_count(), 1);
    assert!(!site.page.has_class(target, "aos-animate"));

    site.advance_by(ms(199));
    assert!(!site.page.has_class(target, "aos-animate"));
    site.advance_by(ms(1));
    assert!(site.page.has_class(target, "aos-animate"));
}

#[test]
fn reveal_runs_once_per_element() {
    let mut site = site();
    let target = site.page.query_all("[data-aos]")[0];
    site.scroll(400.0);
    site.advance_by(ms(300));
    assert!(site.page.has_class(target, "aos-animate"));

    site.page.remove_class(target, "aos-animate");
    site.scroll(0.0);
    site.advance_by(ms(300));
    site.scroll(400.0);
    site.advance_by(ms(300));
    assert!(!site.page.has_class(target, "aos-animate"));
    assert_eq!(site.app.reveals().visited_count(), 1);
}

#[test]
fn element_above_the_window_does_not_fire() {
    let mut site = site();
    // Reveal target spans [1000, 1200); bottom is at -100.
    site.scroll(1300.0);
    site.advance_by(ms(50));
    assert_eq!(site.app.reveals().visited_count(), 0);
}

#[test]
fn counter_ends_exactly_on_target() {
    let mut site = site();
    let counter = site.page.query_all(".stat-number")[0];

    site.scroll(400.0);
    site.advance_by(ms(100));
    // First frame runs synchronously: floor(150 / 125).
    assert_eq!(site.page.text(counter), "1");
    assert!(site.app.wants_frame());

    let frames = site.run_frames(1_000);
    // 125 steps in total, give or take float accumulation.
    assert!((123..=125).contains(&frames), "frames = {frames}");
    assert_eq!(site.page.text(counter), "150");
    assert!(!site.app.wants_frame());
}

#[test]
fn counter_with_garbage_target_is_skipped() {
    let mut page = FakePage::default();
    let counter = page.add(
        El::new("span")
            .class("stat-number")
            .attr("data-count", "lots")
            .text("?")
            .at(100.0, 20.0),
    );
    let site = Site::boot(page).unwrap();
    assert_eq!(site.page.text(counter), "?");
    assert_eq!(site.app.counters().action().running(), 0);
}

#[test]
fn counter_target_uses_leading_digits() {
    let mut page = FakePage::default();
    let counter = page.add(
        El::new("span")
            .class("stat-number")
            .attr("data-count", "25+")
            .at(100.0, 20.0),
    );
    let mut site = Site::boot(page).unwrap();
    site.run_frames(1_000);
    assert_eq!(site.page.text(counter), "25");
}

#[test]
fn skill_bar_replays_its_width() {
    let mut site = site();
    let bar = site.page.query_all(".pro-skill-fill")[0];

    site.scroll(800.0);
    site.advance_by(ms(100));
    assert_eq!(site.page.style(bar, "width"), "0%");
    site.advance_by(ms(100));
    assert_eq!(site.page.style(bar, "width"), "90%");
}

#[test]
fn lazy_images_are_marked_once_visible() {
    let mut site = site();
    let images = site.page.query_all("img[loading=\"lazy\"]");
    let shot = images[0];
    assert!(!site.page.has_class(shot, "loaded"));

    site.scroll(1200.0);
    site.advance_by(ms(50));
    assert!(site.page.has_class(shot, "loaded"));
    assert!(!site.page.has_class(images[1], "loaded"));
}

#[test]
fn lazy_image_loads_on_any_overlap_with_window() {
    let mut page = FakePage::default();
    // Top at 760 of an 800px window: inside the window, below the reveal band.
    let image = page.add(
        El::new("img")
            .attr("loading", "lazy")
            .attr("src", "edge.webp")
            .at(760.0, 100.0),
    );
    let faded = page.add(El::new("div").attr("data-aos", "fade-up").at(760.0, 100.0));
    let below = page.add(
        El::new("img")
            .attr("loading", "lazy")
            .attr("src", "below.webp")
            .at(800.0, 100.0),
    );
    let site = Site::boot(page).unwrap();

    assert!(site.page.has_class(image, "loaded"));
    assert!(!site.page.has_class(below, "loaded"));
    assert!(!site.page.has_class(faded, "aos-animate"));
}
