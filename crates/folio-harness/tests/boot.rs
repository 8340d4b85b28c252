//! Bootstrap, startup errors and page-level diagnostics.

use std::error::Error;
use std::time::Duration;

use folio_core::contact::FormError;
use folio_core::{BootError, PageEvent, SiteConfig};
use folio_harness::{El, FakePage, FormOmissions, Site, capture_logs, portfolio, portfolio_with};
use pretty_assertions::assert_eq;
use tracing::Level;

#[test]
fn boot_logs_lifecycle() {
    let (page, _) = portfolio();
    let (site, events) = capture_logs(|| Site::boot(page));
    let site = site.unwrap();
    assert!(site.app.contact().is_some());

    let infos: Vec<&str> = events
        .iter()
        .filter(|e| e.level == Level::INFO)
        .map(|e| e.message.as_str())
        .collect();
    assert_eq!(infos.first(), Some(&"initializing portfolio"));
    assert_eq!(infos.last(), Some(&"portfolio initialized"));
    let done = events
        .iter()
        .find(|e| e.message == "portfolio initialized")
        .unwrap();
    assert_eq!(done.field("contact_form"), Some("true"));
}

#[test]
fn page_without_form_boots() {
    let (page, parts) = portfolio_with(None);
    assert!(parts.is_none());
    let site = Site::boot(page).unwrap();
    assert!(site.app.contact().is_none());
}

#[test]
fn empty_page_boots() {
    let site = Site::boot(FakePage::default()).unwrap();
    assert!(site.app.counters().targets().is_empty());
    assert_eq!(site.app.next_deadline(), None);
}

#[test]
fn incomplete_form_is_a_boot_error() {
    let (page, _) = portfolio_with(Some(FormOmissions {
        spinner: true,
        ..FormOmissions::default()
    }));
    let err = Site::boot(page).unwrap_err();
    assert!(matches!(
        err,
        BootError::Form(FormError::MissingControl(".btn-loading"))
    ));
    assert_eq!(
        err.to_string(),
        "contact form unusable: contact form is missing required control `.btn-loading`"
    );
    assert!(err.source().is_some());
}

#[test]
fn missing_status_is_a_boot_error() {
    let (page, _) = portfolio_with(Some(FormOmissions {
        status: true,
        ..FormOmissions::default()
    }));
    assert!(matches!(
        Site::boot(page),
        Err(BootError::Form(FormError::MissingControl("#formStatus")))
    ));
}

#[test]
fn bad_options_convert_to_boot_error() {
    let err: BootError = SiteConfig::from_json(r#"{"scrollOffset": "far"}"#)
        .unwrap_err()
        .into();
    assert!(matches!(err, BootError::Config(_)));
    assert!(err.to_string().starts_with("invalid site options:"));
}

#[test]
fn slow_load_is_warned() {
    let (page, _) = portfolio();
    let mut site = Site::boot(page).unwrap();
    let (_, events) = capture_logs(|| {
        site.dispatch(PageEvent::Load {
            elapsed: Some(Duration::from_millis(3_500)),
        })
    });
    assert!(events.iter().any(|e| e.level == Level::WARN));
    let loaded = events.iter().find(|e| e.message == "page loaded").unwrap();
    assert_eq!(loaded.field("load_time_ms"), Some("3500"));
    assert_eq!(
        site.app.load_report().load_time(),
        Some(Duration::from_millis(3_500))
    );
}

#[test]
fn fast_load_is_not_warned() {
    let (page, _) = portfolio();
    let mut site = Site::boot(page).unwrap();
    let (_, events) = capture_logs(|| {
        site.dispatch(PageEvent::Load {
            elapsed: Some(Duration::from_millis(1_200)),
        })
    });
    assert!(events.iter().all(|e| e.level != Level::WARN));
    assert!(events.iter().any(|e| e.message == "page loaded"));
}

#[test]
fn project_link_clicks_are_logged() {
    let (mut page, _) = portfolio();
    let link = {
        use folio_core::page::Dom;
        page.query_all("a[href^=\"https\"]")[0]
    };
    let mut site = Site::boot(page).unwrap();
    let (handled, events) = capture_logs(|| site.click(link));
    assert!(!handled.prevents_default());
    let clicked = events
        .iter()
        .find(|e| e.message == "project link clicked")
        .unwrap();
    assert_eq!(clicked.field("project"), Some("Rope Editor"));
}

#[test]
fn wrapped_project_link_clicks_are_logged() {
    let mut page = FakePage::default();
    let card = page.add(El::new("div").class("project-card").at(100.0, 300.0));
    page.append(card, El::new("h3").class("project-title").text("Tile Cache"));
    let wrapper = page.append(card, El::new("div").class("project-link"));
    let anchor = page.append(
        wrapper,
        El::new("a").attr("href", "https://example.com/tiles"),
    );
    let icon = page.append(anchor, El::new("span").class("icon"));
    let mut site = Site::boot(page).unwrap();

    for target in [icon, anchor, wrapper] {
        let (_, events) = capture_logs(|| site.click(target));
        let clicked = events
            .iter()
            .find(|e| e.message == "project link clicked")
            .unwrap();
        assert_eq!(clicked.field("project"), Some("Tile Cache"));
    }

    let (_, events) = capture_logs(|| site.click(card));
    assert!(events.iter().all(|e| e.message != "project link clicked"));
}

#[test]
fn greeting_names_contact_details() {
    let (page, _) = portfolio();
    let config = SiteConfig::from_json(r#"{"contactAddress": "me@example.org"}"#).unwrap();
    let site = Site::boot_with(config, page).unwrap();
    let lines = site.app.greeting();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[2].text, "\u{1f4e7} me@example.org");
    assert_eq!(lines[3].text, "\u{1f517} https://github.com/hadi-hannawi1");
}

#[test]
fn unload_drops_pending_work() {
    let (page, _) = portfolio();
    let mut site = Site::boot(page).unwrap();
    site.scroll(400.0);
    site.dispatch(PageEvent::Resize);
    assert!(site.app.next_deadline().is_some());
    site.dispatch(PageEvent::Unload);
    // Navigation and scroll-to-top debounces survive; they only touch classes.
    site.advance_by(Duration::from_secs(5));
    assert!(site.page.custom_events.is_empty());
    assert_eq!(site.app.next_deadline(), None);
}
