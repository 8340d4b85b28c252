//! Contact form validation and submission.

use std::time::Duration;

use folio_core::contact::{
    ContactMessage, Courier, Delivery, FORM_INVALID_MESSAGE, FormPhase, SUCCESS_MESSAGE,
    SubmitError, failure_message,
};
use folio_core::page::Dom;
use folio_core::Handled;
use folio_harness::{FormParts, Site, portfolio};
use pretty_assertions::assert_eq;

const JANE_URI: &str = "mailto:hadi.hennawi2005@gmail.com?subject=Hi&body=\
Name%3A%20Jane%0AEmail%3A%20jane%40x.com%0A%0AMessage%3A%0AHello";

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn site() -> (Site, FormParts) {
    let (page, parts) = portfolio();
    (Site::boot(page).unwrap(), parts)
}

fn fill(site: &mut Site, parts: &FormParts, name: &str, email: &str, subject: &str, message: &str) {
    site.type_into(parts.name, name);
    site.type_into(parts.email, email);
    site.type_into(parts.subject, subject);
    site.type_into(parts.message, message);
}

fn group_of(site: &mut Site, field: folio_core::ElementId) -> folio_core::ElementId {
    site.page.closest(field, ".form-group").unwrap()
}

fn error_text(site: &mut Site, field: folio_core::ElementId) -> String {
    let group = group_of(site, field);
    let slot = site.page.query_first_within(group, ".form-error").unwrap();
    site.page.text(slot)
}

#[test]
fn valid_submission_opens_mail_client() {
    let (mut site, parts) = site();
    fill(&mut site, &parts, "Jane", "jane@x.com", "Hi", "Hello");

    let handled = site.submit(parts.form);
    assert_eq!(handled, Handled::PREVENT_DEFAULT | Handled::CONSUMED);
    assert!(site.page.is_disabled(parts.button));
    assert_eq!(site.page.style(parts.label, "display"), "none");
    assert_eq!(site.page.style(parts.spinner, "display"), "inline-flex");
    assert_eq!(site.app.contact().unwrap().phase(), FormPhase::Submitting);
    assert!(site.page.navigations.is_empty());

    site.advance_by(ms(1000));
    assert_eq!(site.page.navigations, vec![JANE_URI.to_string()]);
    assert_eq!(site.page.text(parts.status), SUCCESS_MESSAGE);
    assert_eq!(
        site.page.attribute(parts.status, "class").as_deref(),
        Some("form-status success")
    );
    assert_eq!(site.page.style(parts.status, "display"), "block");
    for field in [parts.name, parts.email, parts.subject, parts.message] {
        assert_eq!(site.page.field_value(field), "");
    }
    assert!(!site.page.is_disabled(parts.button));
    assert_eq!(site.page.style(parts.label, "display"), "inline-flex");
    assert_eq!(site.page.style(parts.spinner, "display"), "none");
    assert_eq!(site.app.contact().unwrap().phase(), FormPhase::Idle);

    site.advance_by(ms(9_999));
    assert_eq!(site.page.style(parts.status, "display"), "block");
    site.advance_by(ms(1));
    assert_eq!(site.page.style(parts.status, "display"), "none");
}

#[test]
fn empty_submission_flags_every_required_field() {
    let (mut site, parts) = site();
    let handled = site.submit(parts.form);
    assert!(handled.prevents_default());

    for field in [parts.name, parts.email, parts.message] {
        let group = group_of(&mut site, field);
        assert!(site.page.has_class(group, "error"));
        assert_eq!(error_text(&mut site, field), "This field is required");
    }
    let subject_group = group_of(&mut site, parts.subject);
    assert!(!site.page.has_class(subject_group, "error"));

    assert_eq!(site.page.text(parts.status), FORM_INVALID_MESSAGE);
    assert_eq!(
        site.page.attribute(parts.status, "class").as_deref(),
        Some("form-status error")
    );
    assert!(!site.page.is_disabled(parts.button));

    site.advance_by(ms(5_000));
    assert!(site.page.navigations.is_empty());
}

#[test]
fn blur_validates_and_input_clears() {
    let (mut site, parts) = site();
    site.type_into(parts.email, "not-an-email");
    site.blur(parts.email);
    let group = group_of(&mut site, parts.email);
    assert!(site.page.has_class(group, "error"));
    assert_eq!(
        error_text(&mut site, parts.email),
        "Please enter a valid email address"
    );

    site.type_into(parts.email, "not-an-email@");
    assert!(!site.page.has_class(group, "error"));

    site.type_into(parts.email, "  jane@x.com ");
    site.blur(parts.email);
    assert!(!site.page.has_class(group, "error"));
    assert_eq!(error_text(&mut site, parts.email), "");
}

#[test]
fn optional_field_accepts_empty() {
    let (mut site, parts) = site();
    site.blur(parts.subject);
    let group = group_of(&mut site, parts.subject);
    assert!(!site.page.has_class(group, "error"));
}

#[test]
fn second_submit_while_sending_is_swallowed() {
    let (mut site, parts) = site();
    fill(&mut site, &parts, "Jane", "jane@x.com", "Hi", "Hello");
    site.submit(parts.form);
    site.advance_by(ms(500));
    let handled = site.submit(parts.form);
    assert!(handled.prevents_default());

    site.advance_by(ms(2_000));
    assert_eq!(site.page.navigations.len(), 1);
}

#[derive(Debug)]
struct Offline;

impl Courier for Offline {
    fn deliver(&mut self, _message: &ContactMessage) -> Result<Delivery, SubmitError> {
        Err(SubmitError::Rejected("offline".into()))
    }
}

#[test]
fn failed_delivery_restores_the_button() {
    let (mut site, parts) = site();
    site.app.set_courier(Box::new(Offline));
    fill(&mut site, &parts, "Jane", "jane@x.com", "", "Hello");
    site.submit(parts.form);
    site.advance_by(ms(1000));

    assert!(site.page.navigations.is_empty());
    assert_eq!(
        site.page.text(parts.status),
        failure_message("hadi.hennawi2005@gmail.com")
    );
    assert_eq!(
        site.page.attribute(parts.status, "class").as_deref(),
        Some("form-status error")
    );
    assert!(!site.page.is_disabled(parts.button));
    assert_eq!(site.page.field_value(parts.name), "Jane");
    assert_eq!(site.app.contact().unwrap().phase(), FormPhase::Idle);
}
