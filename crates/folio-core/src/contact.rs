#![forbid(unsafe_code)]

//! Contact form: field validation, submission state machine and mailto fallback.
//!
//! # State machine
//!
//! ```text
//! Idle ──submit──▶ Validating ──invalid──▶ Idle (error status)
//!                      │
//!                    valid
//!                      ▼
//!                 Submitting ──1000ms──▶ courier ──▶ Success | Failure ──▶ Idle
//! ```
//!
//! While submitting, the submit control is disabled and its label swapped for
//! a spinner. The loading state is released by a drop guard, so both the
//! success and the failure branch restore the control.
//!
//! The default [`MailtoCourier`] cannot fail: it only composes a `mailto:`
//! URI for the browser to open. The failure branch and its message are kept
//! for couriers that talk to a real backend.

use std::fmt;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{info, warn};

use crate::config::SiteConfig;
use crate::event::{Controller, Handled, PageEvent};
use crate::page::{Dom, ElementId, Page};
use crate::timer::TimerQueue;

/// Simulated latency before the courier runs.
pub const SUBMIT_DELAY: Duration = Duration::from_millis(1000);

/// How long a status message stays visible.
pub const STATUS_VISIBLE_FOR: Duration = Duration::from_millis(10_000);

pub const FORM_INVALID_MESSAGE: &str = "Please fill in all required fields correctly";
pub const SUCCESS_MESSAGE: &str =
    "Thank you! Your message has been sent successfully. I'll get back to you soon!";

/// Status text shown when delivery fails.
#[must_use]
pub fn failure_message(address: &str) -> String {
    format!("Oops! Something went wrong. Please try again or email me directly at {address}")
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Why a single field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidEmail,
}

impl FieldError {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Required => "This field is required",
            Self::InvalidEmail => "Please enter a valid email address",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot inside the
/// domain with text on both sides.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Apply the field rules in order; the first failure wins.
pub fn validate_value(required: bool, is_email: bool, value: &str) -> Result<(), FieldError> {
    let trimmed = value.trim();
    if required && trimmed.is_empty() {
        return Err(FieldError::Required);
    }
    if is_email && !trimmed.is_empty() && !is_valid_email(trimmed) {
        return Err(FieldError::InvalidEmail);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Bytes escaped in a URI component: everything except `A-Z a-z 0-9` and
/// `- _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `value` as a URI component.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Values collected from the form at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Plain-text mail body.
    #[must_use]
    pub fn body(&self) -> String {
        format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}",
            self.name, self.email, self.message
        )
    }

    /// `mailto:` URI with percent-encoded subject and body.
    #[must_use]
    pub fn mailto_uri(&self, address: &str) -> String {
        format!(
            "mailto:{address}?subject={}&body={}",
            encode_component(&self.subject),
            encode_component(&self.body())
        )
    }
}

/// What the browser must do once a message is handed off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Navigate to the given URI (for example a `mailto:` link).
    Navigate(String),
    /// The message was accepted without further browser action.
    Accepted,
}

/// Delivery error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The receiving side refused the message.
    Rejected(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "message rejected: {reason}"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Hands a validated message to whatever transports it.
pub trait Courier: fmt::Debug {
    fn deliver(&mut self, message: &ContactMessage) -> Result<Delivery, SubmitError>;
}

/// Opens the visitor's mail client with a pre-filled message.
#[derive(Debug, Clone)]
pub struct MailtoCourier {
    address: String,
}

impl MailtoCourier {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl Courier for MailtoCourier {
    fn deliver(&mut self, message: &ContactMessage) -> Result<Delivery, SubmitError> {
        Ok(Delivery::Navigate(message.mailto_uri(&self.address)))
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Missing-control error raised when a present form lacks required parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    MissingControl(&'static str),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingControl(selector) => {
                write!(f, "contact form is missing required control `{selector}`")
            }
        }
    }
}

impl std::error::Error for FormError {}

/// Visual flavor of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

impl StatusKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Where the form is in its submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy)]
struct SubmitControls {
    button: ElementId,
    label: ElementId,
    spinner: ElementId,
}

impl SubmitControls {
    fn set_loading<P: Dom + ?Sized>(&self, page: &mut P, loading: bool) {
        page.set_disabled(self.button, loading);
        let (label, spinner) = if loading {
            ("none", "inline-flex")
        } else {
            ("inline-flex", "none")
        };
        page.set_style(self.label, "display", label);
        page.set_style(self.spinner, "display", spinner);
    }
}

/// Releases the loading state when dropped.
struct LoadingGuard<'a, P: Dom> {
    page: &'a mut P,
    controls: SubmitControls,
}

impl<'a, P: Dom> LoadingGuard<'a, P> {
    /// Take over a loading state engaged at submit time.
    fn new(page: &'a mut P, controls: SubmitControls) -> Self {
        Self { page, controls }
    }

    fn page(&mut self) -> &mut P {
        &mut *self.page
    }
}

impl<P: Dom> Drop for LoadingGuard<'_, P> {
    fn drop(&mut self) {
        self.controls.set_loading(&mut *self.page, false);
    }
}

#[derive(Debug)]
enum FormTask {
    Deliver(ContactMessage),
    HideStatus,
}

/// Contact form controller.
#[derive(Debug)]
pub struct ContactForm {
    form: ElementId,
    status: ElementId,
    controls: SubmitControls,
    fields: Vec<ElementId>,
    phase: FormPhase,
    timers: TimerQueue<FormTask>,
    courier: Box<dyn Courier>,
    address: String,
}

impl ContactForm {
    /// Bind to `#contactForm`.
    ///
    /// Returns `Ok(None)` when the page has no contact form, and an error when
    /// the form is present but incomplete.
    pub fn bind<P: Page>(config: &SiteConfig, page: &mut P) -> Result<Option<Self>, FormError> {
        let Some(form) = page.element_by_id("contactForm") else {
            return Ok(None);
        };
        let status = page
            .element_by_id("formStatus")
            .ok_or(FormError::MissingControl("#formStatus"))?;
        let button = page
            .query_first_within(form, ".btn-submit")
            .ok_or(FormError::MissingControl(".btn-submit"))?;
        let label = page
            .query_first_within(button, ".btn-text")
            .ok_or(FormError::MissingControl(".btn-text"))?;
        let spinner = page
            .query_first_within(button, ".btn-loading")
            .ok_or(FormError::MissingControl(".btn-loading"))?;
        let fields = page.query_within(form, "input, textarea");
        Ok(Some(Self {
            form,
            status,
            controls: SubmitControls {
                button,
                label,
                spinner,
            },
            fields,
            phase: FormPhase::Idle,
            timers: TimerQueue::new(),
            courier: Box::new(MailtoCourier::new(config.contact_address.clone())),
            address: config.contact_address.clone(),
        }))
    }

    /// Replace the delivery mechanism.
    #[must_use]
    pub fn with_courier(mut self, courier: Box<dyn Courier>) -> Self {
        self.courier = courier;
        self
    }

    #[must_use]
    pub const fn phase(&self) -> FormPhase {
        self.phase
    }

    #[must_use]
    pub const fn form(&self) -> ElementId {
        self.form
    }

    /// Validate one field and reflect the result in its `.form-group`.
    pub fn validate_field<P: Page>(&self, field: ElementId, page: &mut P) -> bool {
        let required = page.has_attribute(field, "required");
        let is_email = page
            .attribute(field, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("email"));
        let result = validate_value(required, is_email, &page.field_value(field));

        let Some(group) = page.closest(field, ".form-group") else {
            return result.is_ok();
        };
        let slot = page.query_first_within(group, ".form-error");
        match result {
            Ok(()) => {
                page.remove_class(group, "error");
                if let Some(slot) = slot {
                    page.set_text(slot, "");
                }
                true
            }
            Err(err) => {
                page.add_class(group, "error");
                if let Some(slot) = slot {
                    page.set_text(slot, err.message());
                }
                false
            }
        }
    }

    /// Drop the error look while the visitor edits a field.
    pub fn clear_field_error<P: Page>(&self, field: ElementId, page: &mut P) {
        if let Some(group) = page.closest(field, ".form-group") {
            page.remove_class(group, "error");
        }
    }

    /// Validate every required field; all of them are visited.
    pub fn validate_form<P: Page>(&self, page: &mut P) -> bool {
        let required = page.query_within(self.form, "input[required], textarea[required]");
        required
            .into_iter()
            .fold(true, |ok, field| self.validate_field(field, page) && ok)
    }

    /// Read the named fields into a message; missing fields read as empty.
    pub fn collect<P: Page>(&self, page: &P) -> ContactMessage {
        let value = |name: &str| {
            self.fields
                .iter()
                .find(|&&f| page.attribute(f, "name").as_deref() == Some(name))
                .map(|&f| page.field_value(f))
                .unwrap_or_default()
        };
        ContactMessage {
            name: value("name"),
            email: value("email"),
            subject: value("subject"),
            message: value("message"),
        }
    }

    fn on_submit<P: Page>(&mut self, now: Duration, page: &mut P) {
        if self.phase == FormPhase::Submitting {
            warn!("submission already in flight; ignoring submit");
            return;
        }
        if !self.validate_form(page) {
            self.show_status(StatusKind::Error, FORM_INVALID_MESSAGE, now, page);
            return;
        }
        let message = self.collect(page);
        self.controls.set_loading(page, true);
        self.phase = FormPhase::Submitting;
        self.timers
            .schedule_after(now, SUBMIT_DELAY, FormTask::Deliver(message));
    }

    fn deliver<P: Page>(&mut self, message: ContactMessage, now: Duration, page: &mut P) {
        let outcome = self.courier.deliver(&message);
        let mut guard = LoadingGuard::new(page, self.controls);
        match outcome {
            Ok(delivery) => {
                if let Delivery::Navigate(uri) = &delivery {
                    guard.page().navigate(uri);
                }
                info!("contact message handed off");
                self.show_status(StatusKind::Success, SUCCESS_MESSAGE, now, guard.page());
                guard.page().reset_form(self.form);
            }
            Err(err) => {
                warn!(error = %err, "contact message delivery failed");
                let text = failure_message(&self.address);
                self.show_status(StatusKind::Error, &text, now, guard.page());
            }
        }
        drop(guard);
        self.phase = FormPhase::Idle;
    }

    fn show_status<P: Page>(&mut self, kind: StatusKind, text: &str, now: Duration, page: &mut P) {
        page.set_text(self.status, text);
        page.set_class_name(self.status, &format!("form-status {}", kind.as_str()));
        page.set_style(self.status, "display", "block");
        self.timers
            .schedule_after(now, STATUS_VISIBLE_FOR, FormTask::HideStatus);
    }
}

impl Controller for ContactForm {
    fn handle<P: Page>(
        &mut self,
        event: &PageEvent,
        now: Duration,
        _prior: Handled,
        page: &mut P,
    ) -> Handled {
        match *event {
            PageEvent::Blur { target } if self.fields.contains(&target) => {
                self.validate_field(target, page);
                Handled::NONE
            }
            PageEvent::Input { target } if self.fields.contains(&target) => {
                self.clear_field_error(target, page);
                Handled::NONE
            }
            PageEvent::Submit { form } if form == self.form => {
                self.on_submit(now, page);
                Handled::PREVENT_DEFAULT | Handled::CONSUMED
            }
            PageEvent::Unload => {
                self.timers.clear();
                Handled::NONE
            }
            _ => Handled::NONE,
        }
    }

    fn advance<P: Page>(&mut self, now: Duration, page: &mut P) {
        while let Some(task) = self.timers.pop_due(now) {
            match task {
                FormTask::Deliver(message) => self.deliver(message, now, page),
                FormTask::HideStatus => page.set_style(self.status, "display", "none"),
            }
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b@c.d.e"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn required_rule_trims_whitespace() {
        assert_eq!(validate_value(true, false, "   \t"), Err(FieldError::Required));
        assert_eq!(validate_value(true, false, "a"), Ok(()));
    }

    #[test]
    fn optional_empty_email_is_valid() {
        assert_eq!(validate_value(false, true, ""), Ok(()));
        assert_eq!(validate_value(false, true, "  "), Ok(()));
        assert_eq!(validate_value(true, true, ""), Err(FieldError::Required));
    }

    #[test]
    fn email_rule_applies_to_trimmed_value() {
        assert_eq!(validate_value(true, true, " user@example.com "), Ok(()));
        assert_eq!(
            validate_value(false, true, "user@"),
            Err(FieldError::InvalidEmail)
        );
        assert_eq!(
            validate_value(true, true, "user example.com"),
            Err(FieldError::InvalidEmail)
        );
    }

    #[test]
    fn mailto_uri_matches_uri_component_encoding() {
        let message = ContactMessage {
            name: "Jane".into(),
            email: "jane@x.com".into(),
            subject: "Hi".into(),
            message: "Hello".into(),
        };
        assert_eq!(
            message.mailto_uri("hadi.hennawi2005@gmail.com"),
            "mailto:hadi.hennawi2005@gmail.com?subject=Hi&body=Name%3A%20Jane%0AEmail%3A%20jane%40x.com%0A%0AMessage%3A%0AHello"
        );
    }

    #[test]
    fn uri_component_keeps_unreserved_marks() {
        let message = ContactMessage {
            name: "Jane (PM)".into(),
            email: "jane@x.com".into(),
            subject: "Hi! It's me*".into(),
            message: "~ok_1.".into(),
        };
        assert_eq!(
            message.mailto_uri("me@site.dev"),
            "mailto:me@site.dev?subject=Hi!%20It's%20me*&body=Name%3A%20Jane%20(PM)%0AEmail%3A%20jane%40x.com%0A%0AMessage%3A%0A~ok_1."
        );
        assert_eq!(encode_component("a&b=c?d/e#f"), "a%26b%3Dc%3Fd%2Fe%23f");
        assert_eq!(encode_component("caf\u{e9}"), "caf%C3%A9");
    }

    #[test]
    fn mailto_courier_never_fails() {
        let mut courier = MailtoCourier::new("me@site.dev");
        let delivery = courier.deliver(&ContactMessage::default()).unwrap();
        assert_eq!(
            delivery,
            Delivery::Navigate(
                "mailto:me@site.dev?subject=&body=Name%3A%20%0AEmail%3A%20%0A%0AMessage%3A%0A"
                    .into()
            )
        );
    }

    #[test]
    fn failure_text_names_the_address() {
        assert!(failure_message("me@site.dev").ends_with("email me directly at me@site.dev"));
    }
}
