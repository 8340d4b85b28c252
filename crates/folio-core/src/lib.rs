#![forbid(unsafe_code)]

//! Core: host-independent controllers for the Folio portfolio site.
//!
//! Every controller is a plain state object. The embedding host pushes
//! [`event::PageEvent`] values together with the current monotonic time and
//! the controllers act on the page through the capability traits in
//! [`page`]. Nothing in this crate reads a wall clock, spawns a thread, or
//! touches a real DOM, so the whole behavior is deterministic and testable
//! against an in-memory page.
//!
//! # Role in Folio
//! `folio-web` implements the page traits on top of `web-sys` and wires browser
//! listeners to [`app::App`]. `folio-harness` implements the same traits in
//! memory for integration tests.

pub mod app;
pub mod config;
pub mod contact;
pub mod debounce;
pub mod event;
pub mod extras;
pub mod geometry;
pub mod navigation;
pub mod page;
pub mod perf;
pub mod reveal;
pub mod scroll_top;
pub mod timer;

pub use app::{App, BootError};
pub use config::SiteConfig;
pub use event::{Controller, Handled, PageEvent};
pub use page::{Browser, Dom, ElementId, LayoutQuery, Page, ScrollBehavior};
