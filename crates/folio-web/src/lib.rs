#![forbid(unsafe_code)]

//! WASM frontend for Folio.
//!
//! Exposes a small `wasm-bindgen` API to the page script:
//! - `boot(options?)` binds every controller to the live document and wires
//!   browser listeners, timers, animation frames and idle callbacks,
//! - `scheduleRead(fn)` / `scheduleWrite(fn)` batch layout reads before DOM
//!   writes in the next animation frame,
//! - `optimizedRAF(fn)` runs `fn` on the next frame at no more than 60 fps.
//!
//! All behavior lives in `folio-core`; this crate only translates between the
//! browser and the page traits.

#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{Folio, boot, optimized_raf, schedule_read, schedule_write};

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct Folio;

#[cfg(not(target_arch = "wasm32"))]
impl Folio {
    /// Parse boot options the way the browser entry point does.
    pub fn parse_options(json: &str) -> Result<folio_core::SiteConfig, folio_core::BootError> {
        Ok(folio_core::SiteConfig::from_json(json)?)
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn options_use_camel_case() {
        let config = Folio::parse_options(r#"{"counterDurationMs": 500}"#).unwrap();
        assert_eq!(config.counter_duration, std::time::Duration::from_millis(500));
    }

    /// The wasm-only modules compile only when every web-sys type they touch
    /// is enabled; native builds never see those modules.
    #[test]
    fn web_sys_features_cover_dom_bindings() {
        let manifest = include_str!("../Cargo.toml");
        for feature in [
            "AddEventListenerOptions",
            "CssStyleDeclaration",
            "CustomEvent",
            "Document",
            "DomRect",
            "DomTokenList",
            "Element",
            "FontFaceSet",
            "HtmlButtonElement",
            "HtmlFormElement",
            "HtmlHeadElement",
            "HtmlInputElement",
            "HtmlTextAreaElement",
            "IdleRequestOptions",
            "Location",
            "MediaQueryList",
            "NodeList",
            "Performance",
            "ScrollToOptions",
        ] {
            assert!(
                manifest.contains(&format!("\"{feature}\"")),
                "web-sys feature {feature} is not enabled"
            );
        }
    }

    #[test]
    fn bad_options_are_boot_errors() {
        assert!(Folio::parse_options(r#"{"scrollOffset": "far"}"#).is_err());
    }
}
