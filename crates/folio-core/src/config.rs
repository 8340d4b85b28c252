#![forbid(unsafe_code)]

//! Site configuration.
//!
//! [`SiteConfig`] is built once at startup and handed by reference to every
//! controller constructor. The web host passes an optional JS object; its JSON
//! form is parsed with [`SiteConfig::from_json`]. Every key is optional and
//! durations are expressed in milliseconds.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default destination for contact form messages.
pub const DEFAULT_CONTACT_ADDRESS: &str = "hadi.hennawi2005@gmail.com";

/// Default public profile link shown in the console greeting.
pub const DEFAULT_PROFILE_URL: &str = "https://github.com/hadi-hannawi1";

/// Immutable site configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    /// Length of reveal transitions declared by the stylesheet.
    #[serde(rename = "animationDurationMs", deserialize_with = "millis")]
    pub animation_duration: Duration,

    /// Height of the sticky header, subtracted from in-page scroll targets.
    pub scroll_offset: f64,

    /// Total running time of a counter animation.
    #[serde(rename = "counterDurationMs", deserialize_with = "millis")]
    pub counter_duration: Duration,

    /// Recipient of the `mailto:` link built by the contact form.
    pub contact_address: String,

    /// Profile link printed by the console greeting.
    pub profile_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            animation_duration: Duration::from_millis(600),
            scroll_offset: 80.0,
            counter_duration: Duration::from_millis(2000),
            contact_address: DEFAULT_CONTACT_ADDRESS.to_string(),
            profile_url: DEFAULT_PROFILE_URL.to_string(),
        }
    }
}

impl SiteConfig {
    /// Parse a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.scroll_offset.is_finite() {
            return Err(ConfigError::Invalid("scrollOffset must be finite"));
        }
        if self.contact_address.trim().is_empty() {
            return Err(ConfigError::Invalid("contactAddress must not be empty"));
        }
        Ok(())
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Configuration error type.
#[derive(Debug)]
pub enum ConfigError {
    /// The input was not valid JSON for [`SiteConfig`].
    Json(serde_json::Error),
    /// A field parsed but holds an unusable value.
    Invalid(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = SiteConfig::from_json("{}").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.scroll_offset, 80.0);
        assert_eq!(config.counter_duration, Duration::from_millis(2000));
    }

    #[test]
    fn camel_case_keys_override_defaults() {
        let config = SiteConfig::from_json(
            r#"{"scrollOffset": 64, "counterDurationMs": 1500, "contactAddress": "me@site.dev"}"#,
        )
        .unwrap();
        assert_eq!(config.scroll_offset, 64.0);
        assert_eq!(config.counter_duration, Duration::from_millis(1500));
        assert_eq!(config.contact_address, "me@site.dev");
        assert_eq!(config.animation_duration, Duration::from_millis(600));
    }

    #[test]
    fn blank_address_rejected() {
        let err = SiteConfig::from_json(r#"{"contactAddress": "  "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_reports_source() {
        let err = SiteConfig::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
