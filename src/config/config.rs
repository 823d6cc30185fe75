//! # Application Configuration
//!
//! [`AppConfig`] gathers everything the library needs at runtime. Values come
//! from defaults, then the environment, then command-line flags, and are
//! checked once with [`AppConfig::validate`] before an [`AppContext`] is built.
//!
//! ## Environment
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `VISION_API_URL` | `api_base_url` | `http://localhost:2020/v1` |
//! | `VISION_API_KEY` | `api_key` | none |
//! | `VISION_API_KEY_HEADER` | `api_key_header` | `X-API-Key` |
//! | `VISION_TIMEOUT_SECS` | `timeout_secs` | `30` |
//! | `VISION_CACHE_DIR` | `cache_dir` | `<tmp>/vision_overlay/cutouts` |
//! | `VISION_LANG` | `language` | `en` |
//!
//! ```rust
//! use vision_overlay::config::{AppConfig, AppContext};
//!
//! let config = AppConfig {
//!     timeout_secs: 10,
//!     ..AppConfig::default()
//! };
//! let ctx = AppContext::new(config).unwrap();
//! assert_eq!(ctx.config().timeout_secs, 10);
//! ```

use std::{path::PathBuf, time::Duration};

use crate::client::ClientConfig;
use crate::error::{VisionError, VisionResult};
use crate::i18n::{translate, Language, MessageKey};

pub const DEFAULT_API_URL: &str = "http://localhost:2020/v1";
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the vision service, without a trailing endpoint.
    pub api_base_url: String,
    /// Sent in `api_key_header` when present.
    pub api_key: Option<String>,
    pub api_key_header: String,
    /// Per-request timeout. Must be 1..=600.
    pub timeout_secs: u64,
    /// Directory cutouts are written to.
    pub cache_dir: PathBuf,
    pub language: Language,
    /// Edge length of point markers in container pixels.
    pub marker_size: f64,
    /// Container the overlays are laid out in, in pixels.
    pub container_width: u32,
    pub container_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_dir: std::env::temp_dir().join("vision_overlay").join("cutouts"),
            language: Language::En,
            marker_size: 16.0,
            container_width: 1024,
            container_height: 768,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> VisionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> VisionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("VISION_API_URL") {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(key) = get("VISION_API_KEY") {
            config.api_key = Some(key.trim().to_string());
        }
        if let Some(header) = get("VISION_API_KEY_HEADER") {
            config.api_key_header = header.trim().to_string();
        }
        if let Some(raw) = get("VISION_TIMEOUT_SECS") {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                VisionError::config("VISION_TIMEOUT_SECS", &raw, "must be a whole number of seconds")
            })?;
        }
        if let Some(dir) = get("VISION_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get("VISION_LANG") {
            config.language = raw
                .parse()
                .map_err(|reason: String| VisionError::config("VISION_LANG", &raw, reason))?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> VisionResult<()> {
        let url = self.api_base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(VisionError::config(
                "api_base_url",
                url,
                "must start with http:// or https://",
            ));
        }
        if self.api_key_header.is_empty()
            || !self
                .api_key_header
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(VisionError::config(
                "api_key_header",
                &self.api_key_header,
                "must be a non-empty HTTP header name",
            ));
        }
        if let Some(key) = &self.api_key {
            if key.is_empty() {
                return Err(VisionError::config("api_key", "", "must not be empty when set"));
            }
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(VisionError::config(
                "timeout_secs",
                self.timeout_secs.to_string(),
                format!("must be between 1 and {MAX_TIMEOUT_SECS}"),
            ));
        }
        if !(self.marker_size.is_finite() && self.marker_size > 0.0) {
            return Err(VisionError::config(
                "marker_size",
                self.marker_size.to_string(),
                "must be a positive number",
            ));
        }
        if self.container_width == 0 || self.container_height == 0 {
            return Err(VisionError::config(
                "container",
                format!("{}x{}", self.container_width, self.container_height),
                "must have a positive width and height",
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            api_key: self.api_key.clone(),
            api_key_header: self.api_key_header.clone(),
            timeout: self.timeout(),
        }
    }
}

/// Validated configuration, passed by reference to whatever needs it.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: AppConfig,
}

impl AppContext {
    pub fn new(config: AppConfig) -> VisionResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.config.language
    }

    /// Resolve a message in the configured language.
    pub fn message(&self, key: MessageKey) -> &'static str {
        translate(self.config.language, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.api_key_header, "X-API-Key");
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("VISION_API_URL", "https://vision.example.com/v1"),
            ("VISION_API_KEY", " secret "),
            ("VISION_TIMEOUT_SECS", "12"),
            ("VISION_LANG", "es"),
            ("VISION_CACHE_DIR", "/var/cache/cutouts"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://vision.example.com/v1");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout(), Duration::from_secs(12));
        assert_eq!(config.language, Language::Es);
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/cutouts"));
    }

    #[test]
    fn test_blank_variables_are_ignored() {
        let config = AppConfig::from_lookup(lookup(&[("VISION_API_KEY", "  ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_bad_environment_values_name_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[("VISION_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, VisionError::Config { ref field, .. } if field == "VISION_TIMEOUT_SECS"));

        let err = AppConfig::from_lookup(lookup(&[("VISION_LANG", "klingon")])).unwrap_err();
        assert!(matches!(err, VisionError::Config { ref field, .. } if field == "VISION_LANG"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api_base_url = "localhost:2020".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api_key_header = "X API Key".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.marker_size = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.container_height = 0;
        assert!(AppContext::new(config).is_err());
    }

    #[test]
    fn test_context_translates_in_configured_language() {
        let config = AppConfig {
            language: Language::Es,
            ..AppConfig::default()
        };
        let ctx = AppContext::new(config).unwrap();
        assert_eq!(ctx.message(MessageKey::CutoutSaved), "Recorte guardado.");
    }
}
