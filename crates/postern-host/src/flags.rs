//! Feature flags, read once at registry-construction time.

use serde::{Deserialize, Serialize};

/// Whether this is a production or a development build of the extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildContext {
    /// Shipping build; development-only plugins are excluded.
    #[default]
    Production,
    /// Development build; diagnostics plugins are included.
    Development,
}

impl BuildContext {
    #[must_use]
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Process-wide flags deciding which optional plugins are registered.
///
/// Read once when the registry is built; changing them afterwards has no
/// effect until the extension reloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flags {
    /// Include the market-data (trader) plugin.
    pub trader_enabled: bool,
    /// Build context gating development-only plugins.
    pub build_context: BuildContext,
}

impl Flags {
    /// Read flags from the environment.
    ///
    /// `POSTERN_TRADER_ENABLED=true` enables the trader plugin;
    /// `POSTERN_BUILD_CONTEXT=development` selects the development build
    /// context. Anything else, including absence, keeps the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let trader_enabled = get("POSTERN_TRADER_ENABLED").is_some_and(|v| v == "true");
        let build_context = match get("POSTERN_BUILD_CONTEXT").as_deref() {
            Some("development") => BuildContext::Development,
            _ => BuildContext::Production,
        };
        Self {
            trader_enabled,
            build_context,
        }
    }

    /// Enable the trader plugin.
    #[must_use]
    pub fn with_trader(mut self) -> Self {
        self.trader_enabled = true;
        self
    }

    /// Select the development build context.
    #[must_use]
    pub fn with_development_build(mut self) -> Self {
        self.build_context = BuildContext::Development;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_production() {
        let flags = Flags::default();
        assert!(!flags.trader_enabled);
        assert_eq!(flags.build_context, BuildContext::Production);
        assert!(!flags.build_context.is_development());
    }

    #[test]
    fn test_builders() {
        let flags = Flags::default().with_trader().with_development_build();
        assert!(flags.trader_enabled);
        assert!(flags.build_context.is_development());
    }

    #[test]
    fn test_env_lookup_parsing() {
        let empty = Flags::from_lookup(|_| None);
        assert_eq!(empty, Flags::default());

        let enabled = Flags::from_lookup(|key| match key {
            "POSTERN_TRADER_ENABLED" => Some("true".to_string()),
            "POSTERN_BUILD_CONTEXT" => Some("development".to_string()),
            _ => None,
        });
        assert!(enabled.trader_enabled);
        assert!(enabled.build_context.is_development());

        // Anything but the exact accepted values keeps the defaults.
        let garbage = Flags::from_lookup(|_| Some("TRUE, please".to_string()));
        assert_eq!(garbage, Flags::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let flags: Flags = serde_json::from_str(r#"{"trader_enabled": true}"#).unwrap();
        assert!(flags.trader_enabled);
        assert_eq!(flags.build_context, BuildContext::Production);
    }
}
