//! Registry construction.

use tracing::info;

use postern_plugin::{PluginRegistry, PluginResult};

use crate::diagnostics;
use crate::flags::Flags;

/// Build the process-wide plugin registry from the static list plus
/// flag-gated entries.
///
/// Called once at startup. Insertion order here is the z-order every
/// pipeline dispatch observes, so it is deliberate: the static list
/// (red packet, then file service) first, optional plugins after.
///
/// # Errors
///
/// Returns the underlying [`postern_plugin::PluginError`] if any
/// registration fails. The caller treats this as fatal — a duplicate
/// identifier is a packaging defect, not a runtime condition.
pub fn build_registry(flags: &Flags) -> PluginResult<PluginRegistry> {
    let mut registry = PluginRegistry::new();

    registry.register(postern_redpacket::descriptor())?;
    registry.register(postern_fileservice::descriptor())?;
    if flags.trader_enabled {
        registry.register(postern_trader::descriptor())?;
    }
    if flags.build_context.is_development() {
        registry.register(diagnostics::descriptor())?;
    }

    info!(
        plugin_count = registry.len(),
        trader_enabled = flags.trader_enabled,
        build_context = ?flags.build_context,
        "Plugin registry constructed"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::BuildContext;

    fn registered_ids(flags: &Flags) -> Vec<String> {
        build_registry(flags)
            .unwrap()
            .iter()
            .map(|p| p.id().to_string())
            .collect()
    }

    #[test]
    fn test_default_flags_register_static_list_only() {
        assert_eq!(
            registered_ids(&Flags::default()),
            vec![
                postern_redpacket::PLUGIN_ID,
                postern_fileservice::PLUGIN_ID
            ]
        );
    }

    #[test]
    fn test_trader_flag_adds_trader() {
        assert_eq!(
            registered_ids(&Flags::default().with_trader()),
            vec![
                postern_redpacket::PLUGIN_ID,
                postern_fileservice::PLUGIN_ID,
                postern_trader::PLUGIN_ID
            ]
        );
    }

    #[test]
    fn test_development_build_adds_diagnostics() {
        let flags = Flags {
            trader_enabled: true,
            build_context: BuildContext::Development,
        };
        assert_eq!(
            registered_ids(&flags),
            vec![
                postern_redpacket::PLUGIN_ID,
                postern_fileservice::PLUGIN_ID,
                postern_trader::PLUGIN_ID,
                diagnostics::PLUGIN_ID
            ]
        );
    }

    #[test]
    fn test_duplicate_registration_is_fatal() {
        let mut registry = build_registry(&Flags::default()).unwrap();
        let err = registry.register(postern_redpacket::descriptor());
        assert!(err.is_err());
        assert_eq!(registry.len(), 2);
    }
}
