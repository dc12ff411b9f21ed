//! Diagnostics plugin, registered only in development builds.
//!
//! Shows a page banner confirming the development build and mounts a
//! per-post overlay through the raw-injection path, which keeps that path
//! exercised outside the test suite.

use tracing::debug;

use postern_plugin::{Fragment, InjectFunction, PluginDescriptor, PluginId};

/// Stable identifier of the diagnostics plugin.
pub const PLUGIN_ID: &str = "com.postern.diagnostics";

/// Display name, used as the widget wrapper title.
pub const PLUGIN_NAME: &str = "Diagnostics";

/// Build the diagnostics plugin descriptor.
#[must_use]
pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(PluginId::from_static(PLUGIN_ID), PLUGIN_NAME)
        .with_page_inspector(|| Some(Fragment::new(PLUGIN_NAME, "Development build")))
        .with_post_inspector(InjectFunction::raw(|ctx, (), claim| {
            debug!(mount_id = %claim.mount_id(), %ctx, "Diagnostics overlay mounted");
            let mount_id = claim.mount_id().to_string();
            Box::new(move || {
                debug!(mount_id = %mount_id, "Diagnostics overlay removed");
            })
        }))
}
