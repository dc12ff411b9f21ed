//! The red packet plugin descriptor.

use postern_plugin::{Fragment, InjectFunction, PluginDescriptor, PluginId};

use crate::payload::{RedPacketPayload, metadata_key, metadata_reader};

/// Stable identifier of the red packet plugin.
pub const PLUGIN_ID: &str = "com.postern.redpacket";

/// Display name, used as the widget wrapper title.
pub const PLUGIN_NAME: &str = "Red Packet";

/// Build the red packet plugin descriptor.
///
/// The decryption inspector applies only to messages carrying valid red
/// packet metadata; everything else renders nothing. The badge gives the
/// post dialog a short description of an attached packet.
#[must_use]
pub fn descriptor() -> PluginDescriptor {
    let reader = metadata_reader();
    PluginDescriptor::new(PluginId::from_static(PLUGIN_ID), PLUGIN_NAME)
        .with_success_decryption_inspector(InjectFunction::component(move |ctx, message| {
            let payload = reader.read(message)?;
            let mut body = widget_body(&payload);
            if let Some(permalink) = ctx.permalink() {
                body.push_str(" · from ");
                body.push_str(permalink);
            }
            Some(Fragment::new(PLUGIN_NAME, body))
        }))
        .with_metadata_badge(metadata_key(), |raw| {
            let payload: RedPacketPayload = serde_json::from_value(raw.clone()).ok()?;
            Some(badge_label(&payload))
        })
}

fn widget_body(payload: &RedPacketPayload) -> String {
    match &payload.total {
        Some(total) => format!("Red packet {} ({}) worth {total}", payload.id, payload.status),
        None => format!("Red packet {} ({})", payload.id, payload.status),
    }
}

fn badge_label(payload: &RedPacketPayload) -> String {
    match &payload.sender_name {
        Some(sender) => format!("A red packet from {sender}"),
        None => "A red packet".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use postern_message::TypedMessage;
    use postern_plugin::{PluginRegistry, PostContext, RenderPipeline, VirtualMounts};

    fn pipeline() -> RenderPipeline {
        let mut registry = PluginRegistry::new();
        registry.register(descriptor()).unwrap();
        RenderPipeline::new(Arc::new(registry))
    }

    #[test]
    fn test_inspector_renders_valid_packet() {
        let message = TypedMessage::text("post").with_meta(
            metadata_key(),
            json!({"id": "rp-1", "status": "normal", "total": "1 ETH"}),
        );
        let ctx = PostContext::new("p-1").with_permalink("https://example.com/p/1");

        let rendering = pipeline().inspect_decrypted(&ctx, &message, &mut VirtualMounts::new());
        assert_eq!(rendering.len(), 1);
        let fragment = rendering.outcomes()[0].fragment().unwrap();
        assert_eq!(fragment.title(), PLUGIN_NAME);
        assert!(fragment.body().contains("rp-1"));
        assert!(fragment.body().contains("1 ETH"));
        assert!(fragment.body().contains("https://example.com/p/1"));
    }

    #[test]
    fn test_inspector_skips_message_without_packet() {
        let message = TypedMessage::text("just words");
        let rendering = pipeline().inspect_decrypted(
            &PostContext::new("p-1"),
            &message,
            &mut VirtualMounts::new(),
        );
        assert!(rendering.is_empty());
    }

    #[test]
    fn test_badge_labels() {
        let with_sender = TypedMessage::text("post").with_meta(
            metadata_key(),
            json!({"id": "rp-1", "status": "normal", "sender_name": "alice"}),
        );
        let rows = pipeline().badge_rows(&with_sender);
        assert_eq!(rows[0].label, "A red packet from alice");

        let anonymous = TypedMessage::text("post")
            .with_meta(metadata_key(), json!({"id": "rp-2", "status": "incoming"}));
        assert_eq!(pipeline().badge_rows(&anonymous)[0].label, "A red packet");
    }

    #[test]
    fn test_badge_tolerates_malformed_payload() {
        let malformed = TypedMessage::text("post")
            .with_meta(metadata_key(), json!({"status": "not a packet"}));
        let rows = pipeline().badge_rows(&malformed);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, postern_plugin::UNRECOGNIZED_METADATA_LABEL);
    }
}
