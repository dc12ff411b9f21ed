//! Market-data plugin, registered only when the trader feature flag is on.
//!
//! Contributes two capabilities: a message processor that recognizes
//! cashtags (`$BTC`) in text segments and records them as trending
//! metadata before any inspector runs, and a page inspector showing the
//! market widget. Actual market data comes from a collaborator the UI
//! layer consumes; none of that lives here.

use serde::{Deserialize, Serialize};
use serde_json::json;

use postern_message::{CompoundMessage, MetadataKey, MetadataReader, TypedMessage};
use postern_plugin::{Fragment, PluginDescriptor, PluginId};

/// Stable identifier of the trader plugin.
pub const PLUGIN_ID: &str = "com.postern.trader";

/// Display name, used as the widget wrapper title.
pub const PLUGIN_NAME: &str = "Trader";

/// Metadata kind the processor attaches recognized cashtags under.
pub const METADATA_KEY: &str = "com.postern.trader:1";

/// Cashtags recognized in a message, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingPayload {
    /// Ticker symbols, without the `$` sigil.
    pub symbols: Vec<String>,
}

/// Validated metadata key for trending payloads.
#[must_use]
pub fn metadata_key() -> MetadataKey {
    MetadataKey::from_static(METADATA_KEY)
}

/// The sanctioned reader for trending metadata.
#[must_use]
pub fn metadata_reader() -> MetadataReader<TrendingPayload> {
    MetadataReader::new(metadata_key()).with_validator(|payload| !payload.symbols.is_empty())
}

/// Build the trader plugin descriptor.
#[must_use]
pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(PluginId::from_static(PLUGIN_ID), PLUGIN_NAME)
        .with_message_processor(tag_cashtags)
        .with_page_inspector(|| Some(Fragment::new(PLUGIN_NAME, "Market trends")))
}

/// Record the cashtags found in a compound message's text segments.
///
/// Pure: the same input always yields the same output, and a message
/// without cashtags passes through untouched, so the pipeline may apply
/// it for preview and final render alike.
#[must_use]
pub fn tag_cashtags(message: CompoundMessage) -> CompoundMessage {
    let mut symbols: Vec<String> = Vec::new();
    collect_cashtags(message.items(), &mut symbols);
    if symbols.is_empty() {
        return message;
    }
    message.with_meta(metadata_key(), json!(TrendingPayload { symbols }))
}

fn collect_cashtags(items: &[TypedMessage], symbols: &mut Vec<String>) {
    for item in items {
        match item {
            TypedMessage::Text(text) => {
                for word in text.content().split_whitespace() {
                    if let Some(symbol) = parse_cashtag(word)
                        && !symbols.iter().any(|s| s == &symbol)
                    {
                        symbols.push(symbol);
                    }
                }
            },
            TypedMessage::Compound(inner) => collect_cashtags(inner.items(), symbols),
            TypedMessage::Unknown(_) => {},
        }
    }
}

/// A cashtag is `$` followed by one to six uppercase ASCII letters,
/// optionally trailed by punctuation.
fn parse_cashtag(word: &str) -> Option<String> {
    let rest = word.strip_prefix('$')?;
    let symbol: String = rest
        .chars()
        .take_while(|c| c.is_ascii_uppercase())
        .collect();
    if symbol.is_empty() || symbol.len() > 6 {
        return None;
    }
    // Reject `$BTCprice` but allow `$BTC,` and `$BTC.`
    let trailing = &rest[symbol.len()..];
    if trailing.chars().any(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(symbol)
}
