//! The canonical typed message model.
//!
//! A post passes through decryption/composition and comes out as a
//! [`TypedMessage`]: a body discriminant plus a metadata side-map. The meta
//! map is immutable once a message is constructed for a render pass;
//! transformations (message processors) consume the message and produce a
//! new one rather than mutating in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::meta::{MetaMap, MetadataKey};

/// Canonical representation of a decrypted or composed post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TypedMessage {
    /// A plain text message.
    Text(TextMessage),
    /// A compound of multiple typed segments.
    Compound(CompoundMessage),
    /// A primitive kind this version does not understand.
    ///
    /// Unknown messages still carry metadata so newer composers degrade
    /// gracefully on older clients.
    Unknown(MessageBody),
}

impl TypedMessage {
    /// Create a plain text message with no metadata.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(TextMessage::new(content))
    }

    /// Create a compound message from typed segments, with no metadata.
    #[must_use]
    pub fn compound(items: impl IntoIterator<Item = TypedMessage>) -> Self {
        Self::Compound(CompoundMessage::new(items))
    }

    /// Create an unknown message with no metadata.
    #[must_use]
    pub fn unknown() -> Self {
        Self::Unknown(MessageBody::default())
    }

    /// Attach a metadata entry, consuming the message.
    ///
    /// Keys are unique per message; attaching an existing key replaces the
    /// previous payload.
    #[must_use]
    pub fn with_meta(mut self, key: MetadataKey, payload: Value) -> Self {
        self.meta_mut().insert(key, payload);
        self
    }

    /// The metadata side-map.
    #[must_use]
    pub fn meta(&self) -> &MetaMap {
        match self {
            Self::Text(m) => &m.meta,
            Self::Compound(m) => &m.meta,
            Self::Unknown(m) => &m.meta,
        }
    }

    /// Whether any metadata is attached.
    #[must_use]
    pub fn has_meta(&self) -> bool {
        !self.meta().is_empty()
    }

    /// The compound body, if this is a compound message.
    #[must_use]
    pub fn as_compound(&self) -> Option<&CompoundMessage> {
        match self {
            Self::Compound(m) => Some(m),
            _ => None,
        }
    }

    /// The text content, if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(m) => Some(&m.content),
            _ => None,
        }
    }

    fn meta_mut(&mut self) -> &mut MetaMap {
        match self {
            Self::Text(m) => &mut m.meta,
            Self::Compound(m) => &mut m.meta,
            Self::Unknown(m) => &mut m.meta,
        }
    }
}

impl From<CompoundMessage> for TypedMessage {
    fn from(message: CompoundMessage) -> Self {
        Self::Compound(message)
    }
}

/// A plain text message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    #[serde(default)]
    meta: MetaMap,
    content: String,
}

impl TextMessage {
    /// Create a text body with no metadata.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            meta: MetaMap::new(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn meta(&self) -> &MetaMap {
        &self.meta
    }
}

/// A message body carrying nothing but metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    meta: MetaMap,
}

impl MessageBody {
    #[must_use]
    pub fn meta(&self) -> &MetaMap {
        &self.meta
    }
}

/// A message composed of multiple typed segments.
///
/// This is the shape message processors operate on: a processor takes the
/// compound by value and returns a new one, leaving the original render
/// pass's view untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundMessage {
    #[serde(default)]
    meta: MetaMap,
    items: Vec<TypedMessage>,
}

impl CompoundMessage {
    /// Create a compound body from typed segments, with no metadata.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = TypedMessage>) -> Self {
        Self {
            meta: MetaMap::new(),
            items: items.into_iter().collect(),
        }
    }

    /// Attach a metadata entry, consuming the message.
    #[must_use]
    pub fn with_meta(mut self, key: MetadataKey, payload: Value) -> Self {
        self.meta.insert(key, payload);
        self
    }

    #[must_use]
    pub fn meta(&self) -> &MetaMap {
        &self.meta
    }

    /// The typed segments, in composition order.
    #[must_use]
    pub fn items(&self) -> &[TypedMessage] {
        &self.items
    }

    /// Produce a new compound with each segment replaced by `f`.
    ///
    /// Metadata on the compound itself is preserved. Recurses into nested
    /// compounds so rewrites reach every segment.
    #[must_use]
    pub fn map_items(self, f: &impl Fn(TypedMessage) -> TypedMessage) -> Self {
        let items = self
            .items
            .into_iter()
            .map(|item| match item {
                TypedMessage::Compound(inner) => TypedMessage::Compound(inner.map_items(f)),
                other => f(other),
            })
            .collect();
        Self {
            meta: self.meta,
            items,
        }
    }
}
