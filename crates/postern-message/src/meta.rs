//! Metadata side-map and typed codec.
//!
//! Metadata payloads travel as raw JSON values attached to a message under
//! namespaced keys (e.g. `com.plugin.redpacket:1`). The composer of a
//! message is an untrusted remote party, so the payload shape is validated
//! structurally at every read; a missing or malformed payload is the benign
//! "does not apply" case, never an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{MessageError, MessageResult};
use crate::message::TypedMessage;

/// Metadata side-map: unique namespaced keys to plugin-defined payloads.
///
/// Iteration order is key order; insertion order carries no meaning.
pub type MetaMap = BTreeMap<MetadataKey, Value>;

/// Namespaced string key identifying the semantic type of a metadata payload.
///
/// Keys follow the `com.author.plugin:version` convention. Validation only
/// requires a namespace dot and a conservative character set; the key is
/// otherwise opaque to everything except the plugin that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MetadataKey(String);

impl<'de> serde::Deserialize<'de> for MetadataKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl MetadataKey {
    /// Create a validated metadata key.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if the key is empty, has no
    /// namespace dot, or contains characters outside `[A-Za-z0-9._:-]`.
    pub fn new(key: impl Into<String>) -> MessageResult<Self> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self(key))
    }

    /// Wrap a known-good literal without validation.
    #[must_use]
    pub fn from_static(key: &str) -> Self {
        Self(key.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(key: &str) -> MessageResult<()> {
        if key.is_empty() {
            return Err(MessageError::InvalidKey(
                "metadata key must not be empty".into(),
            ));
        }
        if !key.contains('.') {
            return Err(MessageError::InvalidKey(format!(
                "metadata key must be namespaced with a dot, got: {key}"
            )));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-'))
        {
            return Err(MessageError::InvalidKey(format!(
                "metadata key contains invalid characters: {key}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MetadataKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Typed, validating accessor for one metadata kind.
///
/// Bundles the key with a structural validator. [`MetadataReader::read`] is
/// the sole sanctioned way plugins read metadata: it returns the payload
/// only if it is present, deserializes into `T`, and passes the validator.
/// It never errors and never panics — foreign or malformed metadata simply
/// reads as `None`.
pub struct MetadataReader<T> {
    key: MetadataKey,
    validate: fn(&T) -> bool,
}

fn accept_any<T>(_: &T) -> bool {
    true
}

impl<T> MetadataReader<T> {
    /// Create a reader that only checks the payload deserializes into `T`.
    #[must_use]
    pub fn new(key: MetadataKey) -> Self {
        Self {
            key,
            validate: accept_any,
        }
    }

    /// Add a structural validator run after deserialization.
    #[must_use]
    pub fn with_validator(mut self, validate: fn(&T) -> bool) -> Self {
        self.validate = validate;
        self
    }

    /// The metadata key this reader accesses.
    #[must_use]
    pub fn key(&self) -> &MetadataKey {
        &self.key
    }
}

impl<T: DeserializeOwned> MetadataReader<T> {
    /// Read and validate this reader's payload from a message.
    ///
    /// Pure lookup, no side effects. Returns `None` when the key is absent,
    /// the payload does not deserialize into `T`, or the validator rejects
    /// it.
    #[must_use]
    pub fn read(&self, message: &TypedMessage) -> Option<T> {
        self.read_map(message.meta())
    }

    /// Read and validate this reader's payload from a bare meta map.
    #[must_use]
    pub fn read_map(&self, meta: &MetaMap) -> Option<T> {
        let Some(raw) = meta.get(&self.key) else {
            trace!(key = %self.key, "Metadata key absent");
            return None;
        };
        let payload: T = match serde_json::from_value(raw.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(key = %self.key, error = %e, "Metadata payload failed structural validation");
                return None;
            },
        };
        if !(self.validate)(&payload) {
            debug!(key = %self.key, "Metadata payload rejected by validator");
            return None;
        }
        Some(payload)
    }
}

impl<T> Clone for MetadataReader<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            validate: self.validate,
        }
    }
}

impl<T> fmt::Debug for MetadataReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataReader")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Payload {
        id: String,
        amount: u64,
    }

    fn reader() -> MetadataReader<Payload> {
        MetadataReader::new(MetadataKey::from_static("com.example.pay:1"))
    }

    #[test]
    fn test_key_validation() {
        assert!(MetadataKey::new("com.plugin.redpacket:1").is_ok());
        assert!(MetadataKey::new("com.example.file-service:2").is_ok());
        assert!(MetadataKey::new("").is_err());
        assert!(MetadataKey::new("nonamespace").is_err());
        assert!(MetadataKey::new("com.example with spaces").is_err());
    }

    #[test]
    fn test_key_display() {
        let key = MetadataKey::new("com.plugin.redpacket:1").unwrap();
        assert_eq!(key.to_string(), "com.plugin.redpacket:1");
        assert_eq!(key.as_str(), "com.plugin.redpacket:1");
    }

    #[test]
    fn test_key_deserialize_rejects_invalid() {
        assert!(serde_json::from_value::<MetadataKey>(json!("com.ok.key:1")).is_ok());
        assert!(serde_json::from_value::<MetadataKey>(json!("bad key")).is_err());
    }

    #[test]
    fn test_read_present_and_valid() {
        let message = TypedMessage::text("hi").with_meta(
            MetadataKey::from_static("com.example.pay:1"),
            json!({"id": "p-1", "amount": 5}),
        );
        let payload = reader().read(&message);
        assert_eq!(
            payload,
            Some(Payload {
                id: "p-1".to_string(),
                amount: 5
            })
        );
    }

    #[test]
    fn test_read_absent_key() {
        let message = TypedMessage::text("hi");
        assert_eq!(reader().read(&message), None);
    }

    #[test]
    fn test_read_malformed_payload() {
        let message = TypedMessage::text("hi").with_meta(
            MetadataKey::from_static("com.example.pay:1"),
            json!({"id": 42, "amount": "not a number"}),
        );
        assert_eq!(reader().read(&message), None);
    }

    #[test]
    fn test_read_rejected_by_validator() {
        let message = TypedMessage::text("hi").with_meta(
            MetadataKey::from_static("com.example.pay:1"),
            json!({"id": "", "amount": 5}),
        );
        let reader = reader().with_validator(|p| !p.id.is_empty());
        assert_eq!(reader.read(&message), None);
    }

    #[test]
    fn test_read_foreign_metadata_ignored() {
        let message = TypedMessage::text("hi").with_meta(
            MetadataKey::from_static("com.other.plugin:1"),
            json!({"anything": true}),
        );
        assert_eq!(reader().read(&message), None);
    }
}
