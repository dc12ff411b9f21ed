//! Red packet metadata payload and its validating reader.

use std::fmt;

use serde::{Deserialize, Serialize};

use postern_message::{MetadataKey, MetadataReader};

/// Metadata kind under which composers attach red packets to a message.
pub const METADATA_KEY: &str = "com.plugin.redpacket:1";

/// Identifier of the rewardable object referenced by the metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedPacketId(String);

impl RedPacketId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RedPacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a red packet, as asserted by its composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedPacketStatus {
    /// Just arrived, not yet looked at.
    Incoming,
    /// Open and claimable.
    Normal,
    /// Already claimed by this user.
    Claimed,
    /// Past its expiry.
    Expired,
    /// Refunded to the sender.
    Refunded,
    /// All shares taken.
    Empty,
}

impl RedPacketStatus {
    /// Whether triggering the widget should start the claim flow. Every
    /// other status routes to the details screen instead.
    #[must_use]
    pub fn is_claimable(self) -> bool {
        matches!(self, Self::Incoming | Self::Normal)
    }
}

impl fmt::Display for RedPacketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Incoming => "incoming",
            Self::Normal => "normal",
            Self::Claimed => "claimed",
            Self::Expired => "expired",
            Self::Refunded => "refunded",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// The plugin-defined payload stored under [`METADATA_KEY`].
///
/// Composers are untrusted; this struct is only ever obtained through
/// [`metadata_reader`], which validates shape and content on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedPacketPayload {
    /// The rewardable object this metadata references.
    pub id: RedPacketId,
    /// Claimed lifecycle status.
    pub status: RedPacketStatus,
    /// Total amount, formatted by the composer.
    #[serde(default)]
    pub total: Option<String>,
    /// Display name of the sender.
    #[serde(default)]
    pub sender_name: Option<String>,
}

/// Validated metadata key for red packets.
#[must_use]
pub fn metadata_key() -> MetadataKey {
    MetadataKey::from_static(METADATA_KEY)
}

/// The sanctioned reader for red packet metadata.
#[must_use]
pub fn metadata_reader() -> MetadataReader<RedPacketPayload> {
    MetadataReader::new(metadata_key()).with_validator(|payload| !payload.id.as_str().is_empty())
}
