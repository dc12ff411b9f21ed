//! Typed message model and metadata codec for the Postern extension.
//!
//! A [`TypedMessage`] is the canonical representation of a decrypted or
//! composed post. Besides its body it carries a metadata side-map keyed by
//! namespaced [`MetadataKey`]s; each entry is an opaque, plugin-defined JSON
//! payload. Plugins never touch the map directly — they read it through a
//! [`MetadataReader`], which validates the payload shape on every access
//! because messages may originate from composers outside this extension's
//! control.

pub mod error;
pub mod message;
pub mod meta;

pub use error::{MessageError, MessageResult};
pub use message::{CompoundMessage, MessageBody, TextMessage, TypedMessage};
pub use meta::{MetaMap, MetadataKey, MetadataReader};
