//! File service plugin, part of the static plugin list.
//!
//! Posts can carry an attached file, uploaded to permanent storage by the
//! composer. The decryption inspector renders a preview card with the file
//! name, its size, and the decryption key when the upload was encrypted;
//! the badge summarizes the attachment for the post dialog.

use serde::{Deserialize, Serialize};

use postern_message::{MetadataKey, MetadataReader};
use postern_plugin::{Fragment, InjectFunction, PluginDescriptor, PluginId};

/// Stable identifier of the file service plugin.
pub const PLUGIN_ID: &str = "com.postern.fileservice";

/// Display name, used as the widget wrapper title.
pub const PLUGIN_NAME: &str = "File Service";

/// Metadata kind under which composers attach uploaded files.
pub const METADATA_KEY: &str = "com.maskbook.fileservice:1";

/// The plugin-defined payload describing one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Original file name, as chosen by the uploader.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Storage transaction the file landed in; forms the download link.
    #[serde(rename = "landingTxID")]
    pub landing_tx_id: String,
    /// Decryption key, absent when the file was uploaded unencrypted.
    #[serde(default)]
    pub key: Option<String>,
}

impl FileInfo {
    /// Permanent download link for this file.
    #[must_use]
    pub fn download_link(&self) -> String {
        match &self.key {
            Some(key) => format!("https://arweave.net/{}#{key}", self.landing_tx_id),
            None => format!("https://arweave.net/{}", self.landing_tx_id),
        }
    }
}

/// Validated metadata key for attached files.
#[must_use]
pub fn metadata_key() -> MetadataKey {
    MetadataKey::from_static(METADATA_KEY)
}

/// The sanctioned reader for file metadata.
#[must_use]
pub fn metadata_reader() -> MetadataReader<FileInfo> {
    MetadataReader::new(metadata_key())
        .with_validator(|info| !info.name.is_empty() && !info.landing_tx_id.is_empty())
}

/// Build the file service plugin descriptor.
#[must_use]
pub fn descriptor() -> PluginDescriptor {
    let reader = metadata_reader();
    PluginDescriptor::new(PluginId::from_static(PLUGIN_ID), PLUGIN_NAME)
        .with_success_decryption_inspector(InjectFunction::component(move |_ctx, message| {
            let info = reader.read(message)?;
            Some(Fragment::new(PLUGIN_NAME, preview_body(&info)))
        }))
        .with_metadata_badge(metadata_key(), |raw| {
            let info: FileInfo = serde_json::from_value(raw.clone()).ok()?;
            Some(format!("Attached file: {}", info.name))
        })
}

fn preview_body(info: &FileInfo) -> String {
    let encryption = match &info.key {
        Some(key) => format!("file key {key}"),
        None => "unencrypted".to_string(),
    };
    format!(
        "{} ({}, {encryption}) · {}",
        info.name,
        format_file_size(info.size),
        info.download_link()
    )
}

/// Human-readable decimal file size, matching the uploader's display.
fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1_000.0;
    const MB: f64 = 1_000_000.0;
    const GB: f64 = 1_000_000_000.0;

    #[allow(clippy::cast_precision_loss)]
    let size = bytes as f64;
    if size >= GB {
        format!("{:.2} GB", size / GB)
    } else if size >= MB {
        format!("{:.2} MB", size / MB)
    } else if size >= KB {
        format!("{:.2} kB", size / KB)
    } else {
        format!("{bytes} B")
    }
}
