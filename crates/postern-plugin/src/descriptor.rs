//! Plugin identity and the declarative capability contract.
//!
//! A plugin is a [`PluginDescriptor`]: a stable identifier, a display name,
//! and zero or more optional capability slots. Capabilities are
//! independently optional and independently invoked — a descriptor with no
//! capabilities is legal, just useless.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use postern_message::{CompoundMessage, MetadataKey, TypedMessage};

use crate::context::PostContext;
use crate::error::{PluginError, PluginResult};
use crate::inject::{Disposer, Fragment, MountClaim};

/// Process-unique, stable plugin identifier, namespaced by the plugin
/// author (e.g. `com.postern.redpacket`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(String);

impl PluginId {
    /// Create a validated plugin identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidIdentifier`] if the identifier is
    /// empty or contains characters outside lowercase alphanumerics,
    /// dots, and hyphens.
    pub fn new(id: impl Into<String>) -> PluginResult<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Wrap a known-good literal without validation.
    #[must_use]
    pub fn from_static(id: &str) -> Self {
        Self(id.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> PluginResult<()> {
        if id.is_empty() {
            return Err(PluginError::InvalidIdentifier(
                "plugin id must not be empty".into(),
            ));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-'))
        {
            return Err(PluginError::InvalidIdentifier(format!(
                "plugin id must contain only lowercase alphanumerics, dots, and hyphens, got: {id}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Declarative component: pure rendering function of its props.
///
/// Returning `None` means "does not apply to this input" (typically a
/// metadata validation miss) and excludes the plugin from the outcome.
pub type ComponentFn<P> = Arc<dyn Fn(&PostContext, &P) -> Option<Fragment> + Send + Sync>;

/// Raw injector: imperatively takes over a claimed mount point and returns
/// the disposer that releases everything it owns.
pub type RawInjectFn<P> = Arc<dyn Fn(&PostContext, &P, &MountClaim) -> Disposer + Send + Sync>;

/// Page-level component, invoked once per page load with no post context.
pub type PageComponentFn = Arc<dyn Fn() -> Option<Fragment> + Send + Sync>;

/// Badge renderer: pure function from a raw metadata payload to a short
/// display label. `None` means the payload is unrecognized; the pipeline
/// substitutes a sentinel label rather than failing the badge row.
pub type BadgeRenderer = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Pure transformation of a compound message, applied before inspection.
///
/// Must be referentially transparent: the pipeline may run it several
/// times for one message (preview and final render).
pub type MessageProcessor = Arc<dyn Fn(CompoundMessage) -> CompoundMessage + Send + Sync>;

/// An injection function, polymorphic over the two rendering strategies.
#[derive(Clone)]
pub enum InjectFunction<P> {
    /// Rendered in-tree; the surrounding tree owns and unmounts it.
    Component(ComponentFn<P>),
    /// Imperatively mounted outside the tree; paired with a disposer.
    Raw(RawInjectFn<P>),
}

impl<P> InjectFunction<P> {
    /// Wrap a declarative component.
    pub fn component(
        f: impl Fn(&PostContext, &P) -> Option<Fragment> + Send + Sync + 'static,
    ) -> Self {
        Self::Component(Arc::new(f))
    }

    /// Wrap a raw injector.
    pub fn raw(
        f: impl Fn(&PostContext, &P, &MountClaim) -> Disposer + Send + Sync + 'static,
    ) -> Self {
        Self::Raw(Arc::new(f))
    }
}

impl<P> fmt::Debug for InjectFunction<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component(_) => f.write_str("InjectFunction::Component"),
            Self::Raw(_) => f.write_str("InjectFunction::Raw"),
        }
    }
}

/// The declarative contract a plugin implements.
pub struct PluginDescriptor {
    id: PluginId,
    plugin_name: String,
    success_decryption_inspector: Option<InjectFunction<TypedMessage>>,
    page_inspector: Option<PageComponentFn>,
    post_inspector: Option<InjectFunction<()>>,
    post_dialog_metadata_badge: BTreeMap<MetadataKey, BadgeRenderer>,
    message_processor: Option<MessageProcessor>,
}

impl PluginDescriptor {
    /// Create a descriptor with no capabilities.
    #[must_use]
    pub fn new(id: PluginId, plugin_name: impl Into<String>) -> Self {
        Self {
            id,
            plugin_name: plugin_name.into(),
            success_decryption_inspector: None,
            page_inspector: None,
            post_inspector: None,
            post_dialog_metadata_badge: BTreeMap::new(),
            message_processor: None,
        }
    }

    /// Attach the inspector invoked when a message decrypts successfully.
    #[must_use]
    pub fn with_success_decryption_inspector(
        mut self,
        inspector: InjectFunction<TypedMessage>,
    ) -> Self {
        self.success_decryption_inspector = Some(inspector);
        self
    }

    /// Attach the component invoked once per page load.
    #[must_use]
    pub fn with_page_inspector(
        mut self,
        inspector: impl Fn() -> Option<Fragment> + Send + Sync + 'static,
    ) -> Self {
        self.page_inspector = Some(Arc::new(inspector));
        self
    }

    /// Attach the inspector invoked once per post, independent of
    /// decryption state.
    #[must_use]
    pub fn with_post_inspector(mut self, inspector: InjectFunction<()>) -> Self {
        self.post_inspector = Some(inspector);
        self
    }

    /// Register a badge renderer for one metadata kind.
    #[must_use]
    pub fn with_metadata_badge(
        mut self,
        key: MetadataKey,
        renderer: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.post_dialog_metadata_badge
            .insert(key, Arc::new(renderer));
        self
    }

    /// Attach the message processor applied before inspection.
    #[must_use]
    pub fn with_message_processor(
        mut self,
        processor: impl Fn(CompoundMessage) -> CompoundMessage + Send + Sync + 'static,
    ) -> Self {
        self.message_processor = Some(Arc::new(processor));
        self
    }

    #[must_use]
    pub fn id(&self) -> &PluginId {
        &self.id
    }

    #[must_use]
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    #[must_use]
    pub fn success_decryption_inspector(&self) -> Option<&InjectFunction<TypedMessage>> {
        self.success_decryption_inspector.as_ref()
    }

    #[must_use]
    pub fn page_inspector(&self) -> Option<&PageComponentFn> {
        self.page_inspector.as_ref()
    }

    #[must_use]
    pub fn post_inspector(&self) -> Option<&InjectFunction<()>> {
        self.post_inspector.as_ref()
    }

    /// Badge renderer registered for the given metadata kind, if any.
    #[must_use]
    pub fn metadata_badge(&self, key: &MetadataKey) -> Option<&BadgeRenderer> {
        self.post_dialog_metadata_badge.get(key)
    }

    #[must_use]
    pub fn message_processor(&self) -> Option<&MessageProcessor> {
        self.message_processor.as_ref()
    }

    /// Names of the capabilities this descriptor exposes, for logging.
    #[must_use]
    pub fn capability_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.success_decryption_inspector.is_some() {
            names.push("success_decryption_inspector");
        }
        if self.page_inspector.is_some() {
            names.push("page_inspector");
        }
        if self.post_inspector.is_some() {
            names.push("post_inspector");
        }
        if !self.post_dialog_metadata_badge.is_empty() {
            names.push("post_dialog_metadata_badge");
        }
        if self.message_processor.is_some() {
            names.push("message_processor");
        }
        names
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("id", &self.id)
            .field("plugin_name", &self.plugin_name)
            .field("capabilities", &self.capability_names())
            .finish()
    }
}
