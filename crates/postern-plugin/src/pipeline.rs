//! Rendering / injection pipeline.
//!
//! For a given message or page context the pipeline asks the registry
//! which plugins expose the relevant capability and composes all matches,
//! never first-match-wins. Declarative components yield fragments owned by
//! the caller's tree; raw injectors are mounted on claimed mount points
//! and their disposers are owned by the returned [`PostRendering`] guard,
//! which tears everything down before any mount point can be repurposed.
//!
//! Message processors run before any inspection: the pipeline folds them
//! over the compound message in registry order, each producing the input
//! to the next.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use postern_message::{CompoundMessage, MetadataKey, TypedMessage};

use crate::context::PostContext;
use crate::descriptor::{InjectFunction, PluginDescriptor, PluginId};
use crate::inject::{ActiveInjection, Fragment, MountAllocator};
use crate::registry::PluginRegistry;

/// Label substituted when a badge renderer does not recognize a payload.
pub const UNRECOGNIZED_METADATA_LABEL: &str = "Unrecognized metadata";

/// One plugin's contribution to a render pass.
#[derive(Debug)]
pub enum InspectorOutcome {
    /// A declarative fragment, embedded and owned by the caller's tree.
    Rendered {
        /// Plugin that produced the fragment.
        plugin_id: PluginId,
        /// The embeddable widget.
        fragment: Fragment,
    },
    /// A raw injection, alive until the surrounding rendering is disposed.
    Mounted(ActiveInjection),
}

impl InspectorOutcome {
    /// The plugin this outcome belongs to.
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        match self {
            Self::Rendered { plugin_id, .. } => plugin_id,
            Self::Mounted(injection) => injection.plugin_id(),
        }
    }

    /// The fragment, if this outcome is declarative.
    #[must_use]
    pub fn fragment(&self) -> Option<&Fragment> {
        match self {
            Self::Rendered { fragment, .. } => Some(fragment),
            Self::Mounted(_) => None,
        }
    }

    /// The live injection, if this outcome is imperative.
    #[must_use]
    pub fn injection(&self) -> Option<&ActiveInjection> {
        match self {
            Self::Rendered { .. } => None,
            Self::Mounted(injection) => Some(injection),
        }
    }
}

/// The composed result of one render pass.
///
/// Owns every active raw injection. Dropping the rendering (message
/// re-render, component unmount, page navigation) or calling
/// [`PostRendering::dispose`] invokes every pending disposer, newest
/// first, releasing the mount points for reuse.
#[derive(Debug, Default)]
pub struct PostRendering {
    outcomes: Vec<InspectorOutcome>,
}

impl PostRendering {
    /// Outcomes in invocation order (= registry insertion order).
    #[must_use]
    pub fn outcomes(&self) -> &[InspectorOutcome] {
        &self.outcomes
    }

    /// Identifiers of the plugins that contributed, in invocation order.
    #[must_use]
    pub fn plugin_ids(&self) -> Vec<&PluginId> {
        self.outcomes.iter().map(InspectorOutcome::plugin_id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Tear down now instead of at drop time.
    pub fn dispose(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        // Newest first; dropping a Mounted outcome runs its disposer and
        // only then releases the mount claim.
        while self.outcomes.pop().is_some() {}
    }
}

impl Drop for PostRendering {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// A badge row for the post dialog: one short label per metadata kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRow {
    /// The metadata kind this badge describes.
    pub key: MetadataKey,
    /// The plugin whose renderer produced the label.
    pub plugin_id: PluginId,
    /// Display label; advisory only.
    pub label: String,
}

/// Metadata-driven rendering pipeline over a read-only plugin registry.
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    registry: Arc<PluginRegistry>,
}

impl RenderPipeline {
    /// Create a pipeline over a fully constructed registry.
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this pipeline dispatches over.
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Fold all registered message processors over a compound message.
    ///
    /// Applied in registry order, each processor producing the input to
    /// the next. Runs before any inspection; processors are pure, so this
    /// may be invoked for preview and final render alike.
    #[must_use]
    pub fn process_message(&self, message: CompoundMessage) -> CompoundMessage {
        let mut message = message;
        for descriptor in self.registry.iter() {
            if let Some(processor) = descriptor.message_processor() {
                trace!(plugin_id = %descriptor.id(), "Applying message processor");
                message = processor(message);
            }
        }
        message
    }

    /// Dispatch a successfully decrypted message to all matching
    /// decryption inspectors.
    #[must_use]
    pub fn inspect_decrypted(
        &self,
        ctx: &PostContext,
        message: &TypedMessage,
        mounts: &mut dyn MountAllocator,
    ) -> PostRendering {
        let mut outcomes = Vec::new();
        for descriptor in self.registry.iter() {
            let Some(inspector) = descriptor.success_decryption_inspector() else {
                continue;
            };
            Self::run_inspector(descriptor, inspector, ctx, message, mounts, &mut outcomes);
        }
        debug!(
            %ctx,
            outcome_count = outcomes.len(),
            "Decryption inspection complete"
        );
        PostRendering { outcomes }
    }

    /// Dispatch a post to all post inspectors, independent of decryption
    /// state.
    #[must_use]
    pub fn inspect_post(
        &self,
        ctx: &PostContext,
        mounts: &mut dyn MountAllocator,
    ) -> PostRendering {
        let mut outcomes = Vec::new();
        for descriptor in self.registry.iter() {
            let Some(inspector) = descriptor.post_inspector() else {
                continue;
            };
            Self::run_inspector(descriptor, inspector, ctx, &(), mounts, &mut outcomes);
        }
        PostRendering { outcomes }
    }

    /// Invoke all page inspectors, once per page load.
    #[must_use]
    pub fn inspect_page(&self) -> PostRendering {
        let mut outcomes = Vec::new();
        for descriptor in self.registry.iter() {
            let Some(render) = descriptor.page_inspector() else {
                continue;
            };
            if let Some(fragment) = render() {
                outcomes.push(InspectorOutcome::Rendered {
                    plugin_id: descriptor.id().clone(),
                    fragment,
                });
            }
        }
        PostRendering { outcomes }
    }

    /// Produce one badge row per metadata kind present on a message.
    ///
    /// The first-registered plugin with a badge for a kind wins; kinds no
    /// plugin claims produce no row. A renderer that does not recognize
    /// the payload yields the [`UNRECOGNIZED_METADATA_LABEL`] sentinel
    /// instead of failing the row.
    #[must_use]
    pub fn badge_rows(&self, message: &TypedMessage) -> Vec<BadgeRow> {
        let mut rows = Vec::new();
        for (key, payload) in message.meta() {
            let mut claimants = self
                .registry
                .iter()
                .filter_map(|d| d.metadata_badge(key).map(|renderer| (d, renderer)));
            let Some((descriptor, renderer)) = claimants.next() else {
                continue;
            };
            if claimants.next().is_some() {
                debug!(
                    %key,
                    winner = %descriptor.id(),
                    "Multiple plugins registered a badge for this kind; first-registered wins"
                );
            }
            let label = renderer(payload)
                .unwrap_or_else(|| UNRECOGNIZED_METADATA_LABEL.to_string());
            rows.push(BadgeRow {
                key: key.clone(),
                plugin_id: descriptor.id().clone(),
                label,
            });
        }
        rows
    }

    fn run_inspector<P>(
        descriptor: &PluginDescriptor,
        inspector: &InjectFunction<P>,
        ctx: &PostContext,
        props: &P,
        mounts: &mut dyn MountAllocator,
        outcomes: &mut Vec<InspectorOutcome>,
    ) {
        match inspector {
            InjectFunction::Component(render) => {
                if let Some(fragment) = render(ctx, props) {
                    outcomes.push(InspectorOutcome::Rendered {
                        plugin_id: descriptor.id().clone(),
                        fragment,
                    });
                } else {
                    trace!(plugin_id = %descriptor.id(), %ctx, "Inspector does not apply");
                }
            },
            InjectFunction::Raw(init) => {
                let mount = mounts.allocate(ctx.post_id(), descriptor.id());
                let Some(claim) = mount.claim() else {
                    // A live claim here means the host reused a mount point
                    // without disposing the previous rendering.
                    warn!(
                        plugin_id = %descriptor.id(),
                        mount_id = %mount.id(),
                        "Mount point still occupied, skipping raw injector"
                    );
                    return;
                };
                let disposer = init(ctx, props, &claim);
                debug!(
                    plugin_id = %descriptor.id(),
                    mount_id = %claim.mount_id(),
                    "Raw injector mounted"
                );
                outcomes.push(InspectorOutcome::Mounted(ActiveInjection::new(
                    descriptor.id().clone(),
                    claim,
                    disposer,
                )));
            },
        }
    }
}

impl fmt::Display for BadgeRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.label)
    }
}
