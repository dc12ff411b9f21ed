//! Plugin descriptor, capability registry, and rendering/injection pipeline.
//!
//! Independently authored plugins declare their capabilities in a
//! [`PluginDescriptor`] and are composed by the [`RenderPipeline`] without
//! the host page or other plugins knowing about each other. Two rendering
//! strategies coexist: declarative components whose output is owned by the
//! surrounding tree, and raw injectors that imperatively take over a mount
//! point outside that tree and must release it through a disposer. The
//! mount/dispose pairing is enforced structurally — mounting is only
//! possible through a claimed [`MountPoint`](inject::MountPoint), and the
//! disposer runs exactly once when the rendering is torn down.

pub mod context;
pub mod descriptor;
pub mod error;
pub mod inject;
pub mod pipeline;
pub mod registry;

pub use context::PostContext;
pub use descriptor::{BadgeRenderer, InjectFunction, MessageProcessor, PluginDescriptor, PluginId};
pub use error::{PluginError, PluginResult};
pub use inject::{
    ActiveInjection, Disposer, Fragment, MountAllocator, MountClaim, MountPoint, VirtualMounts,
};
pub use pipeline::{
    BadgeRow, InspectorOutcome, PostRendering, RenderPipeline, UNRECOGNIZED_METADATA_LABEL,
};
pub use registry::PluginRegistry;
