//! Mount points, claims, and the active-injection guard.
//!
//! Some host pages' DOM is not under the extension's declarative tree and
//! must be managed imperatively. A raw injector receives exclusive
//! ownership of a mount point and returns a disposer that releases every
//! resource it took (timers, subscriptions, injected nodes). The pairing
//! contract is structural: an injector can only run against a claimed
//! [`MountPoint`], and the pipeline wraps the disposer in an
//! [`ActiveInjection`] that invokes it exactly once — explicitly or on
//! drop — before the claim is released and the mount point becomes
//! reusable.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::descriptor::PluginId;

/// Teardown callback returned by a raw injector.
///
/// Invoking it must release everything the injector owns. The pipeline
/// guarantees exactly one invocation per successful mount.
pub type Disposer = Box<dyn FnOnce() + Send>;

/// Output of a declarative component: a widget the surrounding tree embeds
/// and owns. Presentation is out of scope here, so a fragment is just the
/// plugin wrapper title and a body the host renderer displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    title: String,
    body: String,
}

impl Fragment {
    /// Create a fragment with a wrapper title (usually the plugin name).
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// A host DOM anchor a raw injector can take over.
///
/// Clones share the same occupancy flag, so a mount point handed out twice
/// still admits only one active claim at a time.
#[derive(Debug, Clone)]
pub struct MountPoint {
    id: String,
    occupied: Arc<AtomicBool>,
}

impl MountPoint {
    /// Create an unoccupied mount point.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            occupied: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether an injector currently owns this mount point.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }

    /// Claim exclusive ownership of this mount point.
    ///
    /// Returns `None` while another claim is live. The claim releases the
    /// mount point when dropped.
    #[must_use]
    pub fn claim(&self) -> Option<MountClaim> {
        if self
            .occupied
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(MountClaim {
                mount_id: self.id.clone(),
                occupied: Arc::clone(&self.occupied),
            })
        } else {
            None
        }
    }
}

/// Exclusive ownership of a mount point for the duration of one injection.
///
/// Not constructible except through [`MountPoint::claim`], which is what
/// makes double-init on one mount point impossible.
#[derive(Debug)]
pub struct MountClaim {
    mount_id: String,
    occupied: Arc<AtomicBool>,
}

impl MountClaim {
    #[must_use]
    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }
}

impl Drop for MountClaim {
    fn drop(&mut self) {
        self.occupied.store(false, Ordering::Release);
    }
}

/// A mounted raw injection: the claim plus its pending disposer.
///
/// The disposer runs exactly once — on [`ActiveInjection::dispose`] or on
/// drop — and only then is the claim released, so the mount point can never
/// be repurposed while the injector's resources are live.
pub struct ActiveInjection {
    plugin_id: PluginId,
    // Claim is held until the disposer has run; field order keeps the
    // disposer Option separate so `dispose_inner` can take it first.
    claim: Option<MountClaim>,
    disposer: Option<Disposer>,
}

impl ActiveInjection {
    pub(crate) fn new(plugin_id: PluginId, claim: MountClaim, disposer: Disposer) -> Self {
        Self {
            plugin_id,
            claim: Some(claim),
            disposer: Some(disposer),
        }
    }

    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    /// The mount point this injection owns, until disposed.
    #[must_use]
    pub fn mount_id(&self) -> Option<&str> {
        self.claim.as_ref().map(MountClaim::mount_id)
    }

    /// Tear down the injection now instead of at drop time.
    pub fn dispose(mut self) {
        self.dispose_inner();
    }

    fn dispose_inner(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
        // Release the mount point only after the disposer has run.
        self.claim.take();
    }
}

impl Drop for ActiveInjection {
    fn drop(&mut self) {
        self.dispose_inner();
    }
}

impl fmt::Debug for ActiveInjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveInjection")
            .field("plugin_id", &self.plugin_id)
            .field("mount_id", &self.mount_id())
            .field("disposed", &self.disposer.is_none())
            .finish()
    }
}

/// Source of mount points for raw injectors.
///
/// Implemented by the host's DOM adapter; the pipeline asks it for an
/// anchor per (post, plugin) pair. [`VirtualMounts`] ships as the headless
/// implementation used in tests and previews.
pub trait MountAllocator {
    /// Return the mount point for the given plugin under the given post.
    ///
    /// Repeated calls for the same pair must return handles sharing one
    /// occupancy flag, so a stale injection blocks remounting until its
    /// disposer has run.
    fn allocate(&mut self, post_id: &str, plugin_id: &PluginId) -> MountPoint;
}

/// In-memory mount allocator with stable per-(post, plugin) anchors.
#[derive(Debug, Default)]
pub struct VirtualMounts {
    mounts: std::collections::HashMap<String, MountPoint>,
}

impl VirtualMounts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of anchors handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}

impl MountAllocator for VirtualMounts {
    fn allocate(&mut self, post_id: &str, plugin_id: &PluginId) -> MountPoint {
        let key = format!("{post_id}/{plugin_id}");
        self.mounts
            .entry(key.clone())
            .or_insert_with(|| MountPoint::new(key))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn plugin_id() -> PluginId {
        PluginId::from_static("com.example.test")
    }

    #[test]
    fn test_claim_excludes_second_claim() {
        let mount = MountPoint::new("m-1");
        let claim = mount.claim().unwrap();
        assert!(mount.is_occupied());
        assert!(mount.claim().is_none());
        drop(claim);
        assert!(!mount.is_occupied());
        assert!(mount.claim().is_some());
    }

    #[test]
    fn test_clones_share_occupancy() {
        let mount = MountPoint::new("m-2");
        let other = mount.clone();
        let _claim = mount.claim().unwrap();
        assert!(other.is_occupied());
        assert!(other.claim().is_none());
    }

    #[test]
    fn test_disposer_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mount = MountPoint::new("m-3");
        let claim = mount.claim().unwrap();

        let counted = Arc::clone(&calls);
        let injection = ActiveInjection::new(
            plugin_id(),
            claim,
            Box::new(move || {
                counted.fetch_add(1, Ordering::SeqCst);
            }),
        );

        injection.dispose();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Mount point is reusable only after disposal.
        assert!(!mount.is_occupied());
    }

    #[test]
    fn test_drop_disposes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mount = MountPoint::new("m-4");
        {
            let counted = Arc::clone(&calls);
            let _injection = ActiveInjection::new(
                plugin_id(),
                mount.claim().unwrap(),
                Box::new(move || {
                    counted.fetch_add(1, Ordering::SeqCst);
                }),
            );
            assert!(mount.is_occupied());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!mount.is_occupied());
    }

    #[test]
    fn test_virtual_mounts_stable_anchors() {
        let mut mounts = VirtualMounts::new();
        let a = mounts.allocate("post-1", &plugin_id());
        let b = mounts.allocate("post-1", &plugin_id());
        assert_eq!(a.id(), b.id());

        let _claim = a.claim().unwrap();
        // The second handle observes the claim held through the first.
        assert!(b.claim().is_none());
        assert_eq!(mounts.len(), 1);
    }
}
