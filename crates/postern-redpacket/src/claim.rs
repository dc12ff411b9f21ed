//! The claim state machine.
//!
//! `Idle -> Loading -> (AwaitingSelection ->) Submitting -> Succeeded |
//! Failed`. Candidate discovery (`Loading`) is deliberately separate from
//! the side-effecting submission (`Submitting`): exactly one candidate
//! auto-selects to remove friction, several candidates require an explicit
//! choice, and none at all fails with a call to action to connect an
//! account. Dismissal resets any state back to `Idle` except `Submitting`,
//! which is never aborted — the in-flight call runs to completion and its
//! result is applied even if the dialog was hidden meanwhile. The reverse
//! holds for `Loading`: a dismissal during discovery wins, and the stale
//! discovery result is discarded when it arrives.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::payload::{RedPacketId, RedPacketStatus};
use crate::services::{
    ClaimOptions, ClaimReceipt, ClaimService, Navigator, WalletAccount, WalletProvider,
};

/// Failure reason recorded when account discovery finds nothing to act with.
pub const NO_CANDIDATES_REASON: &str = "no candidates";

/// Where the claim workflow currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimState {
    /// No claim in progress.
    Idle,
    /// Discovering candidate accounts.
    Loading,
    /// Several candidates; waiting for the user to pick one.
    AwaitingSelection {
        /// Eligible accounts, in the provider's order.
        candidates: Vec<WalletAccount>,
    },
    /// The claim call is in flight. Not abortable.
    Submitting {
        /// The account the claim is submitted with.
        account: WalletAccount,
    },
    /// The backend settled the claim.
    Succeeded {
        /// Proof of the claim.
        receipt: ClaimReceipt,
    },
    /// The claim did not go through.
    Failed {
        /// Reason surfaced to the user and the remediation screen.
        reason: String,
    },
}

impl ClaimState {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::AwaitingSelection { .. } => "awaiting_selection",
            Self::Submitting { .. } => "submitting",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// The collaborator services the claim flow calls out to.
#[derive(Clone)]
pub struct ClaimServices {
    claim: Arc<dyn ClaimService>,
    wallets: Arc<dyn WalletProvider>,
    navigator: Arc<dyn Navigator>,
}

impl ClaimServices {
    #[must_use]
    pub fn new(
        claim: Arc<dyn ClaimService>,
        wallets: Arc<dyn WalletProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            claim,
            wallets,
            navigator,
        }
    }
}

/// What a resolved candidate discovery leads to, decided under the state
/// lock so a concurrent dismissal cannot be overwritten.
enum Discovered {
    /// No candidates; ask the user to connect an account.
    Connect,
    /// Exactly one candidate; submit with it directly.
    Submit(WalletAccount),
    /// Several candidates; the selection dialog takes over.
    Selecting,
}

/// One claim workflow for one red packet.
///
/// Created when the user triggers the action from a rendered widget;
/// `dismiss` resets it to `Idle` when the dialog is closed. State is
/// behind a lock so UI events can interleave with resolved collaborator
/// calls, but the lock is never held across an await point.
pub struct ClaimFlow {
    target: RedPacketId,
    services: ClaimServices,
    state: Mutex<ClaimState>,
    dialog_visible: AtomicBool,
}

impl ClaimFlow {
    /// Create an idle flow for the given red packet.
    #[must_use]
    pub fn new(target: RedPacketId, services: ClaimServices) -> Self {
        Self {
            target,
            services,
            state: Mutex::new(ClaimState::Idle),
            dialog_visible: AtomicBool::new(false),
        }
    }

    /// The red packet this flow claims.
    #[must_use]
    pub fn target(&self) -> &RedPacketId {
        &self.target
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> ClaimState {
        self.state.lock().await.clone()
    }

    /// Whether the selection dialog is currently shown.
    #[must_use]
    pub fn dialog_visible(&self) -> bool {
        self.dialog_visible.load(Ordering::Acquire)
    }

    /// React to the user activating the widget.
    ///
    /// Claimable statuses start the claim; everything else routes to the
    /// details screen.
    pub async fn activate(&self, status: RedPacketStatus) {
        if status.is_claimable() {
            self.trigger().await;
        } else {
            debug!(target = %self.target, %status, "Packet not claimable, opening details");
            self.services.navigator.open_details_screen(&self.target).await;
        }
    }

    /// Start the claim: discover candidates and submit or ask for a choice.
    ///
    /// No-op unless the flow is `Idle`. A dismissal while discovery is in
    /// flight wins: the flow stays `Idle` and the result is discarded.
    pub async fn trigger(&self) {
        {
            let mut state = self.state.lock().await;
            if !matches!(*state, ClaimState::Idle) {
                debug!(target = %self.target, state = state.name(), "Claim already in progress");
                return;
            }
            *state = ClaimState::Loading;
        }

        let mut candidates = self.services.wallets.list_accounts().await;
        debug!(target = %self.target, candidate_count = candidates.len(), "Candidates discovered");
        let sole = if candidates.len() == 1 {
            candidates.pop()
        } else {
            None
        };

        let next = {
            let mut state = self.state.lock().await;
            // The user may have dismissed the dialog while discovery was
            // pending; only an uninterrupted `Loading` proceeds.
            if !matches!(*state, ClaimState::Loading) {
                debug!(target = %self.target, state = state.name(), "Stale discovery result discarded");
                return;
            }
            if let Some(account) = sole {
                // Exactly one candidate: no choice to make, submit directly.
                *state = ClaimState::Submitting {
                    account: account.clone(),
                };
                Discovered::Submit(account)
            } else if candidates.is_empty() {
                *state = ClaimState::Failed {
                    reason: NO_CANDIDATES_REASON.to_string(),
                };
                Discovered::Connect
            } else {
                *state = ClaimState::AwaitingSelection { candidates };
                self.dialog_visible.store(true, Ordering::Release);
                Discovered::Selecting
            }
        };

        match next {
            Discovered::Connect => {
                // Nothing to act with yet; ask the user to connect an account.
                self.services.wallets.request_connect().await;
            },
            Discovered::Submit(account) => {
                self.perform_submission(account, ClaimOptions::default()).await;
            },
            Discovered::Selecting => {},
        }
    }

    /// Submit with the account the user picked.
    ///
    /// No-op unless the flow is `AwaitingSelection` and the account is one
    /// of the offered candidates. The transition to `Submitting` happens
    /// under the same lock as the check, so a concurrent dismissal either
    /// lands before the selection (and voids it) or not at all.
    pub async fn select(&self, account: WalletAccount, set_as_default: bool) {
        {
            let mut state = self.state.lock().await;
            let ClaimState::AwaitingSelection { candidates } = &*state else {
                warn!(target = %self.target, state = state.name(), "Selection outside of AwaitingSelection");
                return;
            };
            if !candidates.iter().any(|c| c.address == account.address) {
                warn!(target = %self.target, account = %account, "Selected account is not a candidate");
                return;
            }
            *state = ClaimState::Submitting {
                account: account.clone(),
            };
        }
        self.dialog_visible.store(false, Ordering::Release);
        self.perform_submission(account, ClaimOptions { set_as_default })
            .await;
    }

    /// Dismiss the dialog.
    ///
    /// Resets the flow to `Idle` from any state except `Submitting`; an
    /// in-flight submission only hides the dialog and still applies its
    /// result when it resolves.
    pub async fn dismiss(&self) {
        self.dialog_visible.store(false, Ordering::Release);
        let mut state = self.state.lock().await;
        if matches!(*state, ClaimState::Submitting { .. }) {
            debug!(target = %self.target, "Dismiss during submission, dialog hidden only");
            return;
        }
        *state = ClaimState::Idle;
    }

    /// Hide the dialog without touching the state.
    pub fn hide_dialog(&self) {
        self.dialog_visible.store(false, Ordering::Release);
    }

    /// Run the claim call for an account the caller has already moved into
    /// `Submitting`.
    async fn perform_submission(&self, account: WalletAccount, options: ClaimOptions) {
        // The one irrevocable step. Runs to completion; the result is
        // applied even if the dialog was hidden while it was pending.
        let result = self
            .services
            .claim
            .perform(&self.target, &account, options)
            .await;

        match result {
            Ok(receipt) => {
                info!(target = %self.target, account = %account, "Claim succeeded");
                *self.state.lock().await = ClaimState::Succeeded { receipt };
            },
            Err(e) => {
                let reason = e.to_string();
                warn!(target = %self.target, account = %account, reason = %reason, "Claim failed");
                *self.state.lock().await = ClaimState::Failed {
                    reason: reason.clone(),
                };
                self.services
                    .navigator
                    .open_remediation_screen(&self.target, &reason)
                    .await;
            },
        }
    }
}

impl std::fmt::Debug for ClaimFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimFlow")
            .field("target", &self.target)
            .field("dialog_visible", &self.dialog_visible())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::services::ClaimError;

    #[derive(Default)]
    struct RecordingNavigator {
        remediations: Mutex<Vec<String>>,
        details_opened: AtomicUsize,
    }

    #[async_trait]
    impl Navigator for RecordingNavigator {
        async fn open_remediation_screen(&self, _target: &RedPacketId, reason: &str) {
            self.remediations.lock().await.push(reason.to_string());
        }

        async fn open_details_screen(&self, _target: &RedPacketId) {
            self.details_opened.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FixedWallets {
        accounts: Vec<WalletAccount>,
        connect_requests: AtomicUsize,
    }

    impl FixedWallets {
        fn new(accounts: Vec<WalletAccount>) -> Self {
            Self {
                accounts,
                connect_requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WalletProvider for FixedWallets {
        async fn list_accounts(&self) -> Vec<WalletAccount> {
            self.accounts.clone()
        }

        async fn request_connect(&self) {
            self.connect_requests.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct InstantClaim {
        fail_with: Option<String>,
        performed: Mutex<Vec<(String, ClaimOptions)>>,
    }

    impl InstantClaim {
        fn succeeding() -> Self {
            Self {
                fail_with: None,
                performed: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                fail_with: Some(reason.to_string()),
                performed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ClaimService for InstantClaim {
        async fn perform(
            &self,
            target: &RedPacketId,
            account: &WalletAccount,
            options: ClaimOptions,
        ) -> Result<ClaimReceipt, ClaimError> {
            self.performed
                .lock()
                .await
                .push((account.address.clone(), options));
            match &self.fail_with {
                Some(reason) => Err(ClaimError::Rejected {
                    reason: reason.clone(),
                }),
                None => Ok(ClaimReceipt::new(target.clone(), &account.address)),
            }
        }
    }

    /// Wallet provider gated on a notify pair so tests can interleave UI
    /// events with a pending candidate discovery.
    struct GatedWallets {
        accounts: Vec<WalletAccount>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl WalletProvider for GatedWallets {
        async fn list_accounts(&self) -> Vec<WalletAccount> {
            self.entered.notify_one();
            self.release.notified().await;
            self.accounts.clone()
        }

        async fn request_connect(&self) {}
    }

    /// Claim service gated on a notify pair so tests can observe the
    /// `Submitting` state mid-flight.
    struct GatedClaim {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ClaimService for GatedClaim {
        async fn perform(
            &self,
            target: &RedPacketId,
            account: &WalletAccount,
            _options: ClaimOptions,
        ) -> Result<ClaimReceipt, ClaimError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(ClaimReceipt::new(target.clone(), &account.address))
        }
    }

    fn account(address: &str) -> WalletAccount {
        WalletAccount::new(address, address)
    }

    fn flow_with(
        claim: Arc<dyn ClaimService>,
        wallets: Arc<dyn WalletProvider>,
        navigator: Arc<RecordingNavigator>,
    ) -> ClaimFlow {
        ClaimFlow::new(
            RedPacketId::new("rp-1"),
            ClaimServices::new(claim, wallets, navigator),
        )
    }

    #[tokio::test]
    async fn test_no_candidates_fails_and_requests_connect() {
        let wallets = Arc::new(FixedWallets::new(vec![]));
        let navigator = Arc::new(RecordingNavigator::default());
        let flow = flow_with(
            Arc::new(InstantClaim::succeeding()),
            Arc::clone(&wallets) as Arc<dyn WalletProvider>,
            navigator,
        );

        flow.trigger().await;
        assert_eq!(
            flow.state().await,
            ClaimState::Failed {
                reason: NO_CANDIDATES_REASON.to_string()
            }
        );
        assert_eq!(wallets.connect_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_candidate_auto_selects() {
        let claim = Arc::new(InstantClaim::succeeding());
        let wallets = Arc::new(FixedWallets::new(vec![account("0xa")]));
        let flow = flow_with(
            Arc::clone(&claim) as Arc<dyn ClaimService>,
            wallets,
            Arc::new(RecordingNavigator::default()),
        );

        // AwaitingSelection can only be left through an explicit select();
        // reaching Succeeded without one proves it was never entered.
        flow.trigger().await;
        assert!(matches!(flow.state().await, ClaimState::Succeeded { .. }));
        assert!(!flow.dialog_visible());

        let performed = claim.performed.lock().await;
        assert_eq!(performed.len(), 1);
        assert_eq!(performed[0].0, "0xa");
        assert!(!performed[0].1.set_as_default);
    }

    #[tokio::test]
    async fn test_multiple_candidates_await_explicit_selection() {
        let claim = Arc::new(InstantClaim::succeeding());
        let wallets = Arc::new(FixedWallets::new(vec![account("0xa"), account("0xb")]));
        let flow = flow_with(
            Arc::clone(&claim) as Arc<dyn ClaimService>,
            wallets,
            Arc::new(RecordingNavigator::default()),
        );

        flow.trigger().await;
        let ClaimState::AwaitingSelection { candidates } = flow.state().await else {
            panic!("expected AwaitingSelection");
        };
        assert_eq!(candidates.len(), 2);
        assert!(flow.dialog_visible());

        flow.select(account("0xb"), true).await;
        assert!(matches!(flow.state().await, ClaimState::Succeeded { .. }));

        let performed = claim.performed.lock().await;
        assert_eq!(performed[0].0, "0xb");
        assert!(performed[0].1.set_as_default);
    }

    #[tokio::test]
    async fn test_selecting_non_candidate_is_ignored() {
        let claim = Arc::new(InstantClaim::succeeding());
        let wallets = Arc::new(FixedWallets::new(vec![account("0xa"), account("0xb")]));
        let flow = flow_with(
            Arc::clone(&claim) as Arc<dyn ClaimService>,
            wallets,
            Arc::new(RecordingNavigator::default()),
        );

        flow.trigger().await;
        flow.select(account("0xeve"), false).await;
        assert!(matches!(
            flow.state().await,
            ClaimState::AwaitingSelection { .. }
        ));
        assert!(claim.performed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_surfaces_reason_and_opens_remediation() {
        let navigator = Arc::new(RecordingNavigator::default());
        let wallets = Arc::new(FixedWallets::new(vec![account("0xa")]));
        let flow = flow_with(
            Arc::new(InstantClaim::failing("already claimed")),
            wallets,
            Arc::clone(&navigator),
        );

        flow.trigger().await;
        let ClaimState::Failed { reason } = flow.state().await else {
            panic!("expected Failed");
        };
        assert_eq!(reason, "Claim rejected: already claimed");

        let remediations = navigator.remediations.lock().await;
        assert_eq!(remediations.as_slice(), &[reason]);
    }

    #[tokio::test]
    async fn test_dismiss_resets_except_submitting() {
        let wallets = Arc::new(FixedWallets::new(vec![account("0xa"), account("0xb")]));
        let flow = flow_with(
            Arc::new(InstantClaim::succeeding()),
            wallets,
            Arc::new(RecordingNavigator::default()),
        );

        flow.trigger().await;
        assert!(matches!(
            flow.state().await,
            ClaimState::AwaitingSelection { .. }
        ));
        flow.dismiss().await;
        assert_eq!(flow.state().await, ClaimState::Idle);
        assert!(!flow.dialog_visible());
    }

    #[tokio::test]
    async fn test_submitting_not_abortable_result_still_applied() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let claim = Arc::new(GatedClaim {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        let wallets = Arc::new(FixedWallets::new(vec![account("0xa")]));
        let flow = Arc::new(flow_with(
            claim,
            wallets,
            Arc::new(RecordingNavigator::default()),
        ));

        let task = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.trigger().await }
        });

        entered.notified().await;
        assert!(matches!(flow.state().await, ClaimState::Submitting { .. }));

        // Dismissal mid-submission hides the dialog but does not abort.
        flow.dismiss().await;
        assert!(!flow.dialog_visible());
        assert!(matches!(flow.state().await, ClaimState::Submitting { .. }));

        release.notify_one();
        task.await.unwrap();
        assert!(matches!(flow.state().await, ClaimState::Succeeded { .. }));
    }

    #[tokio::test]
    async fn test_dismiss_during_discovery_discards_result() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        // A single account: without the re-check this path would
        // auto-submit the claim the user just aborted.
        let wallets = Arc::new(GatedWallets {
            accounts: vec![account("0xa")],
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        let claim = Arc::new(InstantClaim::succeeding());
        let flow = Arc::new(flow_with(
            Arc::clone(&claim) as Arc<dyn ClaimService>,
            wallets,
            Arc::new(RecordingNavigator::default()),
        ));

        let task = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.trigger().await }
        });

        entered.notified().await;
        assert_eq!(flow.state().await, ClaimState::Loading);

        flow.dismiss().await;
        assert_eq!(flow.state().await, ClaimState::Idle);

        release.notify_one();
        task.await.unwrap();

        // The resolved discovery must not resurrect the aborted flow.
        assert_eq!(flow.state().await, ClaimState::Idle);
        assert!(!flow.dialog_visible());
        assert!(claim.performed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_during_discovery_skips_selection_dialog() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let wallets = Arc::new(GatedWallets {
            accounts: vec![account("0xa"), account("0xb")],
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        let flow = Arc::new(flow_with(
            Arc::new(InstantClaim::succeeding()),
            wallets,
            Arc::new(RecordingNavigator::default()),
        ));

        let task = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.trigger().await }
        });

        entered.notified().await;
        flow.dismiss().await;
        release.notify_one();
        task.await.unwrap();

        assert_eq!(flow.state().await, ClaimState::Idle);
        assert!(!flow.dialog_visible());
    }

    #[tokio::test]
    async fn test_trigger_is_noop_outside_idle() {
        let wallets = Arc::new(FixedWallets::new(vec![account("0xa"), account("0xb")]));
        let flow = flow_with(
            Arc::new(InstantClaim::succeeding()),
            wallets,
            Arc::new(RecordingNavigator::default()),
        );

        flow.trigger().await;
        let before = flow.state().await;
        flow.trigger().await;
        assert_eq!(flow.state().await, before);
    }

    #[tokio::test]
    async fn test_non_claimable_status_opens_details() {
        let navigator = Arc::new(RecordingNavigator::default());
        let wallets = Arc::new(FixedWallets::new(vec![account("0xa")]));
        let flow = flow_with(
            Arc::new(InstantClaim::succeeding()),
            wallets,
            Arc::clone(&navigator),
        );

        flow.activate(RedPacketStatus::Expired).await;
        assert_eq!(flow.state().await, ClaimState::Idle);
        assert_eq!(navigator.details_opened.load(Ordering::SeqCst), 1);

        flow.activate(RedPacketStatus::Normal).await;
        assert!(matches!(flow.state().await, ClaimState::Succeeded { .. }));
    }
}
