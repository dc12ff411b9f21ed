//! Collaborator service contracts for the claim workflow.
//!
//! These are external components consumed through fixed interfaces: the
//! claim backend, wallet account discovery, and dashboard navigation. The
//! claim flow never reaches past these traits — wallet cryptography and
//! network calls live entirely behind them.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::payload::RedPacketId;

/// An actor account eligible to claim a reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    /// On-chain address; unique per account.
    pub address: String,
    /// Display name chosen by the user.
    pub name: String,
}

impl WalletAccount {
    #[must_use]
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WalletAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Options accompanying a claim submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClaimOptions {
    /// Remember the chosen account as the default for future claims.
    pub set_as_default: bool,
}

impl ClaimOptions {
    #[must_use]
    pub fn set_as_default() -> Self {
        Self {
            set_as_default: true,
        }
    }
}

/// Proof of a successful claim, issued by the claim backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// Receipt identifier.
    pub id: Uuid,
    /// The claimed red packet.
    pub target: RedPacketId,
    /// Address the claim was paid to.
    pub account_address: String,
    /// When the backend settled the claim.
    pub claimed_at: DateTime<Utc>,
}

impl ClaimReceipt {
    /// Create a receipt settled now.
    #[must_use]
    pub fn new(target: RedPacketId, account_address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            account_address: account_address.into(),
            claimed_at: Utc::now(),
        }
    }
}

/// Errors the claim backend can report.
#[derive(Debug, Clone, Error)]
pub enum ClaimError {
    /// The backend refused the claim (already claimed, expired, empty...).
    #[error("Claim rejected: {reason}")]
    Rejected {
        /// Backend-provided reason, surfaced to the user.
        reason: String,
    },
    /// The backend could not be reached.
    #[error("Claim service unavailable: {0}")]
    Unavailable(String),
}

/// The asynchronous claim backend.
///
/// Invoked only from the `Submitting` state; the call is the one
/// irrevocable step of the workflow and always runs to completion.
#[async_trait]
pub trait ClaimService: Send + Sync {
    /// Claim `target` with `account`.
    async fn perform(
        &self,
        target: &RedPacketId,
        account: &WalletAccount,
        options: ClaimOptions,
    ) -> Result<ClaimReceipt, ClaimError>;
}

/// Wallet account discovery, consumed during `Loading`.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts eligible for claiming, in the user's preferred order.
    async fn list_accounts(&self) -> Vec<WalletAccount>;

    /// Ask the user to connect or create an account. Invoked when
    /// discovery finds no candidates.
    async fn request_connect(&self);
}

/// Dashboard navigation, invoked on failure or for non-claimable packets.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Open the screen where the user can resolve a failed claim; carries
    /// the failure reason as context.
    async fn open_remediation_screen(&self, target: &RedPacketId, reason: &str);

    /// Open the details screen for a packet that cannot be claimed.
    async fn open_details_screen(&self, target: &RedPacketId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_display() {
        let account = WalletAccount::new("0xabc", "Savings");
        assert_eq!(account.to_string(), "Savings (0xabc)");
    }

    #[test]
    fn test_claim_options_default() {
        assert!(!ClaimOptions::default().set_as_default);
        assert!(ClaimOptions::set_as_default().set_as_default);
    }

    #[test]
    fn test_claim_error_messages() {
        let rejected = ClaimError::Rejected {
            reason: "already claimed".to_string(),
        };
        assert_eq!(rejected.to_string(), "Claim rejected: already claimed");
    }

    #[test]
    fn test_receipt_serialization() {
        let receipt = ClaimReceipt::new(RedPacketId::new("rp-1"), "0xabc");
        let json = serde_json::to_string(&receipt).unwrap();
        let back: ClaimReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(receipt, back);
    }
}
