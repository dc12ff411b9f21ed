//! Red packet plugin: a reward attached to a post that eligible users can
//! claim with one of their wallet accounts.
//!
//! This is the representative action plugin. Its descriptor renders a
//! widget for posts carrying red packet metadata and a badge for the post
//! dialog; triggering the widget runs the [`ClaimFlow`] state machine,
//! which discovers candidate accounts, lets the user pick one when there
//! is a choice, and submits the claim through collaborator services.

pub mod claim;
pub mod define;
pub mod payload;
pub mod services;

pub use claim::{ClaimFlow, ClaimServices, ClaimState, NO_CANDIDATES_REASON};
pub use define::{PLUGIN_ID, PLUGIN_NAME, descriptor};
pub use payload::{RedPacketId, RedPacketPayload, RedPacketStatus, metadata_key, metadata_reader};
pub use services::{
    ClaimError, ClaimOptions, ClaimReceipt, ClaimService, Navigator, WalletAccount, WalletProvider,
};
