//! Host assembly for the Postern extension.
//!
//! The host constructs the process-wide plugin registry exactly once at
//! startup: the static plugin list plus entries gated by [`Flags`]. A
//! registration failure here is a packaging defect and startup-fatal —
//! the error propagates out instead of being recovered.

pub mod diagnostics;
pub mod flags;
pub mod registry;

pub use flags::{BuildContext, Flags};
pub use registry::build_registry;
