//! External collaborators of the tournament engine.
//!
//! Notification delivery and prize handling live outside this crate. The
//! traits here are the seams; the `Log*` implementations only log.

pub mod errors;
pub mod notifier;
pub mod prizes;

pub use errors::{ServiceError, ServiceResult};
pub use notifier::{LogNotifier, Notifier};
pub use prizes::{EntryRefund, LogPrizeService, PrizeAward, PrizePayout, PrizeService};
