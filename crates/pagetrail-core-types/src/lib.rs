//! Types shared by every pagetrail crate
//!
//! - **Actor context**: the acting user, their account tier and a request id
//! - **Schema constants**: canonical field keys and event names for logs

pub mod actor;
pub mod schema;

pub use actor::{AccountTier, ActorContext, RequestId};
