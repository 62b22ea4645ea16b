//! Mixin-style synchronous publish/subscribe
//!
//! Gives any object its own `on` / `off` / `trigger` surface with:
//! - Whitespace-separated multi-name binding and triggering
//! - An `all` wildcard channel fired once per triggered event name
//! - Reentrancy-safe dispatch: handlers may bind, unbind and trigger on the
//!   hub that is currently firing them
//! - Filtered removal by any combination of event name, handler identity
//!   and bound context
//!
//! Dispatch is copy-on-iterate: the binding lists for an event and for the
//! `all` channel are snapshotted before that event's handlers run, so
//! mutation from inside a handler affects future firings, never the one in
//! flight.

pub mod core;
pub mod hub;
pub mod mixin;

pub use crate::core::{Context, Delivery, Handler, HubStats};
pub use crate::hub::{ALL, EventHub};
pub use crate::mixin::Subscribable;
