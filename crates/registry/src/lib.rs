//! Redirect registry and dispatch engine.
//!
//! Each intercepted target owns a [`RedirectRepository`] publishing immutable
//! [`RedirectPlan`] snapshots. A proxy call captures the current plan and hands
//! it to the [`Relay`], which walks the matching redirects in order and
//! finally falls through to the root implementation.
//!
//! # Modules
//!
//! - [`constraint`] - Call predicates deciding which redirects apply
//! - [`redirect`] - Redirect definitions and the handler contract
//! - [`plan`] - Ordered, immutable redirect snapshots
//! - [`repository`] - Atomic plan publication per target
//! - [`relay`] - Chain walking, strict mode, root fallthrough
//! - [`record`] - Pass-through call recording
//! - [`set`] - Repositories keyed by target identity

pub mod constraint;
pub mod plan;
pub mod record;
pub mod redirect;
pub mod relay;
pub mod repository;
pub mod set;

#[cfg(test)]
pub(crate) mod invariants;
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use constraint::{
	ArgMatch, ArgsConstraint, CallConstraint, CompositeConstraint, FnConstraint, MatchCost, MethodConstraint,
	ReturnTypeConstraint, TrueConstraint,
};
pub use plan::{PlanEntry, RedirectPlan};
pub use record::{CallStream, Outcome, RecordedCall, Recorder};
pub use redirect::{CallHandler, Redirect, RedirectCall, RedirectOptions};
pub use relay::{Relay, RelayIndex, RelayStack};
pub use repository::RedirectRepository;
pub use set::{RedirectId, RedirectSet};
