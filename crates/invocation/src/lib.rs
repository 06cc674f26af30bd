//! Canonical call model for intercepted trait invocations.
//!
//! Every proxy adapter converts a trait method call into a [`CallInfo`]
//! (method descriptor, argument vector, proxy and root references) before it
//! is handed to the dispatch engine, and every handler or root produces a
//! type-erased [`Value`] in return.

/// Argument vector and by-reference slots.
pub mod args;
/// Typed fixed-arity argument binding.
pub mod bind;
/// Immutable call records.
pub mod call;
/// Error taxonomy shared by the call model and the relay.
pub mod error;
/// Async method future aliases.
pub mod future;
/// Method, parameter and return descriptors.
pub mod method;
/// Type-erased return values.
pub mod value;

pub use args::{Arg, ArgValue, CallArgs, RefSlot};
pub use bind::{BindArg, Bound, FromCallArgs, Ref};
pub use call::CallInfo;
pub use error::{Error, Result};
pub use future::{BoxFutureStatic, CallFuture};
pub use method::{Invoker, Method, MethodId, Param, ParamKind, Returns};
pub use value::{FutureObserver, Value};
