//! Call redirection for test doubles.
//!
//! A [`Shunt`] hands out [`Via`] handles, one per intercepted trait. A `Via`
//! creates proxies of the trait and registers redirects that substitute,
//! record or forward the calls made through them:
//!
//! ```ignore
//! let shunt = Shunt::new();
//! let via = shunt.via::<dyn Greeter>();
//! let greeter = via.proxy(Arc::new(RealGreeter));
//!
//! via.to(&GREET).redirect(|call| {
//! 	let name = call.args().value::<String>(0)?;
//! 	Ok(Value::new(format!("hi {name}")))
//! });
//! assert_eq!(greeter.greet("bob")?, "hi bob");
//! ```
//!
//! The call model lives in [`shunt_invocation`], the dispatch engine in
//! [`shunt_registry`]; both are re-exported here.

mod builder;
mod context;
mod proxy;
mod settings;
mod via;

pub use builder::RedirectBuilder;
pub use context::Shunt;
pub use proxy::{CallSink, ProxyTarget};
pub use settings::Settings;
pub use shunt_invocation::{
	Arg, BindArg, Bound, CallArgs, CallFuture, CallInfo, Error, FromCallArgs, Method, MethodId, Param, Ref, RefSlot, Result, Returns,
	Value,
};
pub use shunt_registry::{
	ArgMatch, CallConstraint, CallHandler, CallStream, Outcome, RecordedCall, Redirect, RedirectCall, RedirectId, RedirectOptions,
	RedirectPlan, Relay,
};
pub use via::Via;
pub use {shunt_invocation, shunt_registry};
