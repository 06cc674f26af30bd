//! Redirect definitions: a handler, the constraint selecting its calls, and
//! ordering metadata.

use std::fmt;
use std::sync::Arc;

use shunt_invocation::{CallArgs, CallInfo, Result, Value};

use crate::constraint::{CallConstraint, TrueConstraint};
use crate::relay::Relay;

/// Substitute behaviour invoked for matching calls.
pub trait CallHandler<T: ?Sized + 'static>: Send + Sync {
	fn handle(&self, call: RedirectCall<T>) -> Result<Value>;
}

impl<T, F> CallHandler<T> for F
where
	T: ?Sized + 'static,
	F: Fn(RedirectCall<T>) -> Result<Value> + Send + Sync,
{
	fn handle(&self, call: RedirectCall<T>) -> Result<Value> {
		self(call)
	}
}

/// Ordering and strict-mode metadata of a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedirectOptions {
	/// Larger weights dispatch first; `i32::MAX` forces first, `i32::MIN` last.
	pub order_weight: i32,
	/// Matching this redirect does not satisfy strict mode (recorders, pass-throughs).
	pub strict_exempt: bool,
}

impl RedirectOptions {
	pub fn weight(order_weight: i32) -> Self {
		Self {
			order_weight,
			..Self::default()
		}
	}

	pub fn exempt(mut self) -> Self {
		self.strict_exempt = true;
		self
	}
}

/// A registered interception rule. Immutable once built.
pub struct Redirect<T: ?Sized + 'static> {
	handler: Arc<dyn CallHandler<T>>,
	constraint: Arc<dyn CallConstraint<T>>,
	options: RedirectOptions,
}

impl<T: ?Sized + 'static> Redirect<T> {
	pub fn new<F>(handler: F, constraint: impl CallConstraint<T> + 'static) -> Self
	where
		F: Fn(RedirectCall<T>) -> Result<Value> + Send + Sync + 'static,
	{
		Self::with_handler(handler, constraint)
	}

	/// Redirect applying to every call.
	pub fn any<F>(handler: F) -> Self
	where
		F: Fn(RedirectCall<T>) -> Result<Value> + Send + Sync + 'static,
	{
		Self::with_handler(handler, TrueConstraint)
	}

	/// Builds a redirect around a handler type, e.g. a [`Recorder`](crate::record::Recorder).
	pub fn with_handler(handler: impl CallHandler<T> + 'static, constraint: impl CallConstraint<T> + 'static) -> Self {
		Self::from_parts(Arc::new(handler), Arc::new(constraint), RedirectOptions::default())
	}

	pub fn from_parts(handler: Arc<dyn CallHandler<T>>, constraint: Arc<dyn CallConstraint<T>>, options: RedirectOptions) -> Self {
		Self {
			handler,
			constraint,
			options,
		}
	}

	pub fn with_options(mut self, options: RedirectOptions) -> Self {
		self.options = options;
		self
	}

	pub fn is_match(&self, call: &CallInfo<T>) -> bool {
		self.constraint.is_match(call)
	}

	pub fn handler(&self) -> &Arc<dyn CallHandler<T>> {
		&self.handler
	}

	pub fn constraint(&self) -> &Arc<dyn CallConstraint<T>> {
		&self.constraint
	}

	pub fn options(&self) -> RedirectOptions {
		self.options
	}

	pub fn order_weight(&self) -> i32 {
		self.options.order_weight
	}

	pub fn is_strict_exempt(&self) -> bool {
		self.options.strict_exempt
	}
}

impl<T: ?Sized + 'static> fmt::Debug for Redirect<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Redirect").field("options", &self.options).finish_non_exhaustive()
	}
}

/// Argument passed to a handler: the call at this chain position plus the
/// relay handle used to forward it.
///
/// Owned and cheap to clone, so a handler returning a future can move it into
/// the future and forward after suspension.
pub struct RedirectCall<T: ?Sized + 'static> {
	relay: Relay<T>,
	redirect: Arc<Redirect<T>>,
}

impl<T: ?Sized + 'static> Clone for RedirectCall<T> {
	fn clone(&self) -> Self {
		Self {
			relay: self.relay.clone(),
			redirect: self.redirect.clone(),
		}
	}
}

impl<T: ?Sized + 'static> RedirectCall<T> {
	pub(crate) fn new(relay: Relay<T>, redirect: Arc<Redirect<T>>) -> Self {
		Self { relay, redirect }
	}

	pub fn relay(&self) -> &Relay<T> {
		&self.relay
	}

	/// The redirect being invoked.
	pub fn redirect(&self) -> &Arc<Redirect<T>> {
		&self.redirect
	}

	/// The call as seen at this chain position.
	pub fn info(&self) -> &CallInfo<T> {
		self.relay.call()
	}

	pub fn args(&self) -> &CallArgs {
		self.relay.call().args()
	}

	/// Forwards the unchanged call to the next matching redirect.
	pub fn call_next(&self) -> Result<Value> {
		self.relay.call_next()
	}

	/// Forwards with replacement arguments.
	pub fn call_next_args(&self, args: CallArgs) -> Result<Value> {
		self.relay.call_next_args(args)
	}

	/// Invokes the root implementation, skipping the rest of the chain.
	pub fn call_root(&self) -> Result<Value> {
		self.relay.call_root()
	}

	pub fn call_root_args(&self, args: CallArgs) -> Result<Value> {
		self.relay.call_root_args(args)
	}
}

impl<T: ?Sized + 'static> fmt::Debug for RedirectCall<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RedirectCall")
			.field("call", self.info())
			.field("position", &self.relay.position())
			.finish()
	}
}
