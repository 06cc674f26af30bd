//! Fluent redirect registration.

use std::fmt;
use std::sync::Arc;

use shunt_invocation::{Bound, CallInfo, Error, FromCallArgs, Method, Result, Value};
use shunt_registry::{
	ArgMatch, ArgsConstraint, CallConstraint, CallHandler, CallStream, CompositeConstraint, FnConstraint, MethodConstraint, Recorder,
	Redirect, RedirectCall, RedirectOptions, RedirectPlan, RedirectRepository,
};

/// Collects a constraint and options, then registers one redirect.
///
/// Obtained from [`Via::to`](crate::Via::to), [`Via::to_all`](crate::Via::to_all)
/// or [`Via::to_return`](crate::Via::to_return). Constraints are validated
/// against the method's parameters when they are added, so a mismatched
/// matcher fails at registration rather than silently never matching.
pub struct RedirectBuilder<T: ?Sized + 'static> {
	repository: Arc<RedirectRepository<T>>,
	method: Option<&'static Method<T>>,
	constraint: CompositeConstraint<T>,
	options: RedirectOptions,
	record_weight: i32,
}

impl<T: ?Sized + Send + Sync + 'static> RedirectBuilder<T> {
	pub(crate) fn new(repository: Arc<RedirectRepository<T>>, record_weight: i32) -> Self {
		Self {
			repository,
			method: None,
			constraint: CompositeConstraint::new(),
			options: RedirectOptions::default(),
			record_weight,
		}
	}

	pub(crate) fn for_method(mut self, method: &'static Method<T>) -> Self {
		self.method = Some(method);
		self.constraint(MethodConstraint::new(method))
	}

	/// Adds a positional argument constraint for the selected method.
	pub fn args(self, matches: impl IntoIterator<Item = ArgMatch>) -> Result<Self> {
		let Some(method) = self.method else {
			return Err(Error::Constraint {
				method: "<any>",
				reason: "argument matchers require a method; use `Via::to`".into(),
			});
		};
		let args = ArgsConstraint::new(method, matches)?;
		Ok(self.constraint(args))
	}

	/// Adds a closure constraint over the whole call.
	pub fn matching(self, predicate: impl Fn(&CallInfo<T>) -> bool + Send + Sync + 'static) -> Self {
		self.constraint(FnConstraint::new(predicate))
	}

	/// Adds an arbitrary constraint.
	pub fn constraint(mut self, constraint: impl CallConstraint<T> + 'static) -> Self {
		self.constraint = self.constraint.add_constraint(Arc::new(constraint));
		self
	}

	pub fn weight(mut self, order_weight: i32) -> Self {
		self.options.order_weight = order_weight;
		self
	}

	/// Marks the redirect as not counting toward strict satisfaction.
	pub fn exempt_from_strict(mut self) -> Self {
		self.options.strict_exempt = true;
		self
	}

	/// Builds the redirect without registering it.
	pub fn build(self, handler: impl CallHandler<T> + 'static) -> Redirect<T> {
		Redirect::with_handler(handler, self.constraint).with_options(self.options)
	}

	/// Registers `handler`.
	pub fn redirect<F>(self, handler: F) -> Arc<RedirectPlan<T>>
	where
		F: Fn(RedirectCall<T>) -> Result<Value> + Send + Sync + 'static,
	{
		self.register(handler)
	}

	/// Registers a handler type such as a custom struct implementing [`CallHandler`].
	pub fn redirect_with(self, handler: impl CallHandler<T> + 'static) -> Arc<RedirectPlan<T>> {
		self.register(handler)
	}

	/// Registers a handler receiving typed arguments.
	///
	/// `Ref` elements are written back to their slots when the handler returns,
	/// on success and on error. Call [`Bound::write_back`] before forwarding if
	/// downstream redirects must see the new values.
	pub fn redirect_bound<A, F>(self, handler: F) -> Result<Arc<RedirectPlan<T>>>
	where
		A: FromCallArgs + 'static,
		F: Fn(&mut Bound<A>, &RedirectCall<T>) -> Result<Value> + Send + Sync + 'static,
	{
		if let Some(method) = self.method
			&& method.arity() != A::ARITY
		{
			return Err(Error::Constraint {
				method: method.name(),
				reason: format!("handler binds {} arguments, method takes {}", A::ARITY, method.arity()),
			});
		}
		Ok(self.register(move |call: RedirectCall<T>| {
			let mut bound = Bound::<A>::bind(call.args())?;
			handler(&mut bound, &call)
		}))
	}

	/// Forwards matching calls to another implementation of `T`.
	pub fn retarget(self, target: Arc<T>) -> Arc<RedirectPlan<T>> {
		self.register(move |call: RedirectCall<T>| call.info().invoke_on(&*target))
	}

	/// Answers matching calls with `value()` without forwarding.
	pub fn returns<R, F>(self, value: F) -> Result<Arc<RedirectPlan<T>>>
	where
		R: Send + 'static,
		F: Fn() -> R + Send + Sync + 'static,
	{
		if let Some(method) = self.method
			&& !method.returns().is::<R>()
		{
			return Err(Error::Constraint {
				method: method.name(),
				reason: format!("returns `{}`, not `{}`", method.returns().type_name(), std::any::type_name::<R>()),
			});
		}
		Ok(self.register(move |_: RedirectCall<T>| Ok(Value::new(value()))))
	}

	/// Records matching calls without altering them.
	pub fn record(self) -> CallStream<T> {
		let recorder = Recorder::new();
		let stream = recorder.stream();
		let options = RedirectOptions::weight(self.record_weight).exempt();
		let repository = self.repository.clone();
		repository.insert(Redirect::with_handler(recorder, self.constraint).with_options(options));
		tracing::debug!(target_type = repository.label(), weight = options.order_weight, "recorder registered");
		stream
	}

	fn register(self, handler: impl CallHandler<T> + 'static) -> Arc<RedirectPlan<T>> {
		let repository = self.repository.clone();
		repository.insert(self.build(handler))
	}
}

impl<T: ?Sized + 'static> fmt::Debug for RedirectBuilder<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RedirectBuilder")
			.field("method", &self.method.map(Method::name))
			.field("constraints", &self.constraint.len())
			.field("options", &self.options)
			.finish()
	}
}

