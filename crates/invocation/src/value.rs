use std::any::{Any, type_name};
use std::fmt;
use std::future::Future;

use crate::future::CallFuture;
use crate::{Error, Result};

/// Type-erased return value of an intercepted call.
///
/// Redirect handlers and root invokers produce a `Value`; the proxy adapter
/// downcasts it back to the method's declared return type.
pub struct Value {
	inner: Box<dyn Any + Send>,
	type_name: &'static str,
	observe: Option<ObserveFn>,
}

/// Callback receiving the settled outcome of an async method: the output
/// type name on success, the error otherwise.
pub type FutureObserver = Box<dyn FnOnce(Result<&'static str>) + Send>;

type ObserveFn = fn(Box<dyn Any + Send>, FutureObserver) -> Box<dyn Any + Send>;

impl Value {
	pub fn new<R: Send + 'static>(value: R) -> Self {
		Self {
			inner: Box::new(value),
			type_name: type_name::<R>(),
			observe: None,
		}
	}

	/// The value returned by methods without a result.
	pub fn unit() -> Self {
		Self::new(())
	}

	/// Wraps the future of an async method.
	pub fn future<R, F>(fut: F) -> Self
	where
		R: 'static,
		F: Future<Output = Result<R>> + Send + 'static,
	{
		let fut: CallFuture<R> = Box::pin(fut);
		Self {
			observe: Some(wrap_observed::<R>),
			..Self::new(fut)
		}
	}

	/// Returns true if this value wraps the future of an async method.
	pub fn is_future(&self) -> bool {
		self.observe.is_some()
	}

	/// Arranges for `observer` to see the outcome of the wrapped future once
	/// it settles. Non-future values are returned unchanged.
	pub fn observe_future(self, observer: impl FnOnce(Result<&'static str>) + Send + 'static) -> Self {
		match self.observe {
			Some(observe) => Self {
				inner: observe(self.inner, Box::new(observer)),
				..self
			},
			None => self,
		}
	}

	/// Name of the contained type, for diagnostics.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub fn is<R: 'static>(&self) -> bool {
		self.inner.is::<R>()
	}

	pub fn downcast_ref<R: 'static>(&self) -> Option<&R> {
		self.inner.downcast_ref::<R>()
	}

	/// Takes the contained value out as `R`.
	pub fn downcast<R: 'static>(self) -> Result<R> {
		let found = self.type_name;
		self.inner.downcast::<R>().map(|boxed| *boxed).map_err(|_| Error::ReturnType {
			expected: type_name::<R>(),
			found,
		})
	}

	/// Takes the contained async method future out.
	pub fn into_future<R: 'static>(self) -> Result<CallFuture<R>> {
		self.downcast::<CallFuture<R>>()
	}
}

fn wrap_observed<R: 'static>(inner: Box<dyn Any + Send>, observer: FutureObserver) -> Box<dyn Any + Send> {
	match inner.downcast::<CallFuture<R>>() {
		Ok(fut) => {
			let fut = *fut;
			let observed: CallFuture<R> = Box::pin(async move {
				let result = fut.await;
				observer(result.as_ref().map(|_| type_name::<R>()).map_err(Clone::clone));
				result
			});
			Box::new(observed)
		}
		Err(inner) => inner,
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Value").field("type", &self.type_name).finish_non_exhaustive()
	}
}
