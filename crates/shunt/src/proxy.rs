//! Proxy adapter seam.
//!
//! An adapter is a hand-written implementation of the intercepted trait that
//! forwards each method into its [`CallSink`]. Implementing [`ProxyTarget`] for
//! the trait object type lets a [`Via`](crate::Via) hand out proxies:
//!
//! ```ignore
//! struct GreeterProxy {
//! 	sink: CallSink<dyn Greeter>,
//! }
//!
//! impl Greeter for GreeterProxy {
//! 	fn greet(&self, name: &str) -> Result<String> {
//! 		self.sink.call_as(&GREET, CallArgs::new().with(name.to_owned()))
//! 	}
//! }
//!
//! impl ProxyTarget for dyn Greeter {
//! 	fn proxy(sink: CallSink<Self>) -> Arc<Self> {
//! 		Arc::new_cyclic(|me: &Weak<GreeterProxy>| GreeterProxy { sink: sink.with_proxy(me.clone()) })
//! 	}
//! }
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use shunt_invocation::{CallArgs, CallFuture, CallInfo, Error, Method, Result, Value};
use shunt_registry::{Relay, RedirectRepository};

/// Trait object types that have a proxy adapter.
pub trait ProxyTarget: Send + Sync + 'static {
	/// Builds a proxy forwarding every call into `sink`.
	fn proxy(sink: CallSink<Self>) -> Arc<Self>;
}

/// Entry point of proxied calls: turns a method call into a [`CallInfo`] and
/// dispatches it against the repository's current plan.
pub struct CallSink<T: ?Sized + 'static> {
	repository: Arc<RedirectRepository<T>>,
	root: Option<Arc<T>>,
	proxy: Option<Weak<T>>,
}

impl<T: ?Sized + 'static> Clone for CallSink<T> {
	fn clone(&self) -> Self {
		Self {
			repository: self.repository.clone(),
			root: self.root.clone(),
			proxy: self.proxy.clone(),
		}
	}
}

impl<T: ?Sized + 'static> CallSink<T> {
	pub fn new(repository: Arc<RedirectRepository<T>>, root: Option<Arc<T>>) -> Self {
		Self {
			repository,
			root,
			proxy: None,
		}
	}

	/// Binds the sink to the proxy instance it serves.
	pub fn with_proxy(mut self, proxy: Weak<T>) -> Self {
		self.proxy = Some(proxy);
		self
	}

	pub fn root(&self) -> Option<&Arc<T>> {
		self.root.as_ref()
	}

	pub fn repository(&self) -> &Arc<RedirectRepository<T>> {
		&self.repository
	}

	/// Dispatches one call to `method`.
	pub fn call(&self, method: &'static Method<T>, args: CallArgs) -> Result<Value> {
		method.check_args(&args)?;
		let proxy = self
			.proxy
			.as_ref()
			.ok_or(Error::UnboundSink { method: method.name() })?
			.upgrade()
			.ok_or(Error::ProxyDropped)?;
		let call = CallInfo::new(proxy, self.root.clone(), method, args);
		Relay::begin(self.repository.plan(), call)
	}

	/// Dispatches and downcasts the result to the method's return type.
	pub fn call_as<R: 'static>(&self, method: &'static Method<T>, args: CallArgs) -> Result<R> {
		self.call(method, args)?.downcast()
	}

	/// Dispatches an async method. Dispatch errors surface when the future is awaited.
	pub fn call_async<R: Send + 'static>(&self, method: &'static Method<T>, args: CallArgs) -> CallFuture<R> {
		match self.call(method, args).and_then(Value::into_future) {
			Ok(fut) => fut,
			Err(err) => Box::pin(std::future::ready(Err(err))),
		}
	}
}

impl<T: ?Sized + 'static> fmt::Debug for CallSink<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallSink")
			.field("target", &self.repository.label())
			.field("has_root", &self.root.is_some())
			.field("bound", &self.proxy.is_some())
			.finish()
	}
}
