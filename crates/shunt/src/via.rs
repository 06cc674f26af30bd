use std::fmt;
use std::sync::Arc;

use shunt_invocation::Method;
use shunt_registry::{CallStream, Redirect, RedirectId, RedirectPlan, RedirectRepository, ReturnTypeConstraint};

use crate::builder::RedirectBuilder;
use crate::proxy::{CallSink, ProxyTarget};
use crate::settings::Settings;

/// Handle on the redirects of one target identity.
///
/// Every `Via` for the same identity shares one repository, so redirects added
/// through any of them apply to every proxy created from any of them.
pub struct Via<T: ?Sized + 'static> {
	id: RedirectId,
	repository: Arc<RedirectRepository<T>>,
	settings: Settings,
}

impl<T: ?Sized + 'static> Clone for Via<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id.clone(),
			repository: self.repository.clone(),
			settings: self.settings,
		}
	}
}

impl<T: ?Sized + Send + Sync + 'static> Via<T> {
	pub(crate) fn new(id: RedirectId, repository: Arc<RedirectRepository<T>>, settings: Settings) -> Self {
		Self { id, repository, settings }
	}

	pub fn id(&self) -> &RedirectId {
		&self.id
	}

	pub fn repository(&self) -> &Arc<RedirectRepository<T>> {
		&self.repository
	}

	/// Current plan snapshot.
	pub fn plan(&self) -> Arc<RedirectPlan<T>> {
		self.repository.plan()
	}

	/// Starts a redirect for calls to `method`.
	pub fn to(&self, method: &'static Method<T>) -> RedirectBuilder<T> {
		self.builder().for_method(method)
	}

	/// Starts a redirect for every call.
	pub fn to_all(&self) -> RedirectBuilder<T> {
		self.builder()
	}

	/// Starts a redirect for calls to methods declaring return type `R`.
	pub fn to_return<R: 'static>(&self) -> RedirectBuilder<T> {
		self.builder().constraint(ReturnTypeConstraint::of::<R>())
	}

	/// Registers a prebuilt redirect.
	pub fn insert(&self, redirect: Redirect<T>) -> &Self {
		self.repository.insert(redirect);
		self
	}

	/// Records every call made through proxies of this target.
	pub fn record(&self) -> CallStream<T> {
		self.to_all().record()
	}

	/// Toggles strict mode for calls beginning after this returns.
	pub fn strict(&self, strict: bool) -> &Self {
		self.repository.set_strict(strict);
		self
	}

	/// Drops every redirect and restores the default strictness.
	pub fn reset(&self) -> &Self {
		self.repository.reset();
		self
	}

	/// A sink for hand-built proxies.
	///
	/// The adapter must bind the sink with [`CallSink::with_proxy`]; calls
	/// through an unbound sink fail with [`Error::UnboundSink`](crate::Error::UnboundSink).
	pub fn sink(&self, root: Option<Arc<T>>) -> CallSink<T> {
		CallSink::new(self.repository.clone(), root)
	}

	fn builder(&self) -> RedirectBuilder<T> {
		RedirectBuilder::new(self.repository.clone(), self.settings.record_order_weight)
	}
}

impl<T: ProxyTarget + ?Sized> Via<T> {
	/// Creates a proxy whose unmatched calls fall through to `root`.
	pub fn proxy(&self, root: Arc<T>) -> Arc<T> {
		T::proxy(self.sink(Some(root)))
	}

	/// Creates a proxy with no root; unmatched calls fail with `NullRoot`.
	pub fn proxy_without_root(&self) -> Arc<T> {
		T::proxy(self.sink(None))
	}
}

impl<T: ?Sized + 'static> fmt::Debug for Via<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Via")
			.field("id", &self.id)
			.field("plan", &*self.repository.plan())
			.finish()
	}
}
