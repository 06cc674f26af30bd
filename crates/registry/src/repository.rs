//! Redirect repository with atomic plan publication.
//!
//! # Role
//!
//! Thread-safe entrypoint for reading and updating the redirect plan of one
//! target. It handles the CAS-based update loop.
//!
//! # Invariants
//!
//! - Concurrent inserts must be linearizable (see `invariants::test_no_lost_inserts`).
//! - Readers only ever observe fully constructed plans.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::plan::RedirectPlan;
use crate::redirect::Redirect;

/// Mutable holder of the current [`RedirectPlan`] for one target identity.
pub struct RedirectRepository<T: ?Sized + 'static> {
	label: &'static str,
	snap: ArcSwap<RedirectPlan<T>>,
	strict_by_default: bool,
}

impl<T: ?Sized + 'static> RedirectRepository<T> {
	pub fn new() -> Self {
		Self::with_strict_default(false)
	}

	/// Creates a repository whose empty and reset plans start with `strict`.
	pub fn with_strict_default(strict: bool) -> Self {
		Self {
			label: std::any::type_name::<T>(),
			snap: ArcSwap::from_pointee(RedirectPlan::empty(strict)),
			strict_by_default: strict,
		}
	}

	/// Returns the current plan. Calls begin against this snapshot.
	#[inline]
	pub fn plan(&self) -> Arc<RedirectPlan<T>> {
		self.snap.load_full()
	}

	/// Inserts one redirect; returns the plan that was published.
	pub fn insert(&self, redirect: Redirect<T>) -> Arc<RedirectPlan<T>> {
		self.insert_many(std::iter::once(redirect))
	}

	/// Inserts several redirects in one publication.
	pub fn insert_many(&self, redirects: impl IntoIterator<Item = Redirect<T>>) -> Arc<RedirectPlan<T>> {
		let redirects: Vec<Arc<Redirect<T>>> = redirects.into_iter().map(Arc::new).collect();
		let count = redirects.len();
		let published = self.update(|plan| plan.insert_many(redirects.iter().cloned()));
		tracing::debug!(target_type = self.label, count, len = published.len(), "redirects inserted");
		published
	}

	/// Toggles strict mode for calls that begin after this returns.
	pub fn set_strict(&self, strict: bool) -> Arc<RedirectPlan<T>> {
		let published = self.update(|plan| plan.with_strict(strict));
		tracing::debug!(target_type = self.label, strict, "strict mode set");
		published
	}

	/// Replaces the plan with an empty one.
	pub fn reset(&self) -> Arc<RedirectPlan<T>> {
		let plan = Arc::new(RedirectPlan::empty(self.strict_by_default));
		self.snap.store(plan.clone());
		tracing::debug!(target_type = self.label, strict = self.strict_by_default, "repository reset");
		plan
	}

	/// Publishes `f(current)` with compare-and-swap, retrying on contention.
	pub fn update(&self, f: impl Fn(&RedirectPlan<T>) -> RedirectPlan<T>) -> Arc<RedirectPlan<T>> {
		loop {
			let cur = self.snap.load_full();
			let next = Arc::new(f(&cur));

			let prev = self.snap.compare_and_swap(&cur, next.clone());
			if Arc::ptr_eq(&prev, &cur) {
				return next;
			}
			// CAS failed, retry with updated plan
		}
	}

	pub fn len(&self) -> usize {
		self.snap.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_strict(&self) -> bool {
		self.snap.load().is_strict()
	}

	pub fn label(&self) -> &'static str {
		self.label
	}
}

impl<T: ?Sized + 'static> Default for RedirectRepository<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: ?Sized + 'static> std::fmt::Debug for RedirectRepository<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedirectRepository")
			.field("label", &self.label)
			.field("plan", &*self.snap.load())
			.finish()
	}
}
