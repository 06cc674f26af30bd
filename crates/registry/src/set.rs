//! Repositories keyed by target identity.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;

use crate::repository::RedirectRepository;

/// Identity of an intercepted target: its type plus an optional name, so one
/// trait can carry several independent redirect plans.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RedirectId {
	type_id: TypeId,
	type_name: &'static str,
	name: Option<Arc<str>>,
}

impl RedirectId {
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			type_id: TypeId::of::<T>(),
			type_name: type_name::<T>(),
			name: None,
		}
	}

	pub fn named<T: ?Sized + 'static>(name: impl Into<Arc<str>>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::of::<T>()
		}
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}
}

impl fmt::Debug for RedirectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "{}#{name}", self.type_name),
			None => f.write_str(self.type_name),
		}
	}
}

/// Type-erased view of a repository for set-wide operations.
trait ErasedRepository: Send + Sync {
	fn reset(&self);

	fn set_strict(&self, strict: bool);

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: ?Sized + 'static> ErasedRepository for RedirectRepository<T> {
	fn reset(&self) {
		RedirectRepository::reset(self);
	}

	fn set_strict(&self, strict: bool) {
		RedirectRepository::set_strict(self, strict);
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}

/// All redirect repositories of one test context.
///
/// `strict_by_default` is what new and reset plans start with; `strict`
/// tracks the last [`RedirectSet::strict_all`] so repositories created
/// afterwards pick it up too.
pub struct RedirectSet {
	repos: RwLock<HashMap<RedirectId, Arc<dyn ErasedRepository>>>,
	strict_by_default: bool,
	strict: AtomicBool,
}

impl Default for RedirectSet {
	fn default() -> Self {
		Self::new(false)
	}
}

impl RedirectSet {
	pub fn new(strict_by_default: bool) -> Self {
		Self {
			repos: RwLock::new(HashMap::default()),
			strict_by_default,
			strict: AtomicBool::new(strict_by_default),
		}
	}

	/// Returns the repository for `id`, creating it on first use.
	///
	/// Returns `None` if `id` names a different type than `T`.
	pub fn get_or_create<T: ?Sized + 'static>(&self, id: &RedirectId) -> Option<Arc<RedirectRepository<T>>> {
		if id.type_id != TypeId::of::<T>() {
			return None;
		}
		if let Some(repo) = self.repos.read().get(id) {
			return repo.clone().into_any().downcast::<RedirectRepository<T>>().ok();
		}
		let repo = self
			.repos
			.write()
			.entry(id.clone())
			.or_insert_with(|| {
				tracing::debug!(target_id = ?id, "redirect repository created");
				self.create::<T>()
			})
			.clone();
		repo.into_any().downcast::<RedirectRepository<T>>().ok()
	}

	/// Returns the unnamed repository of `T`.
	pub fn repository<T: ?Sized + 'static>(&self) -> Arc<RedirectRepository<T>> {
		self.typed(RedirectId::of::<T>())
	}

	/// Returns the repository of `T` registered under `name`.
	pub fn named_repository<T: ?Sized + 'static>(&self, name: impl Into<Arc<str>>) -> Arc<RedirectRepository<T>> {
		self.typed(RedirectId::named::<T>(name))
	}

	fn typed<T: ?Sized + 'static>(&self, id: RedirectId) -> Arc<RedirectRepository<T>> {
		// `id` is built from `T`, so the downcast cannot fail.
		self.get_or_create::<T>(&id).unwrap_or_else(|| self.create::<T>())
	}

	fn create<T: ?Sized + 'static>(&self) -> Arc<RedirectRepository<T>> {
		let repo = RedirectRepository::<T>::with_strict_default(self.strict_by_default);
		let strict = self.strict.load(Ordering::Acquire);
		if strict != self.strict_by_default {
			repo.set_strict(strict);
		}
		Arc::new(repo)
	}

	pub fn contains(&self, id: &RedirectId) -> bool {
		self.repos.read().contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.repos.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.repos.read().is_empty()
	}

	/// Resets every repository in the set and drops any [`RedirectSet::strict_all`] override.
	pub fn reset_all(&self) {
		self.strict.store(self.strict_by_default, Ordering::Release);
		let repos: Vec<_> = self.repos.read().values().cloned().collect();
		for repo in &repos {
			repo.reset();
		}
		tracing::debug!(count = repos.len(), "redirect set reset");
	}

	/// Sets strict mode on every repository in the set, including ones
	/// created later. Reset plans still start from `strict_by_default`.
	pub fn strict_all(&self, strict: bool) {
		self.strict.store(strict, Ordering::Release);
		for repo in self.repos.read().values() {
			repo.set_strict(strict);
		}
	}
}

impl fmt::Debug for RedirectSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.repos.read().keys()).finish()
	}
}

#[cfg(test)]
mod tests;
