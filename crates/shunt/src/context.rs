use std::sync::Arc;

use shunt_registry::{RedirectId, RedirectSet};

use crate::settings::Settings;
use crate::via::Via;

/// A redirect context: one repository per target identity, shared by every
/// [`Via`] obtained from it.
#[derive(Debug, Default)]
pub struct Shunt {
	set: RedirectSet,
	settings: Settings,
}

impl Shunt {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_settings(settings: Settings) -> Self {
		tracing::debug!(?settings, "shunt context created");
		Self {
			set: RedirectSet::new(settings.strict_by_default),
			settings,
		}
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Handle on the unnamed redirects of `T`.
	pub fn via<T: ?Sized + Send + Sync + 'static>(&self) -> Via<T> {
		Via::new(RedirectId::of::<T>(), self.set.repository::<T>(), self.settings)
	}

	/// Handle on the redirects of `T` registered under `name`, independent of
	/// the unnamed ones.
	pub fn via_named<T: ?Sized + Send + Sync + 'static>(&self, name: impl Into<Arc<str>>) -> Via<T> {
		let name = name.into();
		Via::new(RedirectId::named::<T>(name.clone()), self.set.named_repository::<T>(name), self.settings)
	}

	/// Resets every target's plan and clears a previous [`Shunt::strict_all`].
	pub fn reset_all(&self) {
		self.set.reset_all();
	}

	/// Sets strict mode on every target, including targets first used later.
	pub fn strict_all(&self, strict: bool) {
		self.set.strict_all(strict);
	}

	pub fn redirect_set(&self) -> &RedirectSet {
		&self.set
	}
}
