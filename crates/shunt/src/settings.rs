use serde::{Deserialize, Serialize};

/// Defaults applied to every repository created by a [`Shunt`](crate::Shunt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Strict flag of new and reset plans.
	pub strict_by_default: bool,
	/// Order weight of recording redirects. The default records every call
	/// before any other redirect sees it.
	pub record_order_weight: i32,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			strict_by_default: false,
			record_order_weight: i32::MAX,
		}
	}
}
