//! Immutable, ordered redirect snapshots.
//!
//! # Role
//!
//! A [`RedirectPlan`] is the value published by a
//! [`RedirectRepository`](crate::repository::RedirectRepository). Every
//! mutation produces a new plan; an in-flight call keeps walking the plan it
//! captured at begin.
//!
//! # Invariants
//!
//! - Redirects are ordered by `(order_weight, insertion sequence)` descending,
//!   so equal weights dispatch most-recently-inserted first.
//! - A plan is never mutated after construction (see `invariants::test_plan_immutability`).

use std::sync::Arc;

use shunt_invocation::CallInfo;

use crate::redirect::Redirect;

/// A redirect tagged with its insertion sequence.
pub struct PlanEntry<T: ?Sized + 'static> {
	sequence: u64,
	redirect: Arc<Redirect<T>>,
}

impl<T: ?Sized + 'static> Clone for PlanEntry<T> {
	fn clone(&self) -> Self {
		Self {
			sequence: self.sequence,
			redirect: self.redirect.clone(),
		}
	}
}

impl<T: ?Sized + 'static> PlanEntry<T> {
	pub fn sequence(&self) -> u64 {
		self.sequence
	}

	pub fn redirect(&self) -> &Arc<Redirect<T>> {
		&self.redirect
	}

	fn ranks_before(&self, other: &Self) -> bool {
		(self.redirect.order_weight(), self.sequence) > (other.redirect.order_weight(), other.sequence)
	}
}

/// Ordered snapshot of the redirects registered for one target.
pub struct RedirectPlan<T: ?Sized + 'static> {
	entries: Arc<[PlanEntry<T>]>,
	strict: bool,
	next_sequence: u64,
}

impl<T: ?Sized + 'static> Clone for RedirectPlan<T> {
	fn clone(&self) -> Self {
		Self {
			entries: self.entries.clone(),
			strict: self.strict,
			next_sequence: self.next_sequence,
		}
	}
}

impl<T: ?Sized + 'static> Default for RedirectPlan<T> {
	fn default() -> Self {
		Self::empty(false)
	}
}

impl<T: ?Sized + 'static> RedirectPlan<T> {
	pub fn empty(strict: bool) -> Self {
		Self {
			entries: Arc::from(Vec::new()),
			strict,
			next_sequence: 0,
		}
	}

	/// Returns a new plan with `redirect` inserted at its ordered position.
	pub fn insert(&self, redirect: Arc<Redirect<T>>) -> Self {
		self.insert_many(std::iter::once(redirect))
	}

	/// Returns a new plan with every redirect inserted in iteration order.
	pub fn insert_many(&self, redirects: impl IntoIterator<Item = Arc<Redirect<T>>>) -> Self {
		let mut entries = self.entries.to_vec();
		let mut next_sequence = self.next_sequence;
		for redirect in redirects {
			let entry = PlanEntry {
				sequence: next_sequence,
				redirect,
			};
			next_sequence += 1;
			let pos = entries.partition_point(|e| e.ranks_before(&entry));
			entries.insert(pos, entry);
		}
		Self {
			entries: Arc::from(entries),
			strict: self.strict,
			next_sequence,
		}
	}

	/// Returns a new plan with the strict flag set to `strict`.
	pub fn with_strict(&self, strict: bool) -> Self {
		Self {
			strict,
			..self.clone()
		}
	}

	pub fn is_strict(&self) -> bool {
		self.strict
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn entries(&self) -> &[PlanEntry<T>] {
		&self.entries
	}

	/// Redirects in dispatch order.
	pub fn redirects(&self) -> impl Iterator<Item = &Arc<Redirect<T>>> + '_ {
		self.entries.iter().map(PlanEntry::redirect)
	}

	pub fn redirect(&self, index: usize) -> Option<&Arc<Redirect<T>>> {
		self.entries.get(index).map(PlanEntry::redirect)
	}

	/// Index of the first redirect at or after `from` whose constraint matches `call`.
	pub fn find_from(&self, from: usize, call: &CallInfo<T>) -> Option<usize> {
		self.entries
			.get(from..)?
			.iter()
			.position(|entry| entry.redirect.is_match(call))
			.map(|offset| from + offset)
	}
}

impl<T: ?Sized + 'static> std::fmt::Debug for RedirectPlan<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedirectPlan")
			.field("len", &self.entries.len())
			.field("strict", &self.strict)
			.field(
				"order",
				&self
					.entries
					.iter()
					.map(|e| (e.redirect.order_weight(), e.sequence))
					.collect::<Vec<_>>(),
			)
			.finish()
	}
}

#[cfg(test)]
mod tests;
