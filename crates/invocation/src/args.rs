//! Argument vector of an intercepted call.
//!
//! Plain arguments are shared, immutable values. By-reference (`&mut`)
//! arguments are [`RefSlot`]s: a shared mutable cell the proxy adapter fills
//! before dispatch and copies back into the caller's place afterwards.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{Error, Result};

/// Shared, type-erased argument value.
pub type ArgValue = Arc<dyn Any + Send + Sync>;

struct Stored {
	value: ArgValue,
	type_name: &'static str,
}

/// Mutable cell backing a by-reference argument.
///
/// Clones share the same cell, so a value written by any handler in the chain
/// is visible to the proxy adapter once the call returns.
#[derive(Clone)]
pub struct RefSlot {
	cell: Arc<Mutex<Stored>>,
}

impl RefSlot {
	pub fn new<V: Send + Sync + 'static>(value: V) -> Self {
		Self {
			cell: Arc::new(Mutex::new(Stored {
				value: Arc::new(value),
				type_name: type_name::<V>(),
			})),
		}
	}

	/// Returns a clone of the current value if it has type `V`.
	pub fn get<V: Clone + 'static>(&self) -> Option<V> {
		self.cell.lock().value.downcast_ref::<V>().cloned()
	}

	/// Replaces the current value.
	pub fn set<V: Send + Sync + 'static>(&self, value: V) {
		let mut stored = self.cell.lock();
		stored.value = Arc::new(value);
		stored.type_name = type_name::<V>();
	}

	pub fn type_name(&self) -> &'static str {
		self.cell.lock().type_name
	}

	/// Runs `f` against the current value without cloning it.
	pub fn inspect<R>(&self, f: impl FnOnce(&(dyn Any + Send + Sync)) -> R) -> R {
		let value = self.cell.lock().value.clone();
		f(&*value)
	}

	/// Returns true if both handles share one cell.
	pub fn ptr_eq(&self, other: &RefSlot) -> bool {
		Arc::ptr_eq(&self.cell, &other.cell)
	}
}

impl fmt::Debug for RefSlot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RefSlot").field(&self.type_name()).finish()
	}
}

/// One slot of the argument vector.
#[derive(Clone)]
pub enum Arg {
	/// Passed by value (or by shared reference).
	Val { value: ArgValue, type_name: &'static str },
	/// Passed by mutable reference.
	Ref(RefSlot),
}

impl Arg {
	pub fn val<V: Send + Sync + 'static>(value: V) -> Self {
		Self::Val {
			value: Arc::new(value),
			type_name: type_name::<V>(),
		}
	}

	pub fn is_ref(&self) -> bool {
		matches!(self, Self::Ref(_))
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Val { type_name, .. } => *type_name,
			Self::Ref(slot) => slot.type_name(),
		}
	}

	/// Runs `f` against the current value of this slot.
	pub fn inspect<R>(&self, f: impl FnOnce(&(dyn Any + Send + Sync)) -> R) -> R {
		match self {
			Self::Val { value, .. } => f(&**value),
			Self::Ref(slot) => slot.inspect(f),
		}
	}

	/// Returns a clone of the current value if it has type `V`.
	pub fn get<V: Clone + 'static>(&self) -> Option<V> {
		match self {
			Self::Val { value, .. } => value.downcast_ref::<V>().cloned(),
			Self::Ref(slot) => slot.get::<V>(),
		}
	}

	pub fn as_slot(&self) -> Option<&RefSlot> {
		match self {
			Self::Ref(slot) => Some(slot),
			Self::Val { .. } => None,
		}
	}
}

impl fmt::Debug for Arg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Val { type_name, .. } => f.debug_tuple("Val").field(type_name).finish(),
			Self::Ref(slot) => f.debug_tuple("Ref").field(&slot.type_name()).finish(),
		}
	}
}

/// Ordered argument vector of one call.
#[derive(Clone, Default, Debug)]
pub struct CallArgs {
	slots: SmallVec<[Arg; 4]>,
}

impl CallArgs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a by-value argument.
	pub fn with<V: Send + Sync + 'static>(mut self, value: V) -> Self {
		self.slots.push(Arg::val(value));
		self
	}

	/// Appends a by-reference argument backed by `slot`.
	pub fn with_ref(mut self, slot: RefSlot) -> Self {
		self.slots.push(Arg::Ref(slot));
		self
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&Arg> {
		self.slots.get(index)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arg> + '_ {
		self.slots.iter()
	}

	/// Returns the slot at `index` or an [`Error::ArgumentIndex`].
	pub fn arg(&self, index: usize) -> Result<&Arg> {
		self.slots.get(index).ok_or(Error::ArgumentIndex { index, len: self.slots.len() })
	}

	/// Returns a clone of argument `index` as `V`.
	pub fn value<V: Clone + 'static>(&self, index: usize) -> Result<V> {
		let arg = self.arg(index)?;
		arg.get::<V>().ok_or_else(|| Error::ArgumentType {
			index,
			expected: type_name::<V>(),
			found: arg.type_name(),
		})
	}

	/// Returns the by-reference slot at `index`.
	pub fn slot(&self, index: usize) -> Result<&RefSlot> {
		let arg = self.arg(index)?;
		arg.as_slot().ok_or_else(|| Error::ArgumentType {
			index,
			expected: "by-reference argument",
			found: arg.type_name(),
		})
	}

	/// Copies the current value of by-reference argument `index` into `target`.
	///
	/// Proxy adapters call this after dispatch to write `&mut` arguments back
	/// into the caller's place.
	pub fn copy_out<V: Clone + 'static>(&self, index: usize, target: &mut V) -> Result<()> {
		let slot = self.slot(index)?;
		*target = slot.get::<V>().ok_or_else(|| Error::ArgumentType {
			index,
			expected: type_name::<V>(),
			found: slot.type_name(),
		})?;
		Ok(())
	}

	/// Derives a new vector with slot `index` replaced by `arg`.
	pub fn replace(&self, index: usize, arg: Arg) -> Result<Self> {
		let mut next = self.clone();
		let len = next.slots.len();
		let slot = next.slots.get_mut(index).ok_or(Error::ArgumentIndex { index, len })?;
		*slot = arg;
		Ok(next)
	}

	/// Derives a new vector with slot `index` replaced by the plain value `value`.
	pub fn replace_value<V: Send + Sync + 'static>(&self, index: usize, value: V) -> Result<Self> {
		self.replace(index, Arg::val(value))
	}
}

impl FromIterator<Arg> for CallArgs {
	fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
		Self { slots: iter.into_iter().collect() }
	}
}
