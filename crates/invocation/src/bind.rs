//! Typed argument binding for fixed-arity handlers.
//!
//! A handler that wants `(String, Ref<i32>)` instead of a raw [`CallArgs`]
//! binds the vector into that tuple, works on the typed values, and relies on
//! [`Bound`] to copy every [`Ref`] cell back into its slot afterwards. The copy
//! runs on drop, so it also happens when the handler bails out early.

use std::any::type_name;
use std::ops::{Deref, DerefMut};

use crate::{CallArgs, Error, RefSlot, Result};

/// One element of a bound argument tuple.
pub trait BindArg: Sized {
	fn bind(args: &CallArgs, index: usize) -> Result<Self>;

	/// Copies a mutated value back into the argument vector.
	fn write_back(&mut self, _args: &CallArgs, _index: usize) {}
}

impl<V: Clone + Send + Sync + 'static> BindArg for V {
	fn bind(args: &CallArgs, index: usize) -> Result<Self> {
		args.value::<V>(index)
	}
}

/// Typed mutable cell bound to a by-reference argument.
///
/// Only a cell changed since it was bound (or last written back) is copied to
/// its slot, so a write-back never clobbers a value stored downstream.
pub struct Ref<V> {
	value: V,
	slot: RefSlot,
	dirty: bool,
}

impl<V> Ref<V> {
	pub fn get(&self) -> &V {
		&self.value
	}

	pub fn set(&mut self, value: V) {
		self.value = value;
		self.dirty = true;
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	/// The slot this cell writes back into.
	pub fn slot(&self) -> &RefSlot {
		&self.slot
	}
}

impl<V> Deref for Ref<V> {
	type Target = V;

	fn deref(&self) -> &V {
		&self.value
	}
}

impl<V> DerefMut for Ref<V> {
	fn deref_mut(&mut self) -> &mut V {
		self.dirty = true;
		&mut self.value
	}
}

impl<V: std::fmt::Debug> std::fmt::Debug for Ref<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Ref").field(&self.value).finish()
	}
}

impl<V: Clone + Send + Sync + 'static> BindArg for Ref<V> {
	fn bind(args: &CallArgs, index: usize) -> Result<Self> {
		let slot = args.slot(index)?.clone();
		let value = slot.get::<V>().ok_or_else(|| Error::ArgumentType {
			index,
			expected: type_name::<V>(),
			found: slot.type_name(),
		})?;
		Ok(Self { value, slot, dirty: false })
	}

	fn write_back(&mut self, _args: &CallArgs, _index: usize) {
		if self.dirty {
			self.slot.set(self.value.clone());
			self.dirty = false;
		}
	}
}

/// Tuple of [`BindArg`] elements matching a method's parameter list.
pub trait FromCallArgs: Sized {
	const ARITY: usize;

	fn bind(args: &CallArgs) -> Result<Self>;

	fn write_back(&mut self, args: &CallArgs);
}

macro_rules! impl_from_call_args {
	($arity:literal; $($idx:tt: $T:ident),*) => {
		impl<$($T: BindArg),*> FromCallArgs for ($($T,)*) {
			const ARITY: usize = $arity;

			fn bind(args: &CallArgs) -> Result<Self> {
				let _ = args;
				Ok(($(<$T as BindArg>::bind(args, $idx)?,)*))
			}

			fn write_back(&mut self, args: &CallArgs) {
				let _ = args;
				$(BindArg::write_back(&mut self.$idx, args, $idx);)*
			}
		}
	};
}

impl_from_call_args!(0;);
impl_from_call_args!(1; 0: A0);
impl_from_call_args!(2; 0: A0, 1: A1);
impl_from_call_args!(3; 0: A0, 1: A1, 2: A2);
impl_from_call_args!(4; 0: A0, 1: A1, 2: A2, 3: A3);
impl_from_call_args!(5; 0: A0, 1: A1, 2: A2, 3: A3, 4: A4);
impl_from_call_args!(6; 0: A0, 1: A1, 2: A2, 3: A3, 4: A4, 5: A5);
impl_from_call_args!(7; 0: A0, 1: A1, 2: A2, 3: A3, 4: A4, 5: A5, 6: A6);
impl_from_call_args!(8; 0: A0, 1: A1, 2: A2, 3: A3, 4: A4, 5: A5, 6: A6, 7: A7);

/// Bound argument tuple that writes by-reference values back on drop.
pub struct Bound<A: FromCallArgs> {
	args: CallArgs,
	bound: A,
}

impl<A: FromCallArgs> Bound<A> {
	pub fn bind(args: &CallArgs) -> Result<Self> {
		Ok(Self {
			bound: A::bind(args)?,
			args: args.clone(),
		})
	}

	/// Writes changed by-reference values back now, e.g. before forwarding the call.
	pub fn write_back(&mut self) {
		self.bound.write_back(&self.args);
	}

	/// The argument vector the tuple was bound from.
	pub fn args(&self) -> &CallArgs {
		&self.args
	}
}

impl<A: FromCallArgs> Deref for Bound<A> {
	type Target = A;

	fn deref(&self) -> &A {
		&self.bound
	}
}

impl<A: FromCallArgs> DerefMut for Bound<A> {
	fn deref_mut(&mut self) -> &mut A {
		&mut self.bound
	}
}

impl<A: FromCallArgs> Drop for Bound<A> {
	fn drop(&mut self) {
		self.bound.write_back(&self.args);
	}
}
