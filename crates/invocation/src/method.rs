//! Method descriptors.
//!
//! A [`Method`] describes one member of an intercepted trait: its name, the
//! shape of its parameters and return value, and how to invoke it on a real
//! implementation. Descriptors are declared as `static` items by the proxy
//! adapter, which makes their address a process-stable identity.
//!
//! ```ignore
//! const GREET_PARAMS: &[Param] = &[Param::of::<String>("name")];
//!
//! static GREET: Method<dyn Greeter> = Method::new("greet", GREET_PARAMS, Returns::of::<String>(), |root, args| {
//! 	Ok(Value::new(root.greet(&args.value::<String>(0)?)))
//! });
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::{Arg, CallArgs, Error, Result, Value};

/// How an argument is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
	/// By value or shared reference.
	Val,
	/// By mutable reference; backed by a [`RefSlot`](crate::RefSlot).
	Ref,
}

/// Parameter descriptor.
#[derive(Clone, Copy)]
pub struct Param {
	name: &'static str,
	kind: ParamKind,
	type_id: fn() -> TypeId,
	type_name: fn() -> &'static str,
}

impl Param {
	pub const fn of<V: 'static>(name: &'static str) -> Self {
		Self {
			name,
			kind: ParamKind::Val,
			type_id: TypeId::of::<V>,
			type_name: type_name::<V>,
		}
	}

	pub const fn by_ref<V: 'static>(name: &'static str) -> Self {
		Self {
			name,
			kind: ParamKind::Ref,
			type_id: TypeId::of::<V>,
			type_name: type_name::<V>,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn kind(&self) -> ParamKind {
		self.kind
	}

	pub fn is_ref(&self) -> bool {
		self.kind == ParamKind::Ref
	}

	pub fn type_id(&self) -> TypeId {
		(self.type_id)()
	}

	pub fn type_name(&self) -> &'static str {
		(self.type_name)()
	}

	/// Returns true if `arg` has this parameter's passing kind and value type.
	pub fn accepts(&self, arg: &Arg) -> bool {
		let expected = self.type_id();
		arg.is_ref() == self.is_ref() && arg.inspect(|value: &(dyn Any + Send + Sync)| value.type_id() == expected)
	}
}

impl fmt::Debug for Param {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Param")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("type", &self.type_name())
			.finish()
	}
}

/// Return type descriptor.
#[derive(Clone, Copy)]
pub struct Returns {
	type_id: fn() -> TypeId,
	type_name: fn() -> &'static str,
}

impl Returns {
	pub const fn of<R: 'static>() -> Self {
		Self {
			type_id: TypeId::of::<R>,
			type_name: type_name::<R>,
		}
	}

	pub fn type_id(&self) -> TypeId {
		(self.type_id)()
	}

	pub fn type_name(&self) -> &'static str {
		(self.type_name)()
	}

	pub fn is<R: 'static>(&self) -> bool {
		self.type_id() == TypeId::of::<R>()
	}
}

impl fmt::Debug for Returns {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Returns").field(&self.type_name()).finish()
	}
}

/// Invokes a method on a concrete implementation of `T`.
pub type Invoker<T> = fn(&T, &CallArgs) -> Result<Value>;

/// Descriptor of one method of the intercepted trait `T`.
pub struct Method<T: ?Sized + 'static> {
	name: &'static str,
	params: &'static [Param],
	returns: Returns,
	invoke: Invoker<T>,
}

impl<T: ?Sized + 'static> Method<T> {
	pub const fn new(name: &'static str, params: &'static [Param], returns: Returns, invoke: Invoker<T>) -> Self {
		Self {
			name,
			params,
			returns,
			invoke,
		}
	}

	/// Identity of this descriptor, stable for the lifetime of the process.
	pub fn id(&self) -> MethodId {
		MethodId {
			addr: self as *const Self as *const () as usize,
			name: self.name,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn params(&self) -> &'static [Param] {
		self.params
	}

	pub fn arity(&self) -> usize {
		self.params.len()
	}

	pub fn returns(&self) -> Returns {
		self.returns
	}

	/// Invokes the method on `target` with `args`.
	pub fn invoke(&self, target: &T, args: &CallArgs) -> Result<Value> {
		(self.invoke)(target, args)
	}

	/// Checks `args` against the declared parameters.
	pub fn check_args(&self, args: &CallArgs) -> Result<()> {
		if args.len() != self.params.len() {
			return Err(Error::ArgumentIndex {
				index: self.params.len().min(args.len()),
				len: args.len(),
			});
		}
		for (index, (param, arg)) in self.params.iter().zip(args.iter()).enumerate() {
			if !param.accepts(arg) {
				return Err(Error::ArgumentType {
					index,
					expected: param.type_name(),
					found: arg.type_name(),
				});
			}
		}
		Ok(())
	}
}

impl<T: ?Sized + 'static> fmt::Debug for Method<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Method")
			.field("name", &self.name)
			.field("params", &self.params)
			.field("returns", &self.returns)
			.finish()
	}
}

/// Reference-comparable handle to a [`Method`] descriptor.
///
/// Equality and hashing use the descriptor address only.
#[derive(Clone, Copy)]
pub struct MethodId {
	addr: usize,
	name: &'static str,
}

impl MethodId {
	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for MethodId {
	fn eq(&self, other: &Self) -> bool {
		self.addr == other.addr
	}
}

impl Eq for MethodId {}

impl std::hash::Hash for MethodId {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.addr.hash(state);
	}
}

impl fmt::Debug for MethodId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "MethodId({}@{:#x})", self.name, self.addr)
	}
}
