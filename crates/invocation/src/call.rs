use std::fmt;
use std::sync::Arc;

use crate::{CallArgs, Error, Method, MethodId, Result, Value};

/// Immutable record of one intercepted call.
///
/// Handlers never mutate a record; rewriting the method or the arguments
/// derives a new one which is then handed to the next step of the chain.
pub struct CallInfo<T: ?Sized + 'static> {
	proxy: Arc<T>,
	root: Option<Arc<T>>,
	method: &'static Method<T>,
	args: CallArgs,
}

impl<T: ?Sized + 'static> Clone for CallInfo<T> {
	fn clone(&self) -> Self {
		Self {
			proxy: self.proxy.clone(),
			root: self.root.clone(),
			method: self.method,
			args: self.args.clone(),
		}
	}
}

impl<T: ?Sized + 'static> CallInfo<T> {
	pub fn new(proxy: Arc<T>, root: Option<Arc<T>>, method: &'static Method<T>, args: CallArgs) -> Self {
		Self {
			proxy,
			root,
			method,
			args,
		}
	}

	/// The intercepting instance the call was made on.
	pub fn proxy(&self) -> &Arc<T> {
		&self.proxy
	}

	/// The root implementation, if one was supplied.
	pub fn root(&self) -> Option<&Arc<T>> {
		self.root.as_ref()
	}

	pub fn method(&self) -> &'static Method<T> {
		self.method
	}

	pub fn method_id(&self) -> MethodId {
		self.method.id()
	}

	pub fn args(&self) -> &CallArgs {
		&self.args
	}

	/// Derives a record with `args` in place of the current arguments.
	pub fn with_args(&self, args: CallArgs) -> Self {
		Self {
			args,
			..self.clone()
		}
	}

	/// Derives a record targeting a different method of the same trait.
	pub fn with_method(&self, method: &'static Method<T>, args: CallArgs) -> Result<Self> {
		method.check_args(&args)?;
		Ok(Self {
			method,
			args,
			..self.clone()
		})
	}

	/// Derives a record with a different root implementation.
	pub fn with_root(&self, root: Option<Arc<T>>) -> Self {
		Self { root, ..self.clone() }
	}

	/// Invokes the method on the root implementation.
	pub fn invoke_root(&self) -> Result<Value> {
		let root = self.root.as_deref().ok_or(Error::NullRoot { method: self.method.name() })?;
		self.method.invoke(root, &self.args)
	}

	/// Invokes the method on an arbitrary implementation of `T`.
	pub fn invoke_on(&self, target: &T) -> Result<Value> {
		self.method.invoke(target, &self.args)
	}
}

impl<T: ?Sized + 'static> fmt::Debug for CallInfo<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallInfo")
			.field("method", &self.method.name())
			.field("args", &self.args)
			.field("has_root", &self.root.is_some())
			.finish()
	}
}
