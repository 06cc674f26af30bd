use std::fmt;
use std::sync::Arc;

/// Result alias used across the call model and the dispatch engine.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced to the proxy invocation site.
///
/// Handler and root failures travel through the relay unmodified as
/// [`Error::Handler`]; every other variant is raised by the engine itself.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
	/// Strict mode is on and no non-exempt redirect handled the call.
	#[error("strict mode violation: no redirect satisfied call to `{method}`")]
	StrictViolation { method: &'static str },

	/// The call fell through to the root but the proxy has no root instance.
	#[error("call to `{method}` reached the root implementation but no root was supplied")]
	NullRoot { method: &'static str },

	/// A popped chain position did not match the one pushed by the same frame.
	#[error("relay chain corrupted: expected frame {expected}, popped {found:?}")]
	InternalConsistency { expected: u64, found: Option<u64> },

	/// A call constraint could not be built for the method (registration time only).
	#[error("invalid constraint for `{method}`: {reason}")]
	Constraint { method: &'static str, reason: String },

	/// An argument slot holds a value of a different type than requested.
	#[error("argument {index} has type `{found}`, expected `{expected}`")]
	ArgumentType {
		index: usize,
		expected: &'static str,
		found: &'static str,
	},

	/// An argument index is past the end of the argument vector.
	#[error("argument index {index} out of range for {len} arguments")]
	ArgumentIndex { index: usize, len: usize },

	/// A return value could not be downcast to the requested type.
	#[error("return value has type `{found}`, expected `{expected}`")]
	ReturnType { expected: &'static str, found: &'static str },

	/// The proxy instance was dropped while one of its calls was still being built.
	#[error("proxy instance dropped before the call could be dispatched")]
	ProxyDropped,

	/// A proxy adapter dispatched through a sink it never bound with `with_proxy`.
	#[error("call to `{method}` went through a sink that was never bound to a proxy")]
	UnboundSink { method: &'static str },

	/// Failure raised by a redirect handler or a root implementation.
	#[error(transparent)]
	Handler(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
	/// Wraps an arbitrary error raised by a handler or a root implementation.
	pub fn handler<E>(err: E) -> Self
	where
		E: std::error::Error + Send + Sync + 'static,
	{
		Self::Handler(Arc::new(err))
	}

	/// Builds a handler error from a plain message.
	pub fn msg(msg: impl fmt::Display) -> Self {
		Self::Handler(Arc::new(Message(msg.to_string())))
	}

	/// Returns true for [`Error::StrictViolation`].
	pub fn is_strict_violation(&self) -> bool {
		matches!(self, Self::StrictViolation { .. })
	}

	/// Returns true for [`Error::NullRoot`].
	pub fn is_null_root(&self) -> bool {
		matches!(self, Self::NullRoot { .. })
	}

	/// Returns the handler error downcast to `E`, if this is one.
	pub fn downcast_handler<E: std::error::Error + 'static>(&self) -> Option<&E> {
		match self {
			Self::Handler(inner) => inner.downcast_ref::<E>(),
			_ => None,
		}
	}
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl std::error::Error for Message {}
