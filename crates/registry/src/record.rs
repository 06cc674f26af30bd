//! Call recording.
//!
//! A [`Recorder`] is a pass-through handler: it forwards every call with
//! `call_next` and appends a [`RecordedCall`] to its [`CallStream`]. It is
//! registered strict-exempt, so recording alone never satisfies strict mode.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use shunt_invocation::{CallInfo, Error, Method, MethodId, Result, Value};

use crate::redirect::{CallHandler, RedirectCall};

/// How a recorded call completed.
#[derive(Debug, Clone)]
pub enum Outcome {
	/// Returned a value of the named type.
	Returned { type_name: &'static str },
	/// Failed with an error.
	Failed(Error),
}

impl Outcome {
	pub fn is_returned(&self) -> bool {
		matches!(self, Self::Returned { .. })
	}

	pub fn error(&self) -> Option<&Error> {
		match self {
			Self::Failed(err) => Some(err),
			Self::Returned { .. } => None,
		}
	}
}

/// One recorded call.
///
/// Appended when the call enters the recorder so the stream reflects call
/// order; the outcome is filled in when the call completes.
pub struct RecordedCall<T: ?Sized + 'static> {
	call: CallInfo<T>,
	outcome: OnceLock<Outcome>,
}

impl<T: ?Sized + 'static> RecordedCall<T> {
	pub fn call(&self) -> &CallInfo<T> {
		&self.call
	}

	pub fn method_id(&self) -> MethodId {
		self.call.method_id()
	}

	/// `None` while the call is still in flight. For async methods the call
	/// settles when the returned future completes.
	pub fn outcome(&self) -> Option<&Outcome> {
		self.outcome.get()
	}

	fn settle(&self, result: Result<&'static str>) {
		let outcome = match result {
			Ok(type_name) => Outcome::Returned { type_name },
			Err(err) => Outcome::Failed(err),
		};
		let _ = self.outcome.set(outcome);
	}
}

impl<T: ?Sized + 'static> std::fmt::Debug for RecordedCall<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RecordedCall")
			.field("call", &self.call)
			.field("outcome", &self.outcome.get())
			.finish()
	}
}

/// Shared, append-only stream of recorded calls.
pub struct CallStream<T: ?Sized + 'static> {
	calls: Arc<Mutex<Vec<Arc<RecordedCall<T>>>>>,
}

impl<T: ?Sized + 'static> Clone for CallStream<T> {
	fn clone(&self) -> Self {
		Self {
			calls: self.calls.clone(),
		}
	}
}

impl<T: ?Sized + 'static> Default for CallStream<T> {
	fn default() -> Self {
		Self {
			calls: Arc::new(Mutex::new(Vec::new())),
		}
	}
}

impl<T: ?Sized + 'static> CallStream<T> {
	pub fn len(&self) -> usize {
		self.calls.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.calls.lock().is_empty()
	}

	/// Snapshot of all calls recorded so far, in call order.
	pub fn calls(&self) -> Vec<Arc<RecordedCall<T>>> {
		self.calls.lock().clone()
	}

	/// Recorded calls to `method`.
	pub fn to(&self, method: &'static Method<T>) -> Vec<Arc<RecordedCall<T>>> {
		let id = method.id();
		self.filter(|c| c.method_id() == id)
	}

	pub fn filter(&self, mut predicate: impl FnMut(&RecordedCall<T>) -> bool) -> Vec<Arc<RecordedCall<T>>> {
		self.calls.lock().iter().filter(|c| predicate(c)).cloned().collect()
	}

	pub fn last(&self) -> Option<Arc<RecordedCall<T>>> {
		self.calls.lock().last().cloned()
	}

	fn push(&self, call: CallInfo<T>) -> Arc<RecordedCall<T>> {
		let record = Arc::new(RecordedCall {
			call,
			outcome: OnceLock::new(),
		});
		self.calls.lock().push(record.clone());
		record
	}
}

impl<T: ?Sized + 'static> std::fmt::Debug for CallStream<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.calls.lock().iter()).finish()
	}
}

/// Pass-through handler appending every call it sees to a [`CallStream`].
pub struct Recorder<T: ?Sized + 'static> {
	stream: CallStream<T>,
}

impl<T: ?Sized + 'static> Default for Recorder<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: ?Sized + 'static> Recorder<T> {
	pub fn new() -> Self {
		Self {
			stream: CallStream::default(),
		}
	}

	pub fn stream(&self) -> CallStream<T> {
		self.stream.clone()
	}
}

impl<T: ?Sized + Send + Sync + 'static> CallHandler<T> for Recorder<T> {
	fn handle(&self, call: RedirectCall<T>) -> Result<Value> {
		let record = self.stream.push(call.info().clone());
		match call.call_next() {
			Ok(value) if value.is_future() => Ok(value.observe_future(move |settled| record.settle(settled))),
			Ok(value) => {
				record.settle(Ok(value.type_name()));
				Ok(value)
			}
			Err(err) => {
				record.settle(Err(err.clone()));
				Err(err)
			}
		}
	}
}
