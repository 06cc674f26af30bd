//! Dispatch engine walking a redirect plan for one call.
//!
//! # Role
//!
//! [`Relay::begin`] finds the first redirect matching a call and invokes it.
//! The handler receives an owned [`Relay`] handle positioned at its redirect
//! and may forward with [`Relay::call_next`] or fall through with
//! [`Relay::call_root`], any number of times.
//!
//! The chain position travels with the handle rather than in ambient state, so
//! a handler may move its relay into a future and forward after an `.await`
//! on whichever thread resumes it.
//!
//! # Invariants
//!
//! - Every handler entry pushes a frame on the call's [`RelayStack`] and pops it
//!   on completion, including on error and panic (see `invariants::test_chain_lifo_integrity`).
//! - Once a non-exempt redirect has matched, the rest of the chain is strict-satisfied.
//! - Reaching the root in strict mode requires a prior non-exempt match.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use shunt_invocation::{CallArgs, CallInfo, Error, Result, Value};

use crate::plan::RedirectPlan;
use crate::redirect::RedirectCall;

static NEXT_FRAME: AtomicU64 = AtomicU64::new(1);

/// Per-call stack of active chain positions.
///
/// Created when a call enters the relay and shared by every handler frame of
/// that call. Nested proxy calls get their own stack.
#[derive(Clone, Default)]
pub struct RelayStack {
	frames: Arc<Mutex<Vec<u64>>>,
}

impl RelayStack {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of handler frames currently active.
	pub fn depth(&self) -> usize {
		self.frames.lock().len()
	}

	fn push(&self) -> FrameGuard {
		let frame = NEXT_FRAME.fetch_add(1, Ordering::Relaxed);
		self.frames.lock().push(frame);
		FrameGuard {
			stack: self.clone(),
			frame,
			released: false,
		}
	}

	fn pop(&self, expected: u64) -> Result<()> {
		let found = self.frames.lock().pop();
		if found == Some(expected) {
			return Ok(());
		}
		tracing::error!(expected, ?found, "relay chain position mismatch");
		Err(Error::InternalConsistency { expected, found })
	}
}

impl fmt::Debug for RelayStack {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.frames.lock().iter()).finish()
	}
}

/// Pops its frame when released or dropped.
struct FrameGuard {
	stack: RelayStack,
	frame: u64,
	released: bool,
}

impl FrameGuard {
	fn release(mut self) -> Result<()> {
		self.released = true;
		self.stack.pop(self.frame)
	}
}

impl Drop for FrameGuard {
	fn drop(&mut self) {
		if !self.released {
			// Unwinding out of a handler; the error is already being reported.
			let _ = self.stack.pop(self.frame);
		}
	}
}

/// One chain position: the plan being walked, the index of the redirect
/// running at this position, and the call as seen there.
pub struct RelayIndex<T: ?Sized + 'static> {
	plan: Arc<RedirectPlan<T>>,
	index: usize,
	strict_satisfied: bool,
	call: CallInfo<T>,
	frame: u64,
}

impl<T: ?Sized + 'static> RelayIndex<T> {
	pub fn plan(&self) -> &Arc<RedirectPlan<T>> {
		&self.plan
	}

	pub fn index(&self) -> usize {
		self.index
	}

	pub fn strict_satisfied(&self) -> bool {
		self.strict_satisfied
	}

	pub fn call(&self) -> &CallInfo<T> {
		&self.call
	}

	pub fn frame(&self) -> u64 {
		self.frame
	}
}

impl<T: ?Sized + 'static> fmt::Debug for RelayIndex<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RelayIndex")
			.field("index", &self.index)
			.field("strict_satisfied", &self.strict_satisfied)
			.field("frame", &self.frame)
			.finish()
	}
}

/// Call-scoped relay handle given to a running handler.
pub struct Relay<T: ?Sized + 'static> {
	position: Arc<RelayIndex<T>>,
	stack: RelayStack,
}

impl<T: ?Sized + 'static> Clone for Relay<T> {
	fn clone(&self) -> Self {
		Self {
			position: self.position.clone(),
			stack: self.stack.clone(),
		}
	}
}

impl<T: ?Sized + 'static> Relay<T> {
	/// Dispatches `call` against `plan` on a fresh stack.
	pub fn begin(plan: Arc<RedirectPlan<T>>, call: CallInfo<T>) -> Result<Value> {
		Self::begin_on(&RelayStack::new(), plan, call)
	}

	/// Dispatches `call` against `plan`, pushing frames onto `stack`.
	pub fn begin_on(stack: &RelayStack, plan: Arc<RedirectPlan<T>>, call: CallInfo<T>) -> Result<Value> {
		let method = call.method().name();
		tracing::trace!(method, redirects = plan.len(), strict = plan.is_strict(), "relay begin");

		match plan.find_from(0, &call) {
			Some(index) => {
				let exempt = plan.redirect(index).is_some_and(|r| r.is_strict_exempt());
				let strict_satisfied = !plan.is_strict() || !exempt;
				Self::enter(stack, plan, index, strict_satisfied, call)
			}
			None if plan.is_strict() => Err(strict_violation(&call)),
			None => invoke_root(&call),
		}
	}

	fn enter(stack: &RelayStack, plan: Arc<RedirectPlan<T>>, index: usize, strict_satisfied: bool, call: CallInfo<T>) -> Result<Value> {
		let Some(redirect) = plan.redirect(index).cloned() else {
			return Err(Error::InternalConsistency {
				expected: index as u64,
				found: None,
			});
		};
		tracing::trace!(method = call.method().name(), index, strict_satisfied, "relay enter");

		let guard = stack.push();
		let relay = Relay {
			position: Arc::new(RelayIndex {
				plan,
				index,
				strict_satisfied,
				call,
				frame: guard.frame,
			}),
			stack: stack.clone(),
		};
		let result = redirect.handler().handle(RedirectCall::new(relay, redirect.clone()));
		guard.release()?;
		result
	}

	/// The position this handle is bound to.
	pub fn position(&self) -> &RelayIndex<T> {
		&self.position
	}

	/// The call as seen at this position.
	pub fn call(&self) -> &CallInfo<T> {
		&self.position.call
	}

	pub fn stack(&self) -> &RelayStack {
		&self.stack
	}

	/// Forwards the current call to the next matching redirect, or to the root.
	pub fn call_next(&self) -> Result<Value> {
		self.call_next_with(self.position.call.clone())
	}

	/// Forwards with replacement arguments.
	pub fn call_next_args(&self, args: CallArgs) -> Result<Value> {
		self.call_next_with(self.position.call.with_args(args))
	}

	/// Forwards a handler-supplied call to the next redirect matching it.
	pub fn call_next_with(&self, call: CallInfo<T>) -> Result<Value> {
		let pos = &self.position;
		match pos.plan.find_from(pos.index + 1, &call) {
			Some(next) => {
				let exempt = pos.plan.redirect(next).is_some_and(|r| r.is_strict_exempt());
				let strict_satisfied = pos.strict_satisfied || !exempt;
				Self::enter(&self.stack, pos.plan.clone(), next, strict_satisfied, call)
			}
			None => self.fall_through(call),
		}
	}

	/// Invokes the root with the current call, skipping remaining redirects.
	pub fn call_root(&self) -> Result<Value> {
		self.fall_through(self.position.call.clone())
	}

	pub fn call_root_args(&self, args: CallArgs) -> Result<Value> {
		self.fall_through(self.position.call.with_args(args))
	}

	pub fn call_root_with(&self, call: CallInfo<T>) -> Result<Value> {
		self.fall_through(call)
	}

	fn fall_through(&self, call: CallInfo<T>) -> Result<Value> {
		if !self.position.strict_satisfied {
			return Err(strict_violation(&call));
		}
		invoke_root(&call)
	}
}

impl<T: ?Sized + 'static> fmt::Debug for Relay<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Relay")
			.field("position", &self.position)
			.field("stack", &self.stack)
			.finish()
	}
}

fn strict_violation<T: ?Sized + 'static>(call: &CallInfo<T>) -> Error {
	let method = call.method().name();
	tracing::warn!(method, "strict mode rejected call");
	Error::StrictViolation { method }
}

fn invoke_root<T: ?Sized + 'static>(call: &CallInfo<T>) -> Result<Value> {
	tracing::trace!(method = call.method().name(), has_root = call.root().is_some(), "relay root");
	call.invoke_root()
}
