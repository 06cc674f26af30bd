#![allow(dead_code)]

use std::sync::{Arc, Barrier};
use std::thread;

use shunt_invocation::{Result, Value};

use crate::plan::RedirectPlan;
use crate::redirect::{Redirect, RedirectCall, RedirectOptions};
use crate::relay::{Relay, RelayStack};
use crate::repository::RedirectRepository;
use crate::test_fixtures::{Calc, add_call, adding, real, returning};

/// Invariant: Published plans are immutable.
///
/// Deriving a new plan (insert, strict toggle) MUST NOT change any plan already
/// handed out to readers.
pub(crate) fn inv_plan_immutability() {
	let repo = RedirectRepository::<dyn Calc>::new();
	let before = repo.plan();

	repo.insert(Redirect::any(returning(1)));
	repo.set_strict(true);
	let after = repo.plan();

	assert!(before.is_empty());
	assert!(!before.is_strict());
	assert_eq!(after.len(), 1);
	assert!(after.is_strict());

	let derived = after.insert(Arc::new(Redirect::any(returning(2))));
	assert_eq!(after.len(), 1);
	assert_eq!(derived.len(), 2);
}

#[cfg_attr(test, test)]
pub(crate) fn test_plan_immutability() {
	inv_plan_immutability()
}

/// Invariant: Concurrent inserts are linearizable.
///
/// N threads inserting concurrently MUST all be visible in the final plan, each
/// with a distinct insertion sequence.
pub(crate) fn inv_no_lost_inserts() {
	const THREADS: usize = 8;
	const PER_THREAD: usize = 32;

	let repo = Arc::new(RedirectRepository::<dyn Calc>::new());
	let start = Arc::new(Barrier::new(THREADS));

	let handles: Vec<_> = (0..THREADS)
		.map(|t| {
			let repo = repo.clone();
			let start = start.clone();
			thread::spawn(move || {
				start.wait();
				for i in 0..PER_THREAD {
					let weight = ((t * PER_THREAD + i) % 5) as i32;
					repo.insert(Redirect::any(returning(weight)).with_options(RedirectOptions::weight(weight)));
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	let plan = repo.plan();
	assert_eq!(plan.len(), THREADS * PER_THREAD);

	let mut sequences: Vec<u64> = plan.entries().iter().map(|e| e.sequence()).collect();
	sequences.sort_unstable();
	sequences.dedup();
	assert_eq!(sequences.len(), THREADS * PER_THREAD, "sequences must be unique");

	let keys: Vec<(i32, u64)> = plan.entries().iter().map(|e| (e.redirect().order_weight(), e.sequence())).collect();
	assert!(keys.windows(2).all(|w| w[0] > w[1]), "plan must stay ordered");
}

#[cfg_attr(test, test)]
pub(crate) fn test_no_lost_inserts() {
	inv_no_lost_inserts()
}

/// Invariant: An in-flight call walks the plan it captured at begin.
///
/// Inserting or resetting while a handler runs MUST NOT change what that
/// handler's `call_next` reaches; the next call sees the new plan.
pub(crate) fn inv_inflight_call_keeps_captured_plan() {
	let root = real();
	let repo = Arc::new(RedirectRepository::<dyn Calc>::new());
	repo.insert(Redirect::any(returning(7)));

	let mutating = repo.clone();
	repo.insert(
		Redirect::any(move |call: RedirectCall<dyn Calc>| -> Result<Value> {
			mutating.reset();
			mutating.insert(Redirect::any(returning(100)));
			call.call_next()
		})
		.with_options(RedirectOptions::weight(1)),
	);

	let first = Relay::begin(repo.plan(), add_call(&root, 1, 1)).unwrap();
	assert_eq!(first.downcast::<i32>().unwrap(), 7, "captured plan still holds the old redirect");

	let second = Relay::begin(repo.plan(), add_call(&root, 1, 1)).unwrap();
	assert_eq!(second.downcast::<i32>().unwrap(), 100);
}

#[cfg_attr(test, test)]
pub(crate) fn test_inflight_call_keeps_captured_plan() {
	inv_inflight_call_keeps_captured_plan()
}

/// Invariant: Chain positions are strictly LIFO per call.
///
/// Every frame pushed on entering a handler MUST be popped when that handler
/// returns, on success and on error alike, and calls on different threads
/// MUST NOT share positions.
pub(crate) fn inv_chain_lifo_integrity() {
	let root = real();
	let plan = Arc::new(
		RedirectPlan::<dyn Calc>::empty(false)
			.insert(Arc::new(Redirect::any(adding(1))))
			.insert(Arc::new(Redirect::any(adding(10))))
			.insert(Arc::new(Redirect::any(adding(100)))),
	);

	let handles: Vec<_> = (0..4)
		.map(|t| {
			let plan = plan.clone();
			let root = root.clone();
			thread::spawn(move || {
				let stack = RelayStack::new();
				for i in 0..64 {
					let value = Relay::begin_on(&stack, plan.clone(), add_call(&root, t, i)).unwrap();
					assert_eq!(value.downcast::<i32>().unwrap(), t + i + 111);
					assert_eq!(stack.depth(), 0);
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}
}

#[cfg_attr(test, test)]
pub(crate) fn test_chain_lifo_integrity() {
	inv_chain_lifo_integrity()
}
