use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use shunt_invocation::CallArgs;

use super::*;
use crate::constraint::MethodConstraint;
use crate::redirect::RedirectOptions;
use crate::test_fixtures::{ADD, Calc, LABEL, add_call, call_on, real, returning};

fn weighted(weight: i32) -> Arc<Redirect<dyn Calc>> {
	Arc::new(Redirect::any(returning(weight)).with_options(RedirectOptions::weight(weight)))
}

fn order(plan: &RedirectPlan<dyn Calc>) -> Vec<(i32, u64)> {
	plan.entries().iter().map(|e| (e.redirect().order_weight(), e.sequence())).collect()
}

#[test]
fn equal_weights_dispatch_most_recent_first() {
	let plan = RedirectPlan::<dyn Calc>::empty(false).insert(weighted(0)).insert(weighted(0)).insert(weighted(0));

	assert_eq!(order(&plan), vec![(0, 2), (0, 1), (0, 0)]);
}

#[test]
fn higher_weight_dispatches_first_regardless_of_insertion() {
	let plan = RedirectPlan::<dyn Calc>::empty(false).insert(weighted(10)).insert(weighted(0)).insert(weighted(5));

	assert_eq!(order(&plan), vec![(10, 0), (5, 2), (0, 1)]);
}

#[test]
fn extreme_weights_pin_first_and_last() {
	let plan = RedirectPlan::<dyn Calc>::empty(false)
		.insert(weighted(i32::MIN))
		.insert(weighted(i32::MAX))
		.insert(weighted(0))
		.insert(weighted(i32::MIN))
		.insert(weighted(i32::MAX));

	let weights: Vec<i32> = plan.redirects().map(|r| r.order_weight()).collect();
	assert_eq!(weights, vec![i32::MAX, i32::MAX, 0, i32::MIN, i32::MIN]);
	assert_eq!(plan.entries()[0].sequence(), 4, "later MAX insert wins the tie");
}

#[test]
fn insert_returns_new_plan() {
	let empty = RedirectPlan::<dyn Calc>::empty(true);
	let one = empty.insert(weighted(0));

	assert!(empty.is_empty());
	assert_eq!(one.len(), 1);
	assert!(one.is_strict(), "strict flag carries over");
	assert!(!one.with_strict(false).is_strict());
	assert!(one.is_strict());
}

#[test]
fn find_from_skips_non_matching_redirects() {
	let root = real();
	let add_only = Arc::new(Redirect::new(returning(1), MethodConstraint::new(&ADD)));
	let plan = RedirectPlan::<dyn Calc>::empty(false)
		.insert(weighted(0))
		.insert(add_only.clone())
		.insert(Arc::new(Redirect::new(returning(2), MethodConstraint::new(&LABEL))));

	let add = add_call(&root, 1, 1);
	let label = call_on(&root, &LABEL, CallArgs::new());

	assert_eq!(plan.find_from(0, &add), Some(1));
	assert_eq!(plan.find_from(2, &add), Some(2));
	assert_eq!(plan.find_from(0, &label), Some(0));
	assert_eq!(plan.find_from(1, &label), Some(2));
	assert_eq!(plan.find_from(plan.len(), &label), None);
	assert_eq!(plan.find_from(plan.len() + 3, &label), None);
	assert!(Arc::ptr_eq(plan.redirect(1).unwrap(), &add_only));
}

fn expected_order(weights: &[i32]) -> Vec<(i32, u64)> {
	let mut expected: Vec<(i32, u64)> = weights.iter().enumerate().map(|(seq, w)| (*w, seq as u64)).collect();
	expected.sort_by(|a, b| b.cmp(a));
	expected
}

proptest! {
	/// Dispatch order is `(weight, sequence)` descending for any insertion history.
	#[test]
	fn prop_order_matches_weight_then_recency(weights in prop::collection::vec(prop_oneof![
		-3i32..=3,
		Just(i32::MAX),
		Just(i32::MIN),
	], 0..24)) {
		let mut plan = RedirectPlan::<dyn Calc>::empty(false);
		for w in &weights {
			plan = plan.insert(weighted(*w));
		}
		prop_assert_eq!(order(&plan), expected_order(&weights));
	}

	/// Batched insertion assigns the same sequences as one-at-a-time insertion.
	#[test]
	fn prop_insert_many_matches_sequential(weights in prop::collection::vec(-5i32..=5, 0..16), split in 0usize..16) {
		let split = split.min(weights.len());
		let (head, tail) = weights.split_at(split);
		let batched = RedirectPlan::<dyn Calc>::empty(false)
			.insert_many(head.iter().map(|w| weighted(*w)))
			.insert_many(tail.iter().map(|w| weighted(*w)));
		prop_assert_eq!(order(&batched), expected_order(&weights));
	}
}
