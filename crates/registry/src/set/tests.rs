use std::sync::Arc;

use super::*;
use crate::redirect::Redirect;
use crate::test_fixtures::{Calc, returning};

trait Other: Send + Sync {}

#[test]
fn repository_is_created_once_per_id() {
	let set = RedirectSet::default();
	let a = set.repository::<dyn Calc>();
	let b = set.repository::<dyn Calc>();

	assert!(Arc::ptr_eq(&a, &b));
	assert_eq!(set.len(), 1);
	assert!(set.contains(&RedirectId::of::<dyn Calc>()));
}

#[test]
fn named_ids_get_independent_repositories() {
	let set = RedirectSet::default();
	let unnamed = set.repository::<dyn Calc>();
	let named = set.named_repository::<dyn Calc>("secondary");

	named.insert(Redirect::any(returning(1)));

	assert!(!Arc::ptr_eq(&unnamed, &named));
	assert!(Arc::ptr_eq(
		&named,
		&set.get_or_create::<dyn Calc>(&RedirectId::named::<dyn Calc>("secondary")).unwrap()
	));
	assert!(unnamed.is_empty());
	assert_eq!(named.len(), 1);
	assert_eq!(set.len(), 2);
}

#[test]
fn get_or_create_rejects_mismatched_type() {
	let set = RedirectSet::default();
	assert!(set.get_or_create::<dyn Other>(&RedirectId::of::<dyn Calc>()).is_none());
	assert!(set.is_empty());
}

#[test]
fn reset_all_and_strict_all_reach_every_repository() {
	let set = RedirectSet::new(true);
	let calc = set.repository::<dyn Calc>();
	let other = set.repository::<dyn Other>();
	assert!(calc.is_strict(), "new repositories take the set default");

	calc.insert(Redirect::any(returning(1)));
	set.strict_all(false);
	assert!(!calc.is_strict());
	assert!(!other.is_strict());

	set.reset_all();
	assert!(calc.is_empty());
	assert!(calc.is_strict(), "reset restores the default strictness");
}

#[test]
fn strict_all_reaches_repositories_created_later() {
	let set = RedirectSet::default();
	set.strict_all(true);

	let later = set.repository::<dyn Calc>();
	assert!(later.is_strict());

	later.reset();
	assert!(!later.is_strict(), "reset returns to the set default");

	set.reset_all();
	assert!(!set.named_repository::<dyn Calc>("late").is_strict());
}

#[test]
fn id_debug_includes_name() {
	let id = RedirectId::named::<dyn Calc>("x");
	assert_eq!(id.name(), Some("x"));
	assert!(format!("{id:?}").ends_with("#x"));
	assert_eq!(RedirectId::of::<dyn Calc>().name(), None);
}
