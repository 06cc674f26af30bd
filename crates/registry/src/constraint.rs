//! Call constraints: predicates deciding whether a redirect applies to a call.
//!
//! Constraints are built once when a redirect is registered and are immutable
//! afterwards, so a single instance is shared by every concurrent call that
//! walks the plan. `is_match` must be pure.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use shunt_invocation::{Arg, CallInfo, Error, Method, MethodId, Param, Result};

/// Relative evaluation cost, used to order the parts of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchCost {
	/// Identity comparisons (method, return type).
	Identity,
	/// Argument inspection.
	Arguments,
	/// User closures.
	Predicate,
}

/// Predicate over a call record.
pub trait CallConstraint<T: ?Sized + 'static>: Send + Sync {
	fn is_match(&self, call: &CallInfo<T>) -> bool;

	fn cost(&self) -> MatchCost {
		MatchCost::Predicate
	}
}

/// Matches every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueConstraint;

impl<T: ?Sized + 'static> CallConstraint<T> for TrueConstraint {
	fn is_match(&self, _call: &CallInfo<T>) -> bool {
		true
	}

	fn cost(&self) -> MatchCost {
		MatchCost::Identity
	}
}

/// Matches calls to one method descriptor.
#[derive(Debug, Clone, Copy)]
pub struct MethodConstraint {
	method: MethodId,
}

impl MethodConstraint {
	pub fn new<T: ?Sized + 'static>(method: &'static Method<T>) -> Self {
		Self { method: method.id() }
	}
}

impl<T: ?Sized + 'static> CallConstraint<T> for MethodConstraint {
	fn is_match(&self, call: &CallInfo<T>) -> bool {
		call.method_id() == self.method
	}

	fn cost(&self) -> MatchCost {
		MatchCost::Identity
	}
}

/// Matches calls whose method declares return type `R`.
#[derive(Debug, Clone, Copy)]
pub struct ReturnTypeConstraint {
	type_id: TypeId,
	type_name: &'static str,
}

impl ReturnTypeConstraint {
	pub fn of<R: 'static>() -> Self {
		Self {
			type_id: TypeId::of::<R>(),
			type_name: type_name::<R>(),
		}
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}
}

impl<T: ?Sized + 'static> CallConstraint<T> for ReturnTypeConstraint {
	fn is_match(&self, call: &CallInfo<T>) -> bool {
		call.method().returns().type_id() == self.type_id
	}

	fn cost(&self) -> MatchCost {
		MatchCost::Identity
	}
}

/// Matches calls accepted by a closure.
pub struct FnConstraint<T: ?Sized + 'static> {
	predicate: Arc<dyn Fn(&CallInfo<T>) -> bool + Send + Sync>,
}

impl<T: ?Sized + 'static> FnConstraint<T> {
	pub fn new(predicate: impl Fn(&CallInfo<T>) -> bool + Send + Sync + 'static) -> Self {
		Self {
			predicate: Arc::new(predicate),
		}
	}
}

impl<T: ?Sized + 'static> CallConstraint<T> for FnConstraint<T> {
	fn is_match(&self, call: &CallInfo<T>) -> bool {
		(self.predicate)(call)
	}
}

type ArgTest = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> bool + Send + Sync>;

/// Matcher for a single argument slot.
#[derive(Clone)]
pub enum ArgMatch {
	/// Any value of the given type.
	Any { type_id: TypeId, type_name: &'static str },
	/// A value equal to a constant.
	Eq {
		type_id: TypeId,
		type_name: &'static str,
		test: ArgTest,
	},
	/// A value accepted by a predicate.
	Predicate {
		type_id: TypeId,
		type_name: &'static str,
		test: ArgTest,
	},
	/// A by-reference slot whose current value satisfies the inner matcher.
	ByRef(Box<ArgMatch>),
}

impl ArgMatch {
	pub fn any<V: 'static>() -> Self {
		Self::Any {
			type_id: TypeId::of::<V>(),
			type_name: type_name::<V>(),
		}
	}

	pub fn eq<V: PartialEq + Send + Sync + 'static>(expected: V) -> Self {
		Self::Eq {
			type_id: TypeId::of::<V>(),
			type_name: type_name::<V>(),
			test: Arc::new(move |value: &(dyn Any + Send + Sync)| value.downcast_ref::<V>() == Some(&expected)),
		}
	}

	pub fn is<V: 'static>(predicate: impl Fn(&V) -> bool + Send + Sync + 'static) -> Self {
		Self::Predicate {
			type_id: TypeId::of::<V>(),
			type_name: type_name::<V>(),
			test: Arc::new(move |value: &(dyn Any + Send + Sync)| value.downcast_ref::<V>().is_some_and(&predicate)),
		}
	}

	pub fn by_ref(inner: ArgMatch) -> Self {
		match inner {
			Self::ByRef(_) => inner,
			other => Self::ByRef(Box::new(other)),
		}
	}

	pub fn is_by_ref(&self) -> bool {
		matches!(self, Self::ByRef(_))
	}

	pub fn type_id(&self) -> TypeId {
		match self {
			Self::Any { type_id, .. } | Self::Eq { type_id, .. } | Self::Predicate { type_id, .. } => *type_id,
			Self::ByRef(inner) => ArgMatch::type_id(inner),
		}
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Any { type_name, .. } | Self::Eq { type_name, .. } | Self::Predicate { type_name, .. } => *type_name,
			Self::ByRef(inner) => ArgMatch::type_name(inner),
		}
	}

	/// Evaluates the matcher against the current value of `arg`.
	pub fn matches(&self, arg: &Arg) -> bool {
		match (self, arg) {
			(Self::ByRef(inner), Arg::Ref(slot)) => slot.inspect(|value| inner.test(value)),
			(Self::ByRef(_), Arg::Val { .. }) | (_, Arg::Ref(_)) => false,
			(_, Arg::Val { value, .. }) => self.test(&**value),
		}
	}

	fn test(&self, value: &(dyn Any + Send + Sync)) -> bool {
		match self {
			Self::Any { type_id, .. } => value.type_id() == *type_id,
			Self::Eq { test, .. } | Self::Predicate { test, .. } => test(value),
			Self::ByRef(inner) => inner.test(value),
		}
	}

	/// Checks this matcher against a parameter descriptor.
	fn validate(&self, param: &Param) -> std::result::Result<(), String> {
		if self.is_by_ref() != param.is_ref() {
			let want = if param.is_ref() { "by-reference" } else { "by-value" };
			return Err(format!("parameter `{}` is {want}", param.name()));
		}
		if self.type_id() != param.type_id() {
			return Err(format!(
				"parameter `{}` has type `{}`, matcher expects `{}`",
				param.name(),
				param.type_name(),
				self.type_name()
			));
		}
		Ok(())
	}
}

impl fmt::Debug for ArgMatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Any { type_name, .. } => write!(f, "Any<{type_name}>"),
			Self::Eq { type_name, .. } => write!(f, "Eq<{type_name}>"),
			Self::Predicate { type_name, .. } => write!(f, "Predicate<{type_name}>"),
			Self::ByRef(inner) => write!(f, "ByRef({inner:?})"),
		}
	}
}

/// Positional argument constraint for one method.
#[derive(Clone, Debug)]
pub struct ArgsConstraint {
	matches: Arc<[ArgMatch]>,
}

impl ArgsConstraint {
	/// Builds the constraint, validating it against the method's parameters.
	pub fn new<T: ?Sized + 'static>(method: &'static Method<T>, matches: impl IntoIterator<Item = ArgMatch>) -> Result<Self> {
		let matches: Vec<ArgMatch> = matches.into_iter().collect();
		let params = method.params();
		if matches.len() != params.len() {
			return Err(Error::Constraint {
				method: method.name(),
				reason: format!("{} argument matchers for {} parameters", matches.len(), params.len()),
			});
		}
		for (param, matcher) in params.iter().zip(&matches) {
			matcher.validate(param).map_err(|reason| Error::Constraint {
				method: method.name(),
				reason,
			})?;
		}
		Ok(Self {
			matches: Arc::from(matches),
		})
	}

	pub fn matches(&self) -> &[ArgMatch] {
		&self.matches
	}
}

impl<T: ?Sized + 'static> CallConstraint<T> for ArgsConstraint {
	fn is_match(&self, call: &CallInfo<T>) -> bool {
		let args = call.args();
		args.len() == self.matches.len() && self.matches.iter().zip(args.iter()).all(|(m, arg)| m.matches(arg))
	}

	fn cost(&self) -> MatchCost {
		MatchCost::Arguments
	}
}

/// AND-combination of constraints, evaluated cheapest first.
pub struct CompositeConstraint<T: ?Sized + 'static> {
	parts: Arc<[Arc<dyn CallConstraint<T>>]>,
}

impl<T: ?Sized + 'static> Clone for CompositeConstraint<T> {
	fn clone(&self) -> Self {
		Self {
			parts: self.parts.clone(),
		}
	}
}

impl<T: ?Sized + 'static> Default for CompositeConstraint<T> {
	fn default() -> Self {
		Self { parts: Arc::from(Vec::new()) }
	}
}

impl<T: ?Sized + 'static> CompositeConstraint<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a new composite that additionally requires `constraint`.
	pub fn add_constraint(&self, constraint: Arc<dyn CallConstraint<T>>) -> Self {
		let mut parts = self.parts.to_vec();
		let cost = constraint.cost();
		let pos = parts.partition_point(|p| p.cost() <= cost);
		parts.insert(pos, constraint);
		Self { parts: Arc::from(parts) }
	}

	pub fn len(&self) -> usize {
		self.parts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.parts.is_empty()
	}
}

impl<T: ?Sized + 'static> CallConstraint<T> for CompositeConstraint<T> {
	fn is_match(&self, call: &CallInfo<T>) -> bool {
		self.parts.iter().all(|part| part.is_match(call))
	}

	fn cost(&self) -> MatchCost {
		self.parts.iter().map(|p| p.cost()).max().unwrap_or(MatchCost::Identity)
	}
}
