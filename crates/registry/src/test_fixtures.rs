use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use shunt_invocation::{CallArgs, CallFuture, CallInfo, Method, Param, RefSlot, Result, Returns, Value};

use crate::redirect::RedirectCall;

pub(crate) trait Calc: Send + Sync {
	fn add(&self, a: i32, b: i32) -> i32;

	fn label(&self) -> String;

	fn bump(&self, counter: &mut i32);

	fn fetch(&self, key: i32) -> CallFuture<i32>;
}

/// Root implementation counting how often it is reached.
#[derive(Default)]
pub(crate) struct RealCalc {
	pub(crate) hits: AtomicUsize,
}

impl RealCalc {
	pub(crate) fn hits(&self) -> usize {
		self.hits.load(Ordering::SeqCst)
	}
}

impl Calc for RealCalc {
	fn add(&self, a: i32, b: i32) -> i32 {
		self.hits.fetch_add(1, Ordering::SeqCst);
		a + b
	}

	fn label(&self) -> String {
		self.hits.fetch_add(1, Ordering::SeqCst);
		"real".into()
	}

	fn bump(&self, counter: &mut i32) {
		self.hits.fetch_add(1, Ordering::SeqCst);
		*counter += 1;
	}

	fn fetch(&self, key: i32) -> CallFuture<i32> {
		self.hits.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move {
			tokio::task::yield_now().await;
			Ok(key * 2)
		})
	}
}

const ADD_PARAMS: &[Param] = &[Param::of::<i32>("a"), Param::of::<i32>("b")];
const BUMP_PARAMS: &[Param] = &[Param::by_ref::<i32>("counter")];

pub(crate) static ADD: Method<dyn Calc> = Method::new("add", ADD_PARAMS, Returns::of::<i32>(), |root, args| {
	Ok(Value::new(root.add(args.value(0)?, args.value(1)?)))
});

pub(crate) static LABEL: Method<dyn Calc> = Method::new("label", &[], Returns::of::<String>(), |root, _| Ok(Value::new(root.label())));

pub(crate) static BUMP: Method<dyn Calc> = Method::new("bump", BUMP_PARAMS, Returns::of::<()>(), |root, args| {
	let mut counter = args.value::<i32>(0)?;
	root.bump(&mut counter);
	args.slot(0)?.set(counter);
	Ok(Value::unit())
});

const FETCH_PARAMS: &[Param] = &[Param::of::<i32>("key")];

pub(crate) static FETCH: Method<dyn Calc> = Method::new("fetch", FETCH_PARAMS, Returns::of::<CallFuture<i32>>(), |root, args| {
	Ok(Value::future(root.fetch(args.value(0)?)))
});

pub(crate) fn real() -> Arc<RealCalc> {
	Arc::new(RealCalc::default())
}

pub(crate) fn call_on(root: &Arc<RealCalc>, method: &'static Method<dyn Calc>, args: CallArgs) -> CallInfo<dyn Calc> {
	let root: Arc<dyn Calc> = root.clone();
	CallInfo::new(root.clone(), Some(root), method, args)
}

pub(crate) fn add_call(root: &Arc<RealCalc>, a: i32, b: i32) -> CallInfo<dyn Calc> {
	call_on(root, &ADD, CallArgs::new().with(a).with(b))
}

pub(crate) fn bump_call(root: &Arc<RealCalc>, slot: &RefSlot) -> CallInfo<dyn Calc> {
	call_on(root, &BUMP, CallArgs::new().with_ref(slot.clone()))
}

/// Handler returning `value` without forwarding.
pub(crate) fn returning(value: i32) -> impl Fn(RedirectCall<dyn Calc>) -> Result<Value> + Send + Sync + 'static {
	move |_| Ok(Value::new(value))
}

/// Handler forwarding and adding `delta` to the result.
pub(crate) fn adding(delta: i32) -> impl Fn(RedirectCall<dyn Calc>) -> Result<Value> + Send + Sync + 'static {
	move |call| Ok(Value::new(call.call_next()?.downcast::<i32>()? + delta))
}
