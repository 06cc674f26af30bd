//! Hand-written proxy adapter shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use shunt::{Bound, CallArgs, CallFuture, CallSink, Method, Param, ProxyTarget, Ref, RefSlot, Result, Returns, Value};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub trait Greeter: Send + Sync {
	fn greet(&self, name: &str) -> Result<String>;

	fn count(&self) -> Result<usize>;

	fn bump(&self, counter: &mut i32) -> Result<()>;

	fn fetch(&self, key: u32) -> CallFuture<String>;
}

/// Root implementation; counts every call it receives.
#[derive(Default)]
pub struct RealGreeter {
	calls: AtomicUsize,
}

impl RealGreeter {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn hit(&self) -> usize {
		self.calls.fetch_add(1, Ordering::SeqCst) + 1
	}
}

impl Greeter for RealGreeter {
	fn greet(&self, name: &str) -> Result<String> {
		self.hit();
		Ok(format!("hello {name}"))
	}

	fn count(&self) -> Result<usize> {
		Ok(self.hit())
	}

	fn bump(&self, counter: &mut i32) -> Result<()> {
		self.hit();
		*counter += 1;
		Ok(())
	}

	fn fetch(&self, key: u32) -> CallFuture<String> {
		self.hit();
		Box::pin(async move {
			tokio::task::yield_now().await;
			Ok(format!("value-{key}"))
		})
	}
}

/// Another implementation used as a retarget destination.
pub struct LoudGreeter;

impl Greeter for LoudGreeter {
	fn greet(&self, name: &str) -> Result<String> {
		Ok(format!("HELLO {}", name.to_uppercase()))
	}

	fn count(&self) -> Result<usize> {
		Ok(1000)
	}

	fn bump(&self, counter: &mut i32) -> Result<()> {
		*counter += 100;
		Ok(())
	}

	fn fetch(&self, key: u32) -> CallFuture<String> {
		Box::pin(async move { Ok(format!("LOUD-{key}")) })
	}
}

const GREET_PARAMS: &[Param] = &[Param::of::<String>("name")];
const BUMP_PARAMS: &[Param] = &[Param::by_ref::<i32>("counter")];
const FETCH_PARAMS: &[Param] = &[Param::of::<u32>("key")];

pub static GREET: Method<dyn Greeter> = Method::new("greet", GREET_PARAMS, Returns::of::<String>(), |root, args| {
	root.greet(&args.value::<String>(0)?).map(Value::new)
});

pub static COUNT: Method<dyn Greeter> = Method::new("count", &[], Returns::of::<usize>(), |root, _| root.count().map(Value::new));

pub static BUMP: Method<dyn Greeter> = Method::new("bump", BUMP_PARAMS, Returns::of::<()>(), |root, args| {
	let mut bound = Bound::<(Ref<i32>,)>::bind(args)?;
	root.bump(&mut bound.0)?;
	Ok(Value::unit())
});

pub static FETCH: Method<dyn Greeter> = Method::new("fetch", FETCH_PARAMS, Returns::of::<CallFuture<String>>(), |root, args| {
	Ok(Value::future(root.fetch(args.value(0)?)))
});

pub struct GreeterProxy {
	sink: CallSink<dyn Greeter>,
}

impl Greeter for GreeterProxy {
	fn greet(&self, name: &str) -> Result<String> {
		self.sink.call_as(&GREET, CallArgs::new().with(name.to_owned()))
	}

	fn count(&self) -> Result<usize> {
		self.sink.call_as(&COUNT, CallArgs::new())
	}

	fn bump(&self, counter: &mut i32) -> Result<()> {
		let args = CallArgs::new().with_ref(RefSlot::new(*counter));
		let result = self.sink.call_as::<()>(&BUMP, args.clone());
		args.copy_out(0, counter)?;
		result
	}

	fn fetch(&self, key: u32) -> CallFuture<String> {
		self.sink.call_async(&FETCH, CallArgs::new().with(key))
	}
}

impl ProxyTarget for dyn Greeter {
	fn proxy(sink: CallSink<Self>) -> Arc<Self> {
		Arc::new_cyclic(|me: &Weak<GreeterProxy>| GreeterProxy {
			sink: sink.with_proxy(me.clone()),
		})
	}
}
