use std::future::Future;
use std::pin::Pin;

use crate::Result;

/// A pinned, boxed future that is required to be Send and 'static.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Return shape of an intercepted async method.
///
/// Async methods are modelled as synchronous calls returning this future, so a
/// handler may capture its relay handle and forward after an `.await`.
pub type CallFuture<R> = BoxFutureStatic<Result<R>>;
