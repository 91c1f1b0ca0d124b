//! The loader contract.
//!
//! A [`Loader`] turns one request tuple into one asynchronous outcome. Any
//! `Fn(R) -> impl Future<Output = Result<T, E>>` closure is a loader, as long
//! as its error converts into a [`BoxError`]:
//!
//! ```
//! use vela_resource::loader::Loader;
//!
//! let loader = |(limit,): (u32,)| async move {
//!     if limit == 8 {
//!         return Err("error happened on the server");
//!     }
//!     Ok((1..=limit).collect::<Vec<_>>())
//! };
//!
//! # fn assert_loader<L: Loader<(u32,), Vec<u32>>>(_: &L) {}
//! assert_loader(&loader);
//! ```

use core::future::Future;

use futures::future::BoxFuture;

use crate::error::BoxError;

/// Asynchronous producer of a resource's value.
///
/// The scheduler may call `load` many times, with different request tuples,
/// and retries failed calls with the same tuple. Each call must settle exactly
/// once; a call that never settles is cut off by the configured timeout.
pub trait Loader<R, T>: Send + Sync + 'static {
    /// Starts loading the value for `request`.
    fn load(&self, request: R) -> BoxFuture<'static, Result<T, BoxError>>;
}

impl<R, T, E, F, Fut> Loader<R, T> for F
where
    R: 'static,
    T: 'static,
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn load(&self, request: R) -> BoxFuture<'static, Result<T, BoxError>> {
        let future = self(request);
        Box::pin(async move { future.await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closures_are_loaders() {
        let loader = |(a, b): (i32, i32)| async move { Ok::<_, std::io::Error>(a + b) };
        let sum = loader.load((2, 3)).await.expect("loader succeeds");
        assert_eq!(sum, 5);
    }

    #[tokio::test]
    async fn loader_errors_are_boxed() {
        let loader = |(): ()| async { Err::<u8, _>("nope") };
        let error = loader.load(()).await.expect_err("loader fails");
        assert_eq!(error.to_string(), "nope");
    }
}
