//! View-scoped cancellation.
//!
//! A [`ViewScope`] lives as long as the view (or request) that started some
//! loads. Dropping it cancels whatever is still in flight, so a late answer
//! can never be applied to a view that has gone away.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{Result, StorefrontError};

#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the scope is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(StorefrontError::Cancelled),
            result = fut => result,
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
