//! Process-wide one-time initialization for expensive map resources.
//!
//! A tile backend or rendering library gets initialized exactly once no
//! matter how many screens race to use it: concurrent callers all await the
//! same in-flight initialization instead of starting a second one.

use std::future::Future;

use tokio::sync::OnceCell;

pub struct SharedInit<T> {
    cell: OnceCell<T>,
}

impl<T> SharedInit<T> {
    /// `const` so instances can live in a `static`.
    pub const fn new() -> Self {
        SharedInit {
            cell: OnceCell::const_new(),
        }
    }

    /// Get the resource, running `init` if nobody has yet. A failed
    /// initialization leaves the cell empty so a later caller can retry.
    pub async fn get_or_try_init<E, F, Fut>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell.get_or_try_init(init).await
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }
}

impl<T> Default for SharedInit<T> {
    fn default() -> Self {
        Self::new()
    }
}
