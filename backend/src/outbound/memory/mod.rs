//! In-process adapters for the repository ports.
//!
//! Used when no database URL is configured and by the HTTP integration
//! tests. State lives behind a mutex; every port method takes the lock once,
//! so the conditional loan transition is atomic with respect to other calls.

mod loan_repository;
mod user_repository;

pub use loan_repository::InMemoryLoanRepository;
pub use user_repository::InMemoryUserRepository;

use std::sync::{Mutex, MutexGuard};

/// Lock `mutex`, turning poisoning into an adapter error built by `poisoned`.
fn lock<'a, T, E>(
    mutex: &'a Mutex<T>,
    poisoned: impl FnOnce(&'static str) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    mutex
        .lock()
        .map_err(|_| poisoned("in-memory store lock poisoned"))
}

/// Slice out one page from an already ordered list.
fn page_of<T: Clone>(items: &[T], page: pagination::PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    items
        .iter()
        .skip(offset)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}
