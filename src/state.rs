//! Shared application state for all routes.

use crate::store::Storage;

#[derive(Clone)]
pub struct AppState {
    /// Persistence handle, built once at startup.
    pub store: Storage,
}

impl AppState {
    pub fn new(store: Storage) -> Self {
        AppState { store }
    }

    pub fn in_memory() -> Self {
        AppState::new(Storage::new_in_memory())
    }
}
