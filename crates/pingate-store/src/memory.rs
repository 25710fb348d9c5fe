//! In-memory store. Used for `mode = "memory"` and in tests.

use std::sync::RwLock;
#[cfg(any(test, feature = "test-utils"))]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pingate_core::AuthPolicyState;

use crate::error::{StoreError, StoreResult};
use crate::traits::PolicyStore;

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<AuthPolicyState>,
    use_biometry: RwLock<bool>,
    #[cfg(any(test, feature = "test-utils"))]
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state, e.g. one restored elsewhere.
    pub fn with_state(state: AuthPolicyState, use_biometry: bool) -> Self {
        Self {
            state: RwLock::new(state),
            use_biometry: RwLock::new(use_biometry),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail with `Unavailable`.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        #[cfg(any(test, feature = "test-utils"))]
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".into())
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn load_state(&self) -> StoreResult<AuthPolicyState> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.clone())
    }

    async fn save_state(&self, state: &AuthPolicyState) -> StoreResult<()> {
        self.check_writable()?;
        *self.state.write().map_err(|_| Self::poisoned())? = state.clone();
        Ok(())
    }

    async fn biometry_enabled(&self) -> StoreResult<bool> {
        Ok(*self.use_biometry.read().map_err(|_| Self::poisoned())?)
    }

    async fn set_biometry_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.check_writable()?;
        *self.use_biometry.write().map_err(|_| Self::poisoned())? = enabled;
        Ok(())
    }
}
