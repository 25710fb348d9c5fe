use async_trait::async_trait;
use pingate_core::AuthPolicyState;

use crate::error::StoreResult;

/// Durable home for the gate's state.
///
/// Uses `async-trait` for object safety (`dyn PolicyStore`). Each call is a
/// complete read or a complete replace; implementations must never expose a
/// half-written record, and concurrent writers of the two records must not
/// clobber each other.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Load attempt and lockout state. A store that was never written
    /// returns the default state.
    async fn load_state(&self) -> StoreResult<AuthPolicyState>;

    /// Replace attempt and lockout state.
    async fn save_state(&self, state: &AuthPolicyState) -> StoreResult<()>;

    /// Whether the user has biometric unlock switched on.
    async fn biometry_enabled(&self) -> StoreResult<bool>;

    async fn set_biometry_enabled(&self, enabled: bool) -> StoreResult<()>;
}
