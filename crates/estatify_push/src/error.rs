//! Error taxonomy for the push subsystem.
//!
//! Nothing in this subsystem is fatal to the host application. Acquisition
//! failures are absorbed at the acquirer boundary, registration failures are
//! returned as typed results and logged by the session coordinator, and
//! sandboxed scheduling is a documented no-op rather than an error.

use estatify_common::StorageError;
use thiserror::Error;

/// Errors surfaced by the push subsystem
#[derive(Error, Debug)]
pub enum PushError {
    /// The runtime is sandboxed and native notification capability is
    /// unavailable. Expected in managed runtimes; not surfaced loudly.
    #[error("notification capability unavailable in this environment")]
    CapabilityUnavailable,

    /// The user declined the notification permission prompt
    #[error("notification permission denied by the user")]
    PermissionDenied,

    /// The native token fetch threw; mitigated by fallback synthesis
    #[error("failed to acquire a device token: {0}")]
    AcquisitionFailed(String),

    /// No authenticated session token was present when registration was
    /// attempted; the network call is never made in this case
    #[error("no authenticated session token available")]
    AuthMissing,

    /// A registration refresh was requested but no token is cached
    #[error("no device token is cached for this installation")]
    NoTokenAvailable,

    /// The backend answered with a non-2xx status
    #[error("backend rejected the request: status={status}, message='{message}'")]
    BackendError { status: u16, message: String },

    /// Transport-level failure talking to the backend
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The native scheduling call failed in a non-sandboxed environment
    #[error("failed to schedule notification: {0}")]
    SchedulingFailed(String),

    /// Durable local storage failed
    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),
}
