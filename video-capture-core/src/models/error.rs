use thiserror::Error;

/// Errors surfaced by the public capture operations.
///
/// Native failures never cross a session boundary as-is; every asynchronous
/// step converts its [`NativeError`] into one of these variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("device initialization failed: {0}")]
    InitializationError(String),

    #[error("format not supported: {0}")]
    FormatNotSupported(String),

    #[error("capture already started")]
    AlreadyStarted,

    #[error("start capture failed: {0}")]
    StartCaptureError(String),

    #[error("native capture failure ({code:#010x}): {message}")]
    NativeCaptureFailure { code: i32, message: String },

    #[error("no capture device initialized")]
    NotInitialized,
}

/// Failure reported by a native backend from one of its asynchronous steps.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} (code {code:#010x})")]
pub struct NativeError {
    pub code: i32,
    pub message: String,
}

impl NativeError {
    /// Generic failure (`E_FAIL`).
    pub const FAILED: i32 = 0x8000_4005_u32 as i32;
    /// The completion was dropped before it resolved (`E_ABORT`).
    pub const ABANDONED: i32 = 0x8000_4004_u32 as i32;
    /// A join exceeded its deadline (`HRESULT_FROM_WIN32(ERROR_TIMEOUT)`).
    pub const TIMED_OUT: i32 = 0x8007_05B4_u32 as i32;
    /// The operation is not valid in the current state
    /// (`HRESULT_FROM_WIN32(ERROR_INVALID_STATE)`).
    pub const INVALID_STATE: i32 = 0x8007_139F_u32 as i32;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(Self::FAILED, message)
    }

    pub fn abandoned() -> Self {
        Self::new(Self::ABANDONED, "operation abandoned before completion")
    }

    pub fn timed_out() -> Self {
        Self::new(Self::TIMED_OUT, "operation timed out")
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_STATE, message)
    }

    pub fn is_timeout(&self) -> bool {
        self.code == Self::TIMED_OUT
    }
}

impl From<NativeError> for CaptureError {
    /// Out-of-band failures keep their native code.
    fn from(error: NativeError) -> Self {
        Self::NativeCaptureFailure {
            code: error.code,
            message: error.message,
        }
    }
}
