use std::fmt;

use super::error::CaptureError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// uninitialized → initialized → configuring → started → stopping ─┐
///                      ↑                                          │
///                      └──────────────────────────────────────────┘
/// any transition → failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Configuring,
    Started,
    Stopping,
    Failed(CaptureError),
}

impl SessionState {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Configuring => "configuring",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(error) => write!(f, "failed ({})", error),
            other => f.write_str(other.name()),
        }
    }
}
