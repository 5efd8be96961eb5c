use std::time::Duration;

/// Longest unique device identifier accepted, in bytes.
pub const MAX_UNIQUE_ID_LEN: usize = 1024;

/// Configuration shared by the device directory and the capture facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfiguration {
    /// Identifiers longer than this are rejected before enumeration
    /// (default: [`MAX_UNIQUE_ID_LEN`]).
    pub max_unique_id_len: usize,

    /// Upper bound on each asynchronous join (None = wait indefinitely).
    pub operation_timeout: Option<Duration>,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_unique_id_len == 0 {
            return Err("maximum unique id length must be positive".into());
        }
        if self.operation_timeout == Some(Duration::ZERO) {
            return Err("operation timeout must be non-zero".into());
        }
        Ok(())
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            max_unique_id_len: MAX_UNIQUE_ID_LEN,
            operation_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CaptureConfiguration::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_values() {
        let config = CaptureConfiguration {
            max_unique_id_len: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfiguration {
            operation_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
