use serde::{Deserialize, Serialize};

/// A video capture device as reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Stable platform identifier (e.g. a symbolic link).
    pub unique_id: String,
    /// Human-readable name for device pickers.
    pub display_name: String,
}

impl DeviceDescriptor {
    pub fn new(unique_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Whether this device's identifier begins with `prefix`, compared as bytes.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.unique_id.as_bytes().starts_with(prefix.as_bytes())
    }
}
