pub mod capability;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod frame;
pub mod state;
