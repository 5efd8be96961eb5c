pub mod capture_backend;
pub mod capture_delegate;
pub mod device_provider;
pub mod frame_consumer;
