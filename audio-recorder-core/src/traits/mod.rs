pub mod capture_device;
pub mod recorder_delegate;
