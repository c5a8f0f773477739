//! Type definitions for zkfp

pub mod device_info;
pub mod error;
pub mod frame;
pub mod template;

pub use device_info::DeviceInfo;
pub use error::{Error, Result};
pub use frame::CaptureFrame;
pub use template::CapturedTemplate;
