//! Error types for zkfp-core

use crate::param::Param;
use crate::status::SdkCode;

/// Result type alias for zkfp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session errors
///
/// Every failing session operation produces exactly one of these; the
/// rendered message is what the session reports as its last error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `ZKFPM_Init` reported a failure
    #[error("Failed to initialize SDK. Error code: {0}")]
    SdkInit(SdkCode),
    
    /// The template database handle could not be created
    #[error("Failed to create fingerprint DB cache")]
    DbCreate,
    
    /// Device could not be opened
    #[error("Failed to open device {index}: {reason}")]
    DeviceOpen {
        index: u32,
        reason: String,
    },
    
    /// Operation needs an open device
    #[error("Device not opened")]
    DeviceNotOpen,
    
    /// Operation needs the template database
    #[error("DB cache not available")]
    DbUnavailable,
    
    /// Clearing the template database failed
    #[error("Failed to clear fingerprints. Error code: {0}")]
    DbClear(SdkCode),
    
    /// Template extraction from a still image failed
    #[error("Failed to extract template from image. Error code: {0}")]
    TemplateExtract(SdkCode),
    
    /// Live acquisition failed
    #[error("{message}. Error code: {code}")]
    Capture {
        code: SdkCode,
        message: String,
    },
    
    /// Reading a device parameter failed
    #[error("Failed to get {param}. Error code: {code}")]
    Parameter {
        param: Param,
        code: SdkCode,
    },
    
    /// Device reported an unusable parameter value
    #[error("Invalid {param} parameter: {reason}")]
    InvalidParameter {
        param: Param,
        reason: String,
    },
    
    /// Biometric operation with no defined behaviour
    #[error("{0}() not implemented yet")]
    NotImplemented(&'static str),
    
    /// Value type error
    #[error("Type error: {0}")]
    Types(#[from] zkfp_types::Error),
}

impl Error {
    /// SDK status carried by the error, if any
    pub fn sdk_code(&self) -> Option<SdkCode> {
        match self {
            Self::SdkInit(code)
            | Self::DbClear(code)
            | Self::TemplateExtract(code)
            | Self::Capture { code, .. }
            | Self::Parameter { code, .. } => Some(*code),
            _ => None,
        }
    }
    
    /// Check if error means the device must be (re)connected first
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            Self::SdkInit(_)
                | Self::DbCreate
                | Self::DeviceOpen { .. }
                | Self::DeviceNotOpen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::SdkInit(SdkCode::INIT_LIB).to_string(),
            "Failed to initialize SDK. Error code: ZKFP_ERR_INITLIB(-1)"
        );
        assert_eq!(
            Error::Capture {
                code: SdkCode::CAPTURE,
                message: "Failed to acquire fingerprint".into(),
            }
            .to_string(),
            "Failed to acquire fingerprint. Error code: ZKFP_ERR_CAPTURE(-8)"
        );
        assert_eq!(
            Error::NotImplemented("Verify").to_string(),
            "Verify() not implemented yet"
        );
    }
    
    #[test]
    fn test_sdk_code() {
        assert_eq!(Error::DbClear(SdkCode::FAIL).sdk_code(), Some(SdkCode::FAIL));
        assert_eq!(Error::DeviceNotOpen.sdk_code(), None);
    }
    
    #[test]
    fn test_requires_reconnect() {
        assert!(Error::DeviceNotOpen.requires_reconnect());
        assert!(!Error::DbUnavailable.requires_reconnect());
        assert!(!Error::NotImplemented("Identify").requires_reconnect());
    }
}
