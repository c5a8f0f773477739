//! Session state for a fingerprint reader
//!
//! A session tracks:
//! - How far the SDK lifecycle has progressed
//! - The message of the most recent failure

use std::fmt;

use tracing::debug;

use crate::error::Result;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// SDK not initialized
    Uninitialized,
    
    /// SDK initialized but the template database is missing
    ///
    /// Left behind when database creation fails after a successful SDK
    /// init. Not usable until `initialize` is retried; SDK teardown still
    /// happens on `terminate`.
    PartiallyInitialized,
    
    /// SDK and template database ready, no device open
    Ready,
    
    /// A device handle is held
    DeviceOpen,
}

impl SessionState {
    /// Check if the SDK itself is up (it may still lack a database)
    pub fn sdk_initialized(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
    
    /// Check if a device may be opened from this state
    pub fn can_open_device(self) -> bool {
        matches!(self, Self::Ready | Self::DeviceOpen)
    }
    
    /// Check if a device is open
    pub fn is_device_open(self) -> bool {
        matches!(self, Self::DeviceOpen)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "Uninitialized",
            Self::PartiallyInitialized => "PartiallyInitialized",
            Self::Ready => "Ready",
            Self::DeviceOpen => "DeviceOpen",
        };
        f.write_str(name)
    }
}

/// Message of the most recent failed operation
///
/// Every result of a public session operation goes through
/// [`record`](LastError::record): a failure overwrites the message, a
/// success clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastError {
    message: String,
}

impl LastError {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Update from an operation result and pass the result through
    ///
    /// # Examples
    ///
    /// ```
    /// use zkfp_core::{Error, LastError};
    ///
    /// let mut last = LastError::new();
    /// let _ = last.record::<()>(Err(Error::DeviceNotOpen));
    /// assert_eq!(last.message(), "Device not opened");
    ///
    /// let _ = last.record(Ok(()));
    /// assert!(last.is_empty());
    /// ```
    pub fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.message.clear(),
            Err(e) => {
                debug!(error = %e, "Operation failed");
                self.message = e.to_string();
            }
        }
        result
    }
    
    /// Clear after an operation that cannot fail
    pub fn clear(&mut self) {
        self.message.clear();
    }
    
    pub fn message(&self) -> &str {
        &self.message
    }
    
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::status::SdkCode;
    use pretty_assertions::assert_eq;
    
    #[test]
    fn test_state_predicates() {
        assert!(!SessionState::Uninitialized.sdk_initialized());
        assert!(SessionState::PartiallyInitialized.sdk_initialized());
        assert!(!SessionState::PartiallyInitialized.can_open_device());
        assert!(SessionState::Ready.can_open_device());
        assert!(!SessionState::Ready.is_device_open());
        assert!(SessionState::DeviceOpen.is_device_open());
    }
    
    #[test]
    fn test_last_error_starts_empty() {
        let last = LastError::new();
        assert!(last.is_empty());
        assert_eq!(last.message(), "");
    }
    
    #[test]
    fn test_last_error_set_then_cleared() {
        let mut last = LastError::new();
        
        let result = last.record::<u32>(Err(Error::DbClear(SdkCode::FAIL)));
        assert!(result.is_err());
        assert_eq!(last.message(), "Failed to clear fingerprints. Error code: ZKFP_ERR_FAIL(-17)");
        
        let result = last.record(Ok(7));
        assert_eq!(result, Ok(7));
        assert!(last.is_empty());
    }
    
    #[test]
    fn test_last_error_overwritten() {
        let mut last = LastError::new();
        let _ = last.record::<()>(Err(Error::DeviceNotOpen));
        let _ = last.record::<()>(Err(Error::DbUnavailable));
        assert_eq!(last.message(), "DB cache not available");
    }
}
