//! SDK status codes
//!
//! Every `ZKFPM_*` call reports an integer status. Zero is success, negative
//! values are errors from the vendor error table.

use std::fmt;

/// Result of a single SDK call
pub type SdkResult<T> = std::result::Result<T, SdkCode>;

/// Status code returned by the fingerprint SDK
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SdkCode(pub i32);

impl SdkCode {
    pub const ALREADY_INIT: Self = Self(1);
    pub const OK: Self = Self(0);
    pub const INIT_LIB: Self = Self(-1);
    pub const INIT: Self = Self(-2);
    pub const NO_DEVICE: Self = Self(-3);
    pub const NOT_SUPPORT: Self = Self(-4);
    pub const INVALID_PARAM: Self = Self(-5);
    pub const OPEN: Self = Self(-6);
    pub const INVALID_HANDLE: Self = Self(-7);
    pub const CAPTURE: Self = Self(-8);
    pub const EXTRACT_FP: Self = Self(-9);
    pub const ABORT: Self = Self(-10);
    pub const MEMORY_NOT_ENOUGH: Self = Self(-11);
    pub const BUSY: Self = Self(-12);
    pub const ADD_FINGER: Self = Self(-13);
    pub const DEL_FINGER: Self = Self(-14);
    pub const FAIL: Self = Self(-17);
    pub const CANCEL: Self = Self(-18);
    pub const VERIFY_FP: Self = Self(-20);
    pub const MERGE: Self = Self(-22);
    pub const NOT_OPENED: Self = Self(-23);
    pub const NOT_INIT: Self = Self(-24);
    pub const ALREADY_OPENED: Self = Self(-25);
    pub const LOAD_IMAGE: Self = Self(-26);
    pub const ANALYSE_IMAGE: Self = Self(-27);
    pub const TIMEOUT: Self = Self(-28);
    
    /// Turn a raw status into a result
    ///
    /// # Examples
    ///
    /// ```
    /// use zkfp_core::SdkCode;
    ///
    /// assert!(SdkCode::from_status(0).is_ok());
    /// assert_eq!(SdkCode::from_status(-8), Err(SdkCode::CAPTURE));
    /// ```
    pub fn from_status(status: i32) -> SdkResult<()> {
        if status == Self::OK.0 {
            Ok(())
        } else {
            Err(Self(status))
        }
    }
    
    /// Raw integer value
    pub fn code(self) -> i32 {
        self.0
    }
    
    /// Check if this is the success code
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }
    
    /// Get the vendor symbolic name
    pub fn name(self) -> &'static str {
        match self {
            Self::ALREADY_INIT => "ZKFP_ERR_ALREADY_INIT",
            Self::OK => "ZKFP_ERR_OK",
            Self::INIT_LIB => "ZKFP_ERR_INITLIB",
            Self::INIT => "ZKFP_ERR_INIT",
            Self::NO_DEVICE => "ZKFP_ERR_NO_DEVICE",
            Self::NOT_SUPPORT => "ZKFP_ERR_NOT_SUPPORT",
            Self::INVALID_PARAM => "ZKFP_ERR_INVALID_PARAM",
            Self::OPEN => "ZKFP_ERR_OPEN",
            Self::INVALID_HANDLE => "ZKFP_ERR_INVALID_HANDLE",
            Self::CAPTURE => "ZKFP_ERR_CAPTURE",
            Self::EXTRACT_FP => "ZKFP_ERR_EXTRACT_FP",
            Self::ABORT => "ZKFP_ERR_ABSORT",
            Self::MEMORY_NOT_ENOUGH => "ZKFP_ERR_MEMORY_NOT_ENOUGH",
            Self::BUSY => "ZKFP_ERR_BUSY",
            Self::ADD_FINGER => "ZKFP_ERR_ADD_FINGER",
            Self::DEL_FINGER => "ZKFP_ERR_DEL_FINGER",
            Self::FAIL => "ZKFP_ERR_FAIL",
            Self::CANCEL => "ZKFP_ERR_CANCEL",
            Self::VERIFY_FP => "ZKFP_ERR_VERIFY_FP",
            Self::MERGE => "ZKFP_ERR_MERGE",
            Self::NOT_OPENED => "ZKFP_ERR_NOT_OPENED",
            Self::NOT_INIT => "ZKFP_ERR_NOT_INIT",
            Self::ALREADY_OPENED => "ZKFP_ERR_ALREADY_OPENED",
            Self::LOAD_IMAGE => "ZKFP_ERR_LOADIMAGE",
            Self::ANALYSE_IMAGE => "ZKFP_ERR_ANALYSE_IMG",
            Self::TIMEOUT => "ZKFP_ERR_TIMEOUT",
            _ => "ZKFP_ERR_UNKNOWN",
        }
    }
}

impl From<SdkCode> for i32 {
    fn from(code: SdkCode) -> i32 {
        code.0
    }
}

impl From<i32> for SdkCode {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for SdkCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}
