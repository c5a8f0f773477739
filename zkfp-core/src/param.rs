//! Device parameters
//!
//! `ZKFPM_GetParameters` copies a parameter value into a caller buffer and
//! reports how many bytes it wrote. Integer parameters are a native `int`
//! (little-endian on every supported platform), text parameters are
//! NUL-terminated ASCII.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::constants::MAX_IMAGE_DIMENSION;
use crate::error::{Error, Result};

/// Parameter codes understood by the reader
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Param {
    ImageWidth = 1,
    ImageHeight = 2,
    ImageDpi = 3,
    Vendor = 1101,
    Product = 1102,
    SerialNumber = 1103,
}

impl Param {
    /// Raw parameter code passed to the SDK
    pub fn code(self) -> u32 {
        self as u32
    }
    
    /// Check if the value is text rather than an integer
    pub fn is_text(self) -> bool {
        matches!(self, Self::Vendor | Self::Product | Self::SerialNumber)
    }
    
    pub fn name(self) -> &'static str {
        match self {
            Self::ImageWidth => "image width",
            Self::ImageHeight => "image height",
            Self::ImageDpi => "image dpi",
            Self::Vendor => "vendor",
            Self::Product => "product",
            Self::SerialNumber => "serial number",
        }
    }
}

impl From<Param> for u32 {
    fn from(param: Param) -> u32 {
        param as u32
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode a positive integer parameter such as an image dimension
///
/// Values above [`MAX_IMAGE_DIMENSION`] are rejected so a misreported
/// sensor size never turns into an unbounded frame allocation.
///
/// # Examples
///
/// ```
/// use zkfp_core::param::{decode_dimension, Param};
///
/// let width = decode_dimension(Param::ImageWidth, &300i32.to_le_bytes()).unwrap();
/// assert_eq!(width, 300);
/// ```
pub fn decode_dimension(param: Param, value: &[u8]) -> Result<u32> {
    if value.len() < 4 {
        return Err(Error::InvalidParameter {
            param,
            reason: format!("expected 4 bytes, device wrote {}", value.len()),
        });
    }
    
    let raw = LittleEndian::read_i32(&value[..4]);
    
    trace!(param = %param, raw, "Decoded integer parameter");
    
    let value = u32::try_from(raw)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| Error::InvalidParameter {
            param,
            reason: format!("value {} is not a positive size", raw),
        })?;
    
    if value > MAX_IMAGE_DIMENSION {
        return Err(Error::InvalidParameter {
            param,
            reason: format!("value {} exceeds {}", value, MAX_IMAGE_DIMENSION),
        });
    }
    
    Ok(value)
}

/// Decode a text parameter, stopping at the first NUL
pub fn decode_text(value: &[u8]) -> String {
    let end = value.iter().position(|b| *b == 0).unwrap_or(value.len());
    String::from_utf8_lossy(&value[..end]).trim().to_string()
}
