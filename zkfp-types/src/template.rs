//! Fingerprint templates and their hex rendering
//!
//! A template is the SDK-defined encoding of a fingerprint's features. It is
//! opaque to this crate: we only carry the bytes and render them as
//! uppercase hex (two digits per byte, no separators) for display.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// A biometric template produced by a live capture or an image extraction
///
/// Two templates are equal when their bytes are; the capture time is not
/// compared.
#[derive(Clone)]
pub struct CapturedTemplate {
    data: Bytes,
    hex: String,
    captured_at: DateTime<Utc>,
}

impl CapturedTemplate {
    /// Wrap template bytes, stamping them with the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use zkfp_types::CapturedTemplate;
    ///
    /// let template = CapturedTemplate::new(vec![0x0A, 0xFF]);
    /// assert_eq!(template.hex(), "0AFF");
    /// ```
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let hex = hex::encode_upper(&data);
        
        Self {
            data,
            hex,
            captured_at: Utc::now(),
        }
    }
    
    /// Parse a template back from its hex rendering
    ///
    /// Accepts either case. Fails on odd length or non-hex characters.
    pub fn from_hex(text: &str) -> Result<Self> {
        let data = hex::decode(text)
            .map_err(|e| Error::Parse(format!("invalid template hex: {}", e)))?;
        
        Ok(Self::new(data))
    }
    
    /// Raw template bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
    
    /// Shared handle to the template bytes
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }
    
    /// Uppercase hex rendering, `2 * len()` characters
    pub fn hex(&self) -> &str {
        &self.hex
    }
    
    pub fn len(&self) -> usize {
        self.data.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    
    /// When the template was produced
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl PartialEq for CapturedTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for CapturedTemplate {}

impl fmt::Debug for CapturedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedTemplate")
            .field("len", &self.data.len())
            .field("hex", &&self.hex[..self.hex.len().min(32)])
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

impl fmt::Display for CapturedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    
    #[test]
    fn test_hex_is_uppercase_without_separators() {
        let template = CapturedTemplate::new(vec![0x00, 0x1f, 0xab, 0xff]);
        assert_eq!(template.hex(), "001FABFF");
        assert_eq!(template.to_string(), "001FABFF");
    }
    
    #[test]
    fn test_empty_template() {
        let template = CapturedTemplate::new(Vec::new());
        assert!(template.is_empty());
        assert_eq!(template.hex(), "");
    }
    
    #[test]
    fn test_sixty_four_byte_template_renders_128_chars() {
        let template = CapturedTemplate::new(vec![0x5A; 64]);
        assert_eq!(template.hex().len(), 128);
    }
    
    #[test]
    fn test_from_hex_accepts_lowercase() {
        let template = CapturedTemplate::from_hex("0aff").unwrap();
        assert_eq!(template.as_bytes(), &[0x0A, 0xFF]);
        assert_eq!(template.hex(), "0AFF");
    }
    
    #[test]
    fn test_equality_ignores_capture_time() {
        let before = Utc::now();
        let first = CapturedTemplate::new(vec![0x01, 0x02]);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = CapturedTemplate::from_hex("0102").unwrap();
        
        assert!(first.captured_at() >= before);
        assert!(second.captured_at() > first.captured_at());
        assert_eq!(first, second);
        assert_ne!(first, CapturedTemplate::new(vec![0x01]));
    }
    
    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(matches!(CapturedTemplate::from_hex("ABC"), Err(Error::Parse(_))));
        assert!(matches!(CapturedTemplate::from_hex("ZZ"), Err(Error::Parse(_))));
    }
    
    proptest! {
        #[test]
        fn prop_hex_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let template = CapturedTemplate::new(data.clone());
            
            prop_assert_eq!(template.hex().len(), 2 * data.len());
            prop_assert!(template
                .hex()
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
            
            let decoded = CapturedTemplate::from_hex(template.hex()).unwrap();
            prop_assert_eq!(decoded.as_bytes(), &data[..]);
        }
    }
}
