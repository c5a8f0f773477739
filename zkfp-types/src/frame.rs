//! Grayscale capture frames

use std::fmt;

use bytes::Bytes;

use crate::error::{Error, Result};

/// A grayscale image captured from the sensor
///
/// One byte per pixel, row-major. The buffer always holds exactly
/// `width * height` bytes, so a renderer can hand it straight to a texture.
#[derive(Clone, PartialEq, Eq)]
pub struct CaptureFrame {
    width: u32,
    height: u32,
    pixels: Bytes,
}

impl CaptureFrame {
    /// Build a frame, checking the buffer against the dimensions
    ///
    /// # Examples
    ///
    /// ```
    /// use zkfp_types::CaptureFrame;
    ///
    /// let frame = CaptureFrame::new(2, 2, vec![0u8; 4]).unwrap();
    /// assert_eq!(frame.pixels().len(), 4);
    ///
    /// assert!(CaptureFrame::new(2, 2, vec![0u8; 3]).is_err());
    /// ```
    pub fn new(width: u32, height: u32, pixels: impl Into<Bytes>) -> Result<Self> {
        let pixels = pixels.into();
        let expected = Self::buffer_len(width, height)?;
        
        if pixels.len() != expected {
            return Err(Error::Validation(format!(
                "frame buffer holds {} bytes, {}x{} needs {}",
                pixels.len(),
                width,
                height,
                expected
            )));
        }
        
        Ok(Self { width, height, pixels })
    }
    
    /// Number of bytes a `width` x `height` frame occupies
    pub fn buffer_len(width: u32, height: u32) -> Result<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::Validation(format!("frame {}x{} is too large", width, height)))
    }
    
    pub fn width(&self) -> u32 {
        self.width
    }
    
    pub fn height(&self) -> u32 {
        self.height
    }
    
    /// Row-major grayscale pixels
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
    
    /// Pixel at (`x`, `y`), `None` outside the frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

impl fmt::Debug for CaptureFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_frame_buffer_matches_dimensions() {
        let frame = CaptureFrame::new(300, 400, vec![0u8; 120_000]).unwrap();
        assert_eq!(frame.width(), 300);
        assert_eq!(frame.height(), 400);
        assert_eq!(frame.pixels().len(), 120_000);
    }
    
    #[test]
    fn test_frame_rejects_short_buffer() {
        let result = CaptureFrame::new(300, 400, vec![0u8; 119_999]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }
    
    #[test]
    fn test_frame_pixel_lookup() {
        let frame = CaptureFrame::new(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(frame.pixel(0, 0), Some(0));
        assert_eq!(frame.pixel(2, 1), Some(5));
        assert_eq!(frame.pixel(3, 0), None);
        assert_eq!(frame.pixel(0, 2), None);
    }
    
    #[test]
    fn test_empty_frame() {
        let frame = CaptureFrame::new(0, 0, Vec::new()).unwrap();
        assert!(frame.pixels().is_empty());
    }
}
