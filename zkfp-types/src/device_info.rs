//! Device information structures

use std::fmt;

/// Fingerprint reader information
///
/// Text fields come from the vendor/product/serial parameters, sizes from
/// the image parameters of the open device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device serial number
    pub serial_number: String,
    
    /// Vendor name
    pub vendor: Option<String>,
    
    /// Product name
    pub product: Option<String>,
    
    /// Sensor image width in pixels
    pub image_width: u32,
    
    /// Sensor image height in pixels
    pub image_height: u32,
    
    /// Sensor resolution, when the device reports it
    pub dpi: Option<u32>,
}

impl DeviceInfo {
    pub fn new(serial_number: String, image_width: u32, image_height: u32) -> Self {
        Self {
            serial_number,
            vendor: None,
            product: None,
            image_width,
            image_height,
            dpi: None,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reader[SN: {}, {}x{}",
            self.serial_number, self.image_width, self.image_height
        )?;
        if let Some(dpi) = self.dpi {
            write!(f, " @ {} dpi", dpi)?;
        }
        if let Some(product) = &self.product {
            write!(f, ", {}", product)?;
        }
        write!(f, "]")
    }
}
