//! Backend layer for ZKTeco fingerprint readers
//!
//! Provides the capability interface the session drives, plus:
//! - [`FakeBackend`]: scriptable in-memory reader for tests and demos
//! - `SdkBackend`: binding to the vendor `libzkfp` library (feature `sdk`)

pub mod fake;
#[cfg(feature = "sdk")]
pub mod sdk;

pub use fake::{FakeBackend, FakeDatabase, FakeDevice, FakeStats};
#[cfg(feature = "sdk")]
pub use sdk::SdkBackend;

use std::path::Path;

pub use zkfp_core::{SdkCode, SdkResult};

/// Fingerprint SDK operations
///
/// Handles returned by `open_device` and `db_init` are owned by the caller
/// and must be given back through `close_device` / `db_free`.
#[cfg_attr(
    feature = "mock",
    mockall::automock(type Device = u32; type Database = u32;)
)]
pub trait DeviceBackend {
    /// Opaque open-device handle
    type Device;
    
    /// Opaque template database handle
    type Database;
    
    /// Acquire process-wide SDK resources
    fn init(&mut self) -> SdkResult<()>;
    
    /// Release process-wide SDK resources
    fn terminate(&mut self);
    
    /// Number of enumerated readers
    fn device_count(&mut self) -> SdkResult<u32>;
    
    /// Open the reader at `index`
    fn open_device(&mut self, index: u32) -> Option<Self::Device>;
    
    /// Close a reader handle
    fn close_device(&mut self, device: Self::Device);
    
    /// Create a template database
    fn db_init(&mut self) -> Option<Self::Database>;
    
    /// Free a template database
    fn db_free(&mut self, database: Self::Database);
    
    /// Erase every template in the database
    fn db_clear(&mut self, database: &Self::Database) -> SdkResult<()>;
    
    /// Read parameter `code` into `value`, returning the bytes written
    fn get_parameter(&mut self, device: &Self::Device, code: u32, value: &mut [u8]) -> SdkResult<usize>;
    
    /// Point-in-time query: is a finger on the sensor right now
    fn finger_present(&mut self, device: &Self::Device) -> SdkResult<bool>;
    
    /// Capture one image and its template
    ///
    /// `image` must hold `width * height` bytes. Returns the template length
    /// written into `template`.
    fn acquire_fingerprint(
        &mut self,
        device: &Self::Device,
        image: &mut [u8],
        template: &mut [u8],
    ) -> SdkResult<usize>;
    
    /// Extract a template from a still image file
    fn extract_from_image(
        &mut self,
        database: &Self::Database,
        path: &Path,
        dpi: u32,
        template: &mut [u8],
    ) -> SdkResult<usize>;
}
