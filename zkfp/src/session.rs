//! Fingerprint reader session
//!
//! [`DeviceSession`] owns the SDK lifecycle, the template database handle
//! and at most one open reader. Every public operation either succeeds and
//! clears the last error, or fails and records its message.

use std::path::Path;

use tracing::{debug, info, warn};

use zkfp_backend::DeviceBackend;
use zkfp_core::constants::{
    DEFAULT_IMAGE_DPI, MAX_TEMPLATE_SIZE, PARAM_BUFFER_SIZE, TEXT_PARAM_BUFFER_SIZE,
};
use zkfp_core::param::{self, Param};
use zkfp_core::{Error, LastError, Result, SdkCode, SdkResult, SessionState};
use zkfp_types::{CaptureFrame, CapturedTemplate, DeviceInfo};

/// Image and template produced by one successful live capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveCapture {
    pub frame: CaptureFrame,
    pub template: CapturedTemplate,
}

/// Session with a fingerprint reader
///
/// # Examples
///
/// ```
/// use zkfp::{DeviceSession, FakeBackend};
///
/// let mut session = DeviceSession::new(FakeBackend::new());
/// session.initialize()?;
/// assert_eq!(session.device_count(), Some(1));
///
/// session.open_device(0)?;
/// let capture = session.acquire_live_fingerprint()?;
/// assert_eq!(capture.frame.pixels().len(), 300 * 400);
/// assert_eq!(capture.template.hex().len(), 128);
///
/// session.close_device();
/// session.terminate();
/// # Ok::<(), zkfp::Error>(())
/// ```
pub struct DeviceSession<B: DeviceBackend> {
    backend: B,
    sdk_initialized: bool,
    database: Option<B::Database>,
    device: Option<B::Device>,
    image_dpi: u32,
    last_error: LastError,
    last_capture: Option<LiveCapture>,
}

impl<B: DeviceBackend> DeviceSession<B> {
    /// Create an uninitialized session over `backend`
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            sdk_initialized: false,
            database: None,
            device: None,
            image_dpi: DEFAULT_IMAGE_DPI,
            last_error: LastError::new(),
            last_capture: None,
        }
    }
    
    /// Set the resolution passed to still-image extraction
    pub fn with_image_dpi(mut self, dpi: u32) -> Self {
        self.image_dpi = dpi;
        self
    }
    
    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        match (self.sdk_initialized, self.database.is_some(), self.device.is_some()) {
            (false, _, _) => SessionState::Uninitialized,
            (true, false, _) => SessionState::PartiallyInitialized,
            (true, true, false) => SessionState::Ready,
            (true, true, true) => SessionState::DeviceOpen,
        }
    }
    
    /// Check if a reader is open
    pub fn is_device_open(&self) -> bool {
        self.device.is_some()
    }
    
    /// Message of the most recent failure, empty after a success
    pub fn last_error(&self) -> &str {
        self.last_error.message()
    }
    
    /// Last successful live capture
    pub fn last_capture(&self) -> Option<&LiveCapture> {
        self.last_capture.as_ref()
    }
    
    pub fn image_dpi(&self) -> u32 {
        self.image_dpi
    }
    
    pub fn backend(&self) -> &B {
        &self.backend
    }
    
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
    
    /// Initialize the SDK and create the template database
    ///
    /// A ready session is left as is. After a failed database creation the
    /// SDK stays up and a retry only creates the database.
    ///
    /// # Errors
    ///
    /// - [`Error::SdkInit`] if the SDK reports a failure
    /// - [`Error::DbCreate`] if no database handle could be created
    pub fn initialize(&mut self) -> Result<()> {
        let result = self.try_initialize();
        self.last_error.record(result)
    }
    
    fn try_initialize(&mut self) -> Result<()> {
        if !self.sdk_initialized {
            match self.backend.init() {
                Ok(()) | Err(SdkCode::ALREADY_INIT) => {}
                Err(code) => {
                    warn!("SDK initialization failed: {}", code);
                    return Err(Error::SdkInit(code));
                }
            }
            self.sdk_initialized = true;
            info!("SDK initialized");
        }
        
        if self.database.is_none() {
            let database = self.backend.db_init().ok_or(Error::DbCreate)?;
            self.database = Some(database);
            debug!("Template database created");
        }
        
        Ok(())
    }
    
    /// Release the device, the database and the SDK
    ///
    /// Safe to call any number of times, including on a session that was
    /// never initialized.
    pub fn terminate(&mut self) {
        self.release();
        self.last_error.clear();
    }
    
    fn release(&mut self) {
        self.release_device();
        
        if let Some(database) = self.database.take() {
            self.backend.db_free(database);
            debug!("Template database freed");
        }
        
        if self.sdk_initialized {
            self.backend.terminate();
            self.sdk_initialized = false;
            info!("SDK terminated");
        }
    }
    
    /// Number of enumerated readers
    ///
    /// `None` when the session is not initialized or the SDK cannot tell.
    pub fn device_count(&mut self) -> Option<u32> {
        if !self.state().can_open_device() {
            return None;
        }
        
        match self.backend.device_count() {
            Ok(count) => Some(count),
            Err(code) => {
                warn!("Device enumeration failed: {}", code);
                None
            }
        }
    }
    
    /// Open the reader at `index`, replacing any reader already open
    ///
    /// A failed open leaves the current reader, if any, open.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceOpen`] if the session is not initialized or the SDK
    /// rejects the index.
    pub fn open_device(&mut self, index: u32) -> Result<()> {
        let result = self.try_open_device(index);
        self.last_error.record(result)
    }
    
    fn try_open_device(&mut self, index: u32) -> Result<()> {
        if !self.state().can_open_device() {
            return Err(Error::DeviceOpen {
                index,
                reason: "SDK not initialized".into(),
            });
        }
        
        let device = self.backend.open_device(index).ok_or_else(|| Error::DeviceOpen {
            index,
            reason: "rejected by SDK".into(),
        })?;
        
        // The previous reader is only given up once its replacement is open
        self.release_device();
        self.device = Some(device);
        
        info!(index, "Device opened");
        Ok(())
    }
    
    /// Close the open reader, if any
    pub fn close_device(&mut self) {
        self.release_device();
        self.last_error.clear();
    }
    
    fn release_device(&mut self) {
        if let Some(device) = self.device.take() {
            self.backend.close_device(device);
            info!("Device closed");
        }
    }
    
    /// Ask the sensor whether a finger is on it right now
    ///
    /// # Errors
    ///
    /// [`Error::DeviceNotOpen`] without an open reader, [`Error::Capture`]
    /// if the query fails.
    pub fn finger_present(&mut self) -> Result<bool> {
        let result = match self.device.as_ref() {
            None => Err(Error::DeviceNotOpen),
            Some(device) => self.backend.finger_present(device).map_err(|code| Error::Capture {
                code,
                message: "Failed to query finger presence".into(),
            }),
        };
        self.last_error.record(result)
    }
    
    /// Capture one live fingerprint image and template
    ///
    /// Reads the sensor dimensions, captures into a `width * height` pixel
    /// buffer and a [`MAX_TEMPLATE_SIZE`] template buffer, and keeps the
    /// result as the last capture. A failure leaves the last capture alone.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceNotOpen`] without an open reader, [`Error::Capture`]
    /// if a dimension read or the acquisition fails.
    pub fn acquire_live_fingerprint(&mut self) -> Result<LiveCapture> {
        let result = match self.device.as_ref() {
            None => Err(Error::DeviceNotOpen),
            Some(device) => Self::capture(&mut self.backend, device),
        };
        
        if let Ok(capture) = &result {
            debug!(
                width = capture.frame.width(),
                height = capture.frame.height(),
                template_len = capture.template.len(),
                "Live fingerprint captured"
            );
            self.last_capture = Some(capture.clone());
        }
        
        self.last_error.record(result)
    }
    
    fn capture(backend: &mut B, device: &B::Device) -> Result<LiveCapture> {
        let width = Self::capture_dimension(backend, device, Param::ImageWidth)?;
        let height = Self::capture_dimension(backend, device, Param::ImageHeight)?;
        
        let mut image = vec![0u8; CaptureFrame::buffer_len(width, height)?];
        let mut template = vec![0u8; MAX_TEMPLATE_SIZE];
        
        let len = backend
            .acquire_fingerprint(device, &mut image, &mut template)
            .map_err(|code| Error::Capture {
                code,
                message: "Failed to acquire fingerprint".into(),
            })?;
        template.truncate(len);
        
        Ok(LiveCapture {
            frame: CaptureFrame::new(width, height, image)?,
            template: CapturedTemplate::new(template),
        })
    }
    
    fn capture_dimension(backend: &mut B, device: &B::Device, param: Param) -> Result<u32> {
        let mut value = [0u8; PARAM_BUFFER_SIZE];
        let written = backend
            .get_parameter(device, param.code(), &mut value)
            .map_err(|code| Error::Capture {
                code,
                message: format!("Failed to get {}", param),
            })?;
        
        param::decode_dimension(param, &value[..written])
    }
    
    /// Read identification and sensor parameters from the open reader
    ///
    /// # Errors
    ///
    /// [`Error::DeviceNotOpen`] without an open reader,
    /// [`Error::Parameter`] / [`Error::InvalidParameter`] if the image size
    /// cannot be read.
    pub fn device_info(&mut self) -> Result<DeviceInfo> {
        let result = match self.device.as_ref() {
            None => Err(Error::DeviceNotOpen),
            Some(device) => Self::read_info(&mut self.backend, device),
        };
        self.last_error.record(result)
    }
    
    fn read_info(backend: &mut B, device: &B::Device) -> Result<DeviceInfo> {
        let mut dimension = |param: Param| -> Result<u32> {
            let mut value = [0u8; PARAM_BUFFER_SIZE];
            let written = backend
                .get_parameter(device, param.code(), &mut value)
                .map_err(|code| Error::Parameter { param, code })?;
            param::decode_dimension(param, &value[..written])
        };
        
        let width = dimension(Param::ImageWidth)?;
        let height = dimension(Param::ImageHeight)?;
        let dpi = dimension(Param::ImageDpi).ok();
        
        let mut text = |param: Param| -> SdkResult<String> {
            let mut value = [0u8; TEXT_PARAM_BUFFER_SIZE];
            let written = backend.get_parameter(device, param.code(), &mut value)?;
            Ok(param::decode_text(&value[..written]))
        };
        
        let serial_number = text(Param::SerialNumber).unwrap_or_else(|code| {
            warn!("Failed to read serial number: {}", code);
            "UNKNOWN".to_string()
        });
        
        let mut info = DeviceInfo::new(serial_number, width, height);
        info.dpi = dpi;
        info.vendor = text(Param::Vendor).ok().filter(|s| !s.is_empty());
        info.product = text(Param::Product).ok().filter(|s| !s.is_empty());
        
        debug!("Device info: {}", info);
        Ok(info)
    }
    
    /// Erase every enrolled template
    ///
    /// # Errors
    ///
    /// [`Error::DbUnavailable`] without a database, [`Error::DbClear`] if
    /// the SDK refuses.
    pub fn clear_fingerprints(&mut self) -> Result<()> {
        let result = match self.database.as_ref() {
            None => Err(Error::DbUnavailable),
            Some(database) => self.backend.db_clear(database).map_err(Error::DbClear),
        };
        
        if result.is_ok() {
            info!("Template database cleared");
        }
        self.last_error.record(result)
    }
    
    /// Extract a template from a still image
    ///
    /// The template is returned to the caller; it is not added to the
    /// database.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceNotOpen`], [`Error::DbUnavailable`], or
    /// [`Error::TemplateExtract`] carrying the SDK status.
    pub fn register_by_image(&mut self, path: impl AsRef<Path>) -> Result<CapturedTemplate> {
        let result = self.extract(path.as_ref());
        self.last_error.record(result)
    }
    
    /// Extract a template from a still image and identify it
    ///
    /// Matching against the enrolled set is not implemented: after a
    /// successful extraction this fails with [`Error::NotImplemented`].
    pub fn identify_by_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let result = self
            .extract(path.as_ref())
            .and_then(|_| Err::<(), _>(Error::NotImplemented("IdentifyByImage")));
        self.last_error.record(result)
    }
    
    fn extract(&mut self, path: &Path) -> Result<CapturedTemplate> {
        if self.device.is_none() {
            return Err(Error::DeviceNotOpen);
        }
        let database = self.database.as_ref().ok_or(Error::DbUnavailable)?;
        
        let mut template = vec![0u8; MAX_TEMPLATE_SIZE];
        let len = self
            .backend
            .extract_from_image(database, path, self.image_dpi, &mut template)
            .map_err(Error::TemplateExtract)?;
        template.truncate(len);
        
        debug!(path = %path.display(), len, "Template extracted from image");
        Ok(CapturedTemplate::new(template))
    }
    
    /// Enroll a live fingerprint (not implemented)
    pub fn register_fingerprint(&mut self) -> Result<()> {
        let result = self.unimplemented("Register");
        self.last_error.record(result)
    }
    
    /// Verify a live fingerprint 1:1 (not implemented)
    pub fn verify_fingerprint(&mut self) -> Result<()> {
        let result = self.unimplemented("Verify");
        self.last_error.record(result)
    }
    
    /// Identify a live fingerprint 1:N (not implemented)
    pub fn identify_fingerprint(&mut self) -> Result<()> {
        let result = self.unimplemented("Identify");
        self.last_error.record(result)
    }
    
    fn unimplemented(&self, operation: &'static str) -> Result<()> {
        if self.device.is_none() {
            return Err(Error::DeviceNotOpen);
        }
        if self.database.is_none() {
            return Err(Error::DbUnavailable);
        }
        Err(Error::NotImplemented(operation))
    }
}

impl<B: DeviceBackend> Drop for DeviceSession<B> {
    fn drop(&mut self) {
        self.release();
    }
}
