//! In-memory fingerprint reader
//!
//! `FakeBackend` behaves like a single USB reader attached to the SDK. The
//! builder methods script its answers (failures, sensor size, template
//! bytes, finger presence) so session and capture logic can be exercised
//! without hardware.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use tracing::{debug, trace};

use zkfp_core::param::Param;

use crate::{DeviceBackend, SdkCode, SdkResult};

/// Call counters kept by [`FakeBackend`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FakeStats {
    pub init_calls: usize,
    pub terminate_calls: usize,
    pub open_calls: usize,
    pub close_calls: usize,
    pub db_init_calls: usize,
    pub db_free_calls: usize,
    pub clear_calls: usize,
    pub presence_queries: usize,
    pub acquire_calls: usize,
    pub extract_calls: usize,
}

/// Handle to a fake reader
#[derive(Debug, PartialEq, Eq)]
pub struct FakeDevice {
    id: u32,
    index: u32,
}

impl FakeDevice {
    /// Enumeration index the handle was opened with
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Handle to a fake template database
#[derive(Debug, PartialEq, Eq)]
pub struct FakeDatabase {
    id: u32,
}

/// Scriptable fake reader
#[derive(Debug, Clone)]
pub struct FakeBackend {
    init_failure: Option<SdkCode>,
    db_init_fails: bool,
    device_count: u32,
    open_rejected: bool,
    image_width: u32,
    image_height: u32,
    dpi: u32,
    vendor: String,
    product: String,
    serial_number: String,
    template: Vec<u8>,
    failing_params: HashSet<u32>,
    presence: VecDeque<bool>,
    acquire_failures: usize,
    acquire_failure_code: SdkCode,
    acquire_always_fails: Option<SdkCode>,
    extract_failure: Option<SdkCode>,
    clear_failure: Option<SdkCode>,
    
    sdk_initialized: bool,
    live_devices: usize,
    live_databases: usize,
    enrolled: usize,
    next_handle: u32,
    stats: FakeStats,
}

impl FakeBackend {
    /// One 300x400 reader at 500 dpi producing a 64-byte template
    pub fn new() -> Self {
        Self {
            init_failure: None,
            db_init_fails: false,
            device_count: 1,
            open_rejected: false,
            image_width: 300,
            image_height: 400,
            dpi: 500,
            vendor: "ZKTeco Inc.".to_string(),
            product: "ZK9500".to_string(),
            serial_number: "FAKE0000001".to_string(),
            template: (0..64u8).collect(),
            failing_params: HashSet::new(),
            presence: VecDeque::new(),
            acquire_failures: 0,
            acquire_failure_code: SdkCode::CAPTURE,
            acquire_always_fails: None,
            extract_failure: None,
            clear_failure: None,
            sdk_initialized: false,
            live_devices: 0,
            live_databases: 0,
            enrolled: 0,
            next_handle: 1,
            stats: FakeStats::default(),
        }
    }
    
    /// Set the number of enumerated readers
    pub fn with_device_count(mut self, count: u32) -> Self {
        self.device_count = count;
        self
    }
    
    /// Set the sensor image size
    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }
    
    /// Set the template produced by captures and extractions
    pub fn with_template(mut self, template: impl Into<Vec<u8>>) -> Self {
        self.template = template.into();
        self
    }
    
    /// Set the serial number text parameter
    pub fn with_serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = serial.into();
        self
    }
    
    /// Make `init` fail with `code`
    pub fn failing_init(mut self, code: SdkCode) -> Self {
        self.init_failure = Some(code);
        self
    }
    
    /// Make `db_init` return no handle
    pub fn failing_db_init(mut self) -> Self {
        self.db_init_fails = true;
        self
    }
    
    /// Make `open_device` reject every index
    pub fn rejecting_open(mut self) -> Self {
        self.open_rejected = true;
        self
    }
    
    /// Make reads of `param` fail
    pub fn failing_parameter(mut self, param: Param) -> Self {
        self.failing_params.insert(param.code());
        self
    }
    
    /// Make `extract_from_image` fail with `code`
    pub fn failing_extract(mut self, code: SdkCode) -> Self {
        self.extract_failure = Some(code);
        self
    }
    
    /// Make `db_clear` fail with `code`
    pub fn failing_clear(mut self, code: SdkCode) -> Self {
        self.clear_failure = Some(code);
        self
    }
    
    /// Make every acquisition fail with `code`
    pub fn failing_acquire_always(mut self, code: SdkCode) -> Self {
        self.acquire_always_fails = Some(code);
        self
    }
    
    /// Make the next `times` acquisitions fail with `code`
    pub fn failing_acquire(mut self, times: usize, code: SdkCode) -> Self {
        self.fail_next_acquisitions(times, code);
        self
    }
    
    /// Queue finger-presence answers, consumed one per query
    ///
    /// Once the queue is empty the finger is reported present.
    pub fn with_finger_presence(mut self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.presence.extend(answers);
        self
    }
    
    /// Queue one more finger-presence answer
    pub fn queue_finger_presence(&mut self, present: bool) {
        self.presence.push_back(present);
    }
    
    /// Fail the next `times` acquisitions with `code`
    pub fn fail_next_acquisitions(&mut self, times: usize, code: SdkCode) {
        self.acquire_failures = times;
        self.acquire_failure_code = code;
    }
    
    /// Stop failing acquisitions
    pub fn heal_acquisition(&mut self) {
        self.acquire_failures = 0;
        self.acquire_always_fails = None;
    }
    
    pub fn stats(&self) -> FakeStats {
        self.stats
    }
    
    pub fn is_sdk_initialized(&self) -> bool {
        self.sdk_initialized
    }
    
    /// Device handles handed out and not yet closed
    pub fn live_devices(&self) -> usize {
        self.live_devices
    }
    
    /// Database handles handed out and not yet freed
    pub fn live_databases(&self) -> usize {
        self.live_databases
    }
    
    /// Templates extracted since the last clear
    pub fn enrolled(&self) -> usize {
        self.enrolled
    }
    
    fn next_id(&mut self) -> u32 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }
    
    fn copy_template(&self, template: &mut [u8]) -> SdkResult<usize> {
        if template.len() < self.template.len() {
            return Err(SdkCode::MEMORY_NOT_ENOUGH);
        }
        template[..self.template.len()].copy_from_slice(&self.template);
        Ok(self.template.len())
    }
    
    /// Concentric ridges around the centre of the sensor
    fn render_ridges(&self, image: &mut [u8]) {
        let width = self.image_width as usize;
        let cx = self.image_width as f64 / 2.0;
        let cy = self.image_height as f64 / 2.0;
        
        for (i, pixel) in image.iter_mut().enumerate() {
            let dx = (i % width) as f64 - cx;
            let dy = (i / width) as f64 - cy;
            let ring = ((dx * dx + dy * dy).sqrt() / 4.0) as u32;
            *pixel = if ring % 2 == 0 { 40 } else { 220 };
        }
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBackend for FakeBackend {
    type Device = FakeDevice;
    type Database = FakeDatabase;
    
    fn init(&mut self) -> SdkResult<()> {
        self.stats.init_calls += 1;
        
        if let Some(code) = self.init_failure {
            return Err(code);
        }
        if self.sdk_initialized {
            return Err(SdkCode::ALREADY_INIT);
        }
        
        self.sdk_initialized = true;
        debug!("Fake SDK initialized");
        Ok(())
    }
    
    fn terminate(&mut self) {
        self.stats.terminate_calls += 1;
        self.sdk_initialized = false;
    }
    
    fn device_count(&mut self) -> SdkResult<u32> {
        if !self.sdk_initialized {
            return Err(SdkCode::NOT_INIT);
        }
        Ok(self.device_count)
    }
    
    fn open_device(&mut self, index: u32) -> Option<FakeDevice> {
        self.stats.open_calls += 1;
        
        if !self.sdk_initialized || self.open_rejected || index >= self.device_count {
            return None;
        }
        
        self.live_devices += 1;
        Some(FakeDevice {
            id: self.next_id(),
            index,
        })
    }
    
    fn close_device(&mut self, device: FakeDevice) {
        trace!(id = device.id, "Fake device closed");
        self.stats.close_calls += 1;
        self.live_devices = self.live_devices.saturating_sub(1);
    }
    
    fn db_init(&mut self) -> Option<FakeDatabase> {
        self.stats.db_init_calls += 1;
        
        if !self.sdk_initialized || self.db_init_fails {
            return None;
        }
        
        self.live_databases += 1;
        Some(FakeDatabase { id: self.next_id() })
    }
    
    fn db_free(&mut self, database: FakeDatabase) {
        trace!(id = database.id, "Fake database freed");
        self.stats.db_free_calls += 1;
        self.live_databases = self.live_databases.saturating_sub(1);
    }
    
    fn db_clear(&mut self, _database: &FakeDatabase) -> SdkResult<()> {
        self.stats.clear_calls += 1;
        
        if let Some(code) = self.clear_failure {
            return Err(code);
        }
        self.enrolled = 0;
        Ok(())
    }
    
    fn get_parameter(&mut self, _device: &FakeDevice, code: u32, value: &mut [u8]) -> SdkResult<usize> {
        if self.failing_params.contains(&code) {
            return Err(SdkCode::FAIL);
        }
        
        let bytes = match code {
            c if c == Param::ImageWidth.code() => (self.image_width as i32).to_le_bytes().to_vec(),
            c if c == Param::ImageHeight.code() => (self.image_height as i32).to_le_bytes().to_vec(),
            c if c == Param::ImageDpi.code() => (self.dpi as i32).to_le_bytes().to_vec(),
            c if c == Param::Vendor.code() => self.vendor.as_bytes().to_vec(),
            c if c == Param::Product.code() => self.product.as_bytes().to_vec(),
            c if c == Param::SerialNumber.code() => self.serial_number.as_bytes().to_vec(),
            _ => return Err(SdkCode::NOT_SUPPORT),
        };
        
        if value.len() < bytes.len() {
            return Err(SdkCode::MEMORY_NOT_ENOUGH);
        }
        value[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
    
    fn finger_present(&mut self, _device: &FakeDevice) -> SdkResult<bool> {
        self.stats.presence_queries += 1;
        Ok(self.presence.pop_front().unwrap_or(true))
    }
    
    fn acquire_fingerprint(
        &mut self,
        _device: &FakeDevice,
        image: &mut [u8],
        template: &mut [u8],
    ) -> SdkResult<usize> {
        self.stats.acquire_calls += 1;
        
        if let Some(code) = self.acquire_always_fails {
            return Err(code);
        }
        if self.acquire_failures > 0 {
            self.acquire_failures -= 1;
            return Err(self.acquire_failure_code);
        }
        
        let needed = self.image_width as usize * self.image_height as usize;
        if image.len() < needed {
            return Err(SdkCode::MEMORY_NOT_ENOUGH);
        }
        
        self.render_ridges(&mut image[..needed]);
        self.copy_template(template)
    }
    
    fn extract_from_image(
        &mut self,
        _database: &FakeDatabase,
        path: &Path,
        _dpi: u32,
        template: &mut [u8],
    ) -> SdkResult<usize> {
        self.stats.extract_calls += 1;
        
        if let Some(code) = self.extract_failure {
            return Err(code);
        }
        if path.as_os_str().is_empty() {
            return Err(SdkCode::LOAD_IMAGE);
        }
        
        let len = self.copy_template(template)?;
        self.enrolled += 1;
        Ok(len)
    }
}
