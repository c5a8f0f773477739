//! Vendor SDK backend
//!
//! Binds the `ZKFPM_*` entry points of `libzkfp`. `ZKFPM_Init` and
//! `ZKFPM_Terminate` act on the whole process, so initialization is
//! reference-counted across every `SdkBackend` alive at once.

use std::ffi::{CString, c_void};
use std::path::Path;
use std::ptr::NonNull;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{DeviceBackend, SdkCode, SdkResult};

#[allow(non_snake_case)]
mod ffi {
    use std::ffi::{c_char, c_int, c_uint, c_void};
    
    pub type Handle = *mut c_void;
    
    #[link(name = "libzkfp")]
    unsafe extern "system" {
        pub fn ZKFPM_Init() -> c_int;
        pub fn ZKFPM_Terminate() -> c_int;
        pub fn ZKFPM_GetDeviceCount() -> c_int;
        pub fn ZKFPM_OpenDevice(index: c_int) -> Handle;
        pub fn ZKFPM_CloseDevice(device: Handle) -> c_int;
        pub fn ZKFPM_GetParameters(
            device: Handle,
            param_code: c_int,
            param_value: *mut u8,
            cb_param_value: *mut c_uint,
        ) -> c_int;
        pub fn ZKFPM_AcquireFingerprint(
            device: Handle,
            fp_image: *mut u8,
            cb_fp_image: c_uint,
            fp_template: *mut u8,
            cb_template: *mut c_uint,
        ) -> c_int;
        pub fn ZKFPM_DBInit() -> Handle;
        pub fn ZKFPM_DBFree(db_cache: Handle) -> c_int;
        pub fn ZKFPM_DBClear(db_cache: Handle) -> c_int;
        pub fn ZKFPM_ExtractFromImage(
            db_cache: Handle,
            file_path: *const c_char,
            dpi: c_uint,
            fp_template: *mut u8,
            cb_template: *mut c_uint,
        ) -> c_int;
    }
}

/// Number of backends currently holding the SDK
static SDK_USERS: Mutex<usize> = parking_lot::const_mutex(0);

/// Open reader handle
#[derive(Debug)]
pub struct SdkDevice(NonNull<c_void>);

/// Template database handle
#[derive(Debug)]
pub struct SdkDatabase(NonNull<c_void>);

/// Backend driving real hardware through `libzkfp`
#[derive(Debug, Default)]
pub struct SdkBackend {
    initialized: bool,
}

impl SdkBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn buffer_len(buf: &[u8]) -> SdkResult<u32> {
    u32::try_from(buf.len()).map_err(|_| SdkCode::INVALID_PARAM)
}

impl DeviceBackend for SdkBackend {
    type Device = SdkDevice;
    type Database = SdkDatabase;
    
    fn init(&mut self) -> SdkResult<()> {
        if self.initialized {
            return Ok(());
        }
        
        let mut users = SDK_USERS.lock();
        if *users == 0 {
            let status = unsafe { ffi::ZKFPM_Init() };
            match SdkCode::from_status(status) {
                Ok(()) | Err(SdkCode::ALREADY_INIT) => {}
                Err(code) => return Err(code),
            }
            debug!("libzkfp initialized");
        }
        
        *users += 1;
        self.initialized = true;
        Ok(())
    }
    
    fn terminate(&mut self) {
        if !self.initialized {
            return;
        }
        
        let mut users = SDK_USERS.lock();
        *users = users.saturating_sub(1);
        if *users == 0 {
            let status = unsafe { ffi::ZKFPM_Terminate() };
            if let Err(code) = SdkCode::from_status(status) {
                warn!("ZKFPM_Terminate failed: {}", code);
            }
            debug!("libzkfp terminated");
        }
        
        self.initialized = false;
    }
    
    fn device_count(&mut self) -> SdkResult<u32> {
        let count = unsafe { ffi::ZKFPM_GetDeviceCount() };
        u32::try_from(count).map_err(|_| SdkCode(count))
    }
    
    fn open_device(&mut self, index: u32) -> Option<SdkDevice> {
        let index = i32::try_from(index).ok()?;
        let handle = unsafe { ffi::ZKFPM_OpenDevice(index) };
        NonNull::new(handle).map(SdkDevice)
    }
    
    fn close_device(&mut self, device: SdkDevice) {
        let status = unsafe { ffi::ZKFPM_CloseDevice(device.0.as_ptr()) };
        if let Err(code) = SdkCode::from_status(status) {
            warn!("ZKFPM_CloseDevice failed: {}", code);
        }
    }
    
    fn db_init(&mut self) -> Option<SdkDatabase> {
        let handle = unsafe { ffi::ZKFPM_DBInit() };
        NonNull::new(handle).map(SdkDatabase)
    }
    
    fn db_free(&mut self, database: SdkDatabase) {
        let status = unsafe { ffi::ZKFPM_DBFree(database.0.as_ptr()) };
        if let Err(code) = SdkCode::from_status(status) {
            warn!("ZKFPM_DBFree failed: {}", code);
        }
    }
    
    fn db_clear(&mut self, database: &SdkDatabase) -> SdkResult<()> {
        SdkCode::from_status(unsafe { ffi::ZKFPM_DBClear(database.0.as_ptr()) })
    }
    
    fn get_parameter(&mut self, device: &SdkDevice, code: u32, value: &mut [u8]) -> SdkResult<usize> {
        let param_code = i32::try_from(code).map_err(|_| SdkCode::INVALID_PARAM)?;
        let mut size = buffer_len(value)?;
        
        let status = unsafe {
            ffi::ZKFPM_GetParameters(device.0.as_ptr(), param_code, value.as_mut_ptr(), &mut size)
        };
        SdkCode::from_status(status)?;
        
        trace!(code, size, "Read parameter");
        Ok((size as usize).min(value.len()))
    }
    
    fn finger_present(&mut self, _device: &SdkDevice) -> SdkResult<bool> {
        // No finger-presence parameter works across reader models; report
        // present and let acquisition retries until the capture timeout
        // stand in for the wait.
        Ok(true)
    }
    
    fn acquire_fingerprint(
        &mut self,
        device: &SdkDevice,
        image: &mut [u8],
        template: &mut [u8],
    ) -> SdkResult<usize> {
        let image_len = buffer_len(image)?;
        let mut template_len = buffer_len(template)?;
        
        let status = unsafe {
            ffi::ZKFPM_AcquireFingerprint(
                device.0.as_ptr(),
                image.as_mut_ptr(),
                image_len,
                template.as_mut_ptr(),
                &mut template_len,
            )
        };
        SdkCode::from_status(status)?;
        
        Ok((template_len as usize).min(template.len()))
    }
    
    fn extract_from_image(
        &mut self,
        database: &SdkDatabase,
        path: &Path,
        dpi: u32,
        template: &mut [u8],
    ) -> SdkResult<usize> {
        let path = path
            .to_str()
            .and_then(|p| CString::new(p).ok())
            .ok_or(SdkCode::INVALID_PARAM)?;
        let mut template_len = buffer_len(template)?;
        
        let status = unsafe {
            ffi::ZKFPM_ExtractFromImage(
                database.0.as_ptr(),
                path.as_ptr(),
                dpi,
                template.as_mut_ptr(),
                &mut template_len,
            )
        };
        SdkCode::from_status(status)?;
        
        Ok((template_len as usize).min(template.len()))
    }
}

impl Drop for SdkBackend {
    fn drop(&mut self) {
        if self.initialized {
            warn!("SDK backend dropped while still initialized");
            self.terminate();
        }
    }
}
