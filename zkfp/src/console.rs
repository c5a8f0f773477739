//! Operator console
//!
//! The interactive loop of the capture demo, minus any drawing: operator
//! actions come in through [`Console::trigger`], time advances through
//! [`Console::tick`], and the front end reads back the status line, the
//! error line and the last capture.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use zkfp_backend::DeviceBackend;
use zkfp_core::constants::DEFAULT_IMAGE_PATH;
use zkfp_core::Result;
use zkfp_types::CapturedTemplate;

use crate::capture::{CaptureEvent, CaptureMachine, CaptureState};
use crate::session::{DeviceSession, LiveCapture};

/// Operator buttons
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Connect,
    Disconnect,
    Register,
    Clear,
    Verify,
    Identify,
    RegisterByImage,
    IdentifyByImage,
    AcquireLive,
}

impl Action {
    /// Every action, in button order
    pub const ALL: [Action; 9] = [
        Self::Connect,
        Self::Disconnect,
        Self::Register,
        Self::Clear,
        Self::Verify,
        Self::Identify,
        Self::RegisterByImage,
        Self::IdentifyByImage,
        Self::AcquireLive,
    ];
    
    /// Command word accepted by `FromStr`
    pub fn command(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Register => "register",
            Self::Clear => "clear",
            Self::Verify => "verify",
            Self::Identify => "identify",
            Self::RegisterByImage => "register-image",
            Self::IdentifyByImage => "identify-image",
            Self::AcquireLive => "acquire",
        }
    }
    
    /// Button caption
    pub fn label(self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::Disconnect => "Disconnect",
            Self::Register => "Register",
            Self::Clear => "Clear",
            Self::Verify => "Verify",
            Self::Identify => "Identify",
            Self::RegisterByImage => "Register by Image",
            Self::IdentifyByImage => "Identify by Image",
            Self::AcquireLive => "Acquire Live Fingerprint",
        }
    }
}

impl FromStr for Action {
    type Err = zkfp_types::Error;
    
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let word = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.command() == word)
            .ok_or_else(|| zkfp_types::Error::Parse(format!("unknown action: {}", s.trim())))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Interactive capture loop state
pub struct Console<B: DeviceBackend> {
    session: DeviceSession<B>,
    capture: CaptureMachine,
    device_index: u32,
    image_path: PathBuf,
    status: String,
    error_log: String,
    image_template: Option<CapturedTemplate>,
}

impl<B: DeviceBackend> Console<B> {
    /// Create a console over an uninitialized session
    pub fn new(session: DeviceSession<B>) -> Self {
        Self {
            session,
            capture: CaptureMachine::new(),
            device_index: 0,
            image_path: PathBuf::from(DEFAULT_IMAGE_PATH),
            status: "Idle.".to_string(),
            error_log: String::new(),
            image_template: None,
        }
    }
    
    /// Set the reader opened by `Connect`
    pub fn with_device_index(mut self, index: u32) -> Self {
        self.device_index = index;
        self
    }
    
    /// Set the still image used by the by-image actions
    pub fn with_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = path.into();
        self
    }
    
    /// Set the live capture timeout
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture = self.capture.with_timeout(timeout);
        self
    }
    
    pub fn status(&self) -> &str {
        &self.status
    }
    
    pub fn error_log(&self) -> &str {
        &self.error_log
    }
    
    /// Whether the session holds an open reader
    pub fn is_device_open(&self) -> bool {
        self.session.is_device_open()
    }
    
    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }
    
    pub fn image_path(&self) -> &Path {
        &self.image_path
    }
    
    /// Last live capture
    pub fn last_capture(&self) -> Option<&LiveCapture> {
        self.session.last_capture()
    }
    
    /// Template from the last successful register-by-image
    pub fn image_template(&self) -> Option<&CapturedTemplate> {
        self.image_template.as_ref()
    }
    
    pub fn session(&self) -> &DeviceSession<B> {
        &self.session
    }
    
    pub fn session_mut(&mut self) -> &mut DeviceSession<B> {
        &mut self.session
    }
    
    /// Handle one button press
    pub fn trigger(&mut self, action: Action) {
        debug!(action = action.command(), "Action triggered");
        
        match action {
            Action::Connect => self.connect(),
            Action::Disconnect => self.disconnect(),
            _ if !self.session.is_device_open() => {
                self.error_log = "Device not connected.".to_string();
            }
            Action::Register => {
                self.status = "Registering fingerprint...".to_string();
                let result = self.session.register_fingerprint();
                self.show_result(result);
            }
            Action::Clear => {
                self.status = "Clearing fingerprints...".to_string();
                let result = self.session.clear_fingerprints();
                self.show_result(result);
            }
            Action::Verify => {
                self.status = "Verifying fingerprint...".to_string();
                let result = self.session.verify_fingerprint();
                self.show_result(result);
            }
            Action::Identify => {
                self.status = "Identifying fingerprint...".to_string();
                let result = self.session.identify_fingerprint();
                self.show_result(result);
            }
            Action::RegisterByImage => {
                self.status = "Register by image...".to_string();
                let result = self.session.register_by_image(&self.image_path);
                if let Ok(template) = &result {
                    self.image_template = Some(template.clone());
                }
                self.show_result(result);
            }
            Action::IdentifyByImage => {
                self.status = "Identify by image...".to_string();
                let result = self.session.identify_by_image(&self.image_path);
                self.show_result(result);
            }
            Action::AcquireLive => match self.capture.request(&self.session) {
                Ok(()) => {
                    self.status = "Waiting for finger...".to_string();
                    self.error_log.clear();
                }
                Err(e) => self.error_log = e.to_string(),
            },
        }
    }
    
    /// Advance the capture machine by one tick
    pub fn tick(&mut self, now: Instant) -> CaptureEvent {
        let event = self.capture.tick(&mut self.session, now);
        
        match &event {
            CaptureEvent::FingerDetected => {
                self.status = "Capturing live fingerprint...".to_string();
            }
            CaptureEvent::Captured(_) => {
                self.status = "Live fingerprint captured.".to_string();
                self.error_log.clear();
            }
            CaptureEvent::TimedOut(e) => {
                self.status = "Live capture timed out.".to_string();
                self.error_log = e.to_string();
            }
            CaptureEvent::Cancelled => {
                self.status = "Capture cancelled.".to_string();
            }
            CaptureEvent::Idle | CaptureEvent::Waiting | CaptureEvent::Retrying { .. } => {}
        }
        
        event
    }
    
    /// Close the reader and release the SDK, as when the window closes
    pub fn shutdown(&mut self) {
        self.capture.cancel();
        self.session.close_device();
        self.session.terminate();
    }
    
    fn connect(&mut self) {
        self.capture.cancel();
        
        if self.session.initialize().is_err() {
            self.status = "SDK initialization failed.".to_string();
            self.error_log = self.session.last_error().to_string();
            return;
        }
        
        match self.session.device_count() {
            None | Some(0) => {
                self.status = "No fingerprint devices detected.".to_string();
                self.error_log = "Error: No device found.".to_string();
            }
            Some(count) => {
                debug!(count, "Devices enumerated");
                if self.session.open_device(self.device_index).is_ok() {
                    self.status = "Device connected successfully.".to_string();
                    self.error_log.clear();
                    info!(index = self.device_index, "Operator connected device");
                } else {
                    self.status = "Failed to open device.".to_string();
                    self.error_log = self.session.last_error().to_string();
                }
            }
        }
    }
    
    fn disconnect(&mut self) {
        self.shutdown();
        self.status = "Device disconnected.".to_string();
        self.error_log.clear();
        info!("Operator disconnected device");
    }
    
    fn show_result<T>(&mut self, result: Result<T>) {
        match result {
            Ok(_) => self.error_log.clear(),
            Err(_) => self.error_log = self.session.last_error().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use zkfp_backend::FakeBackend;
    use zkfp_core::SdkCode;
    
    fn connected(backend: FakeBackend) -> Console<FakeBackend> {
        let mut console = Console::new(DeviceSession::new(backend));
        console.trigger(Action::Connect);
        assert!(console.is_device_open());
        console
    }
    
    #[test]
    fn test_action_parse() {
        assert_eq!("connect".parse::<Action>().unwrap(), Action::Connect);
        assert_eq!(" Acquire \n".parse::<Action>().unwrap(), Action::AcquireLive);
        assert_eq!("identify-image".parse::<Action>().unwrap(), Action::IdentifyByImage);
        assert!(matches!("launch".parse::<Action>(), Err(zkfp_types::Error::Parse(_))));
    }
    
    #[test]
    fn test_action_commands_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.command().parse::<Action>().unwrap(), action);
        }
    }
    
    #[test]
    fn test_console_starts_idle() {
        let console = Console::new(DeviceSession::new(FakeBackend::new()));
        assert_eq!(console.status(), "Idle.");
        assert_eq!(console.error_log(), "");
        assert!(!console.is_device_open());
        assert_eq!(console.image_path(), Path::new("finger.bmp"));
    }
    
    #[test]
    fn test_connect_success() {
        let console = connected(FakeBackend::new());
        assert_eq!(console.status(), "Device connected successfully.");
        assert_eq!(console.error_log(), "");
    }
    
    #[test]
    fn test_connect_without_devices() {
        let mut console = Console::new(DeviceSession::new(FakeBackend::new().with_device_count(0)));
        console.trigger(Action::Connect);
        
        assert_eq!(console.status(), "No fingerprint devices detected.");
        assert_eq!(console.error_log(), "Error: No device found.");
        assert!(!console.is_device_open());
    }
    
    #[test]
    fn test_connect_sdk_failure() {
        let mut console = Console::new(DeviceSession::new(FakeBackend::new().failing_init(SdkCode::INIT_LIB)));
        console.trigger(Action::Connect);
        
        assert_eq!(console.status(), "SDK initialization failed.");
        assert_eq!(console.error_log(), "Failed to initialize SDK. Error code: ZKFP_ERR_INITLIB(-1)");
    }
    
    #[test]
    fn test_connect_open_rejected() {
        let mut console = Console::new(DeviceSession::new(FakeBackend::new().rejecting_open()));
        console.trigger(Action::Connect);
        
        assert_eq!(console.status(), "Failed to open device.");
        assert_eq!(console.error_log(), "Failed to open device 0: rejected by SDK");
        assert!(!console.is_device_open());
    }
    
    #[test]
    fn test_failed_reconnect_keeps_connected_device() {
        let mut console = connected(FakeBackend::new()).with_device_index(5);
        console.trigger(Action::Connect);
        
        assert_eq!(console.status(), "Failed to open device.");
        assert_eq!(console.error_log(), "Failed to open device 5: rejected by SDK");
        assert!(console.is_device_open());
        assert_eq!(console.is_device_open(), console.session().is_device_open());
        
        console.trigger(Action::Clear);
        assert_eq!(console.error_log(), "");
    }
    
    #[test]
    fn test_connection_follows_session() {
        let mut console = connected(FakeBackend::new());
        console.session_mut().close_device();
        
        assert!(!console.is_device_open());
        console.trigger(Action::Register);
        assert_eq!(console.error_log(), "Device not connected.");
    }
    
    #[test]
    fn test_actions_need_connection() {
        let mut console = Console::new(DeviceSession::new(FakeBackend::new()));
        
        for action in &Action::ALL[2..] {
            console.trigger(*action);
            assert_eq!(console.error_log(), "Device not connected.");
            assert_eq!(console.status(), "Idle.");
        }
        assert_eq!(console.capture_state(), CaptureState::Idle);
    }
    
    #[test]
    fn test_unimplemented_actions_report_errors() {
        let mut console = connected(FakeBackend::new());
        
        console.trigger(Action::Register);
        assert_eq!(console.status(), "Registering fingerprint...");
        assert_eq!(console.error_log(), "Register() not implemented yet");
        
        console.trigger(Action::Verify);
        assert_eq!(console.error_log(), "Verify() not implemented yet");
        
        console.trigger(Action::IdentifyByImage);
        assert_eq!(console.status(), "Identify by image...");
        assert_eq!(console.error_log(), "IdentifyByImage() not implemented yet");
    }
    
    #[test]
    fn test_clear_and_register_by_image() {
        let mut console = connected(FakeBackend::new().with_template(vec![0x12, 0x34]));
        
        console.trigger(Action::Clear);
        assert_eq!(console.status(), "Clearing fingerprints...");
        assert_eq!(console.error_log(), "");
        
        console.trigger(Action::RegisterByImage);
        assert_eq!(console.error_log(), "");
        assert_eq!(console.image_template().map(|t| t.hex()), Some("1234"));
    }
    
    #[test]
    fn test_live_capture_through_ticks() {
        let mut console = connected(FakeBackend::new().with_finger_presence([false]));
        let t0 = Instant::now();
        
        console.trigger(Action::AcquireLive);
        assert_eq!(console.status(), "Waiting for finger...");
        assert_eq!(console.capture_state(), CaptureState::WaitingForFinger);
        
        assert_eq!(console.tick(t0), CaptureEvent::Waiting);
        assert_eq!(console.tick(t0 + Duration::from_millis(16)), CaptureEvent::FingerDetected);
        assert_eq!(console.status(), "Capturing live fingerprint...");
        
        assert!(matches!(console.tick(t0 + Duration::from_millis(33)), CaptureEvent::Captured(_)));
        assert_eq!(console.status(), "Live fingerprint captured.");
        assert_eq!(console.last_capture().map(|c| c.template.hex().len()), Some(128));
    }
    
    #[test]
    fn test_live_capture_timeout() {
        let mut console = connected(FakeBackend::new().failing_acquire_always(SdkCode::CAPTURE))
            .with_capture_timeout(Duration::from_millis(100));
        let t0 = Instant::now();
        
        console.trigger(Action::AcquireLive);
        console.tick(t0);
        assert!(matches!(console.tick(t0 + Duration::from_millis(50)), CaptureEvent::Retrying { .. }));
        assert_eq!(console.error_log(), "");
        
        assert!(matches!(console.tick(t0 + Duration::from_millis(150)), CaptureEvent::TimedOut(_)));
        assert_eq!(console.status(), "Live capture timed out.");
        assert_eq!(console.error_log(), "Failed to acquire fingerprint. Error code: ZKFP_ERR_CAPTURE(-8)");
        assert!(console.last_capture().is_none());
    }
    
    #[test]
    fn test_disconnect_cancels_capture_and_releases() {
        let mut console = connected(FakeBackend::new().with_finger_presence([false, false]));
        
        console.trigger(Action::AcquireLive);
        console.tick(Instant::now());
        console.trigger(Action::Disconnect);
        
        assert_eq!(console.status(), "Device disconnected.");
        assert_eq!(console.error_log(), "");
        assert!(!console.is_device_open());
        assert_eq!(console.capture_state(), CaptureState::Idle);
        assert_eq!(console.session().backend().live_devices(), 0);
        assert_eq!(console.session().backend().live_databases(), 0);
        assert!(!console.session().backend().is_sdk_initialized());
    }
    
    #[test]
    fn test_reconnect_after_disconnect() {
        let mut console = connected(FakeBackend::new());
        console.trigger(Action::Disconnect);
        console.trigger(Action::Connect);
        
        assert!(console.is_device_open());
        assert_eq!(console.session().backend().stats().init_calls, 2);
    }
}
