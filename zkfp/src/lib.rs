//! # zkfp
//!
//! Session wrapper and live capture loop for ZKTeco USB fingerprint readers.
//!
//! ## Features
//!
//! - Owned SDK, database and device handles with idempotent teardown
//! - Last-error tracking on every operation
//! - Non-blocking, tick-driven live capture with a retry timeout
//! - Swappable backend: vendor `libzkfp` (feature `sdk`) or an in-memory fake
//!
//! ## Quick Start
//!
//! ```
//! use std::time::Instant;
//! use zkfp::{Action, CaptureEvent, Console, DeviceSession, FakeBackend};
//!
//! let mut console = Console::new(DeviceSession::new(FakeBackend::new()));
//!
//! console.trigger(Action::Connect);
//! assert_eq!(console.status(), "Device connected successfully.");
//!
//! console.trigger(Action::AcquireLive);
//! let now = Instant::now();
//! assert_eq!(console.tick(now), CaptureEvent::FingerDetected);
//! assert!(matches!(console.tick(now), CaptureEvent::Captured(_)));
//!
//! let capture = console.last_capture().unwrap();
//! println!("{}", capture.template.hex());
//!
//! console.trigger(Action::Disconnect);
//! ```

pub mod capture;
pub mod console;
pub mod session;

// Re-exports
pub use capture::{CaptureEvent, CaptureMachine, CaptureState};
pub use console::{Action, Console};
pub use session::{DeviceSession, LiveCapture};

pub use zkfp_backend::{DeviceBackend, FakeBackend};
#[cfg(feature = "sdk")]
pub use zkfp_backend::SdkBackend;
pub use zkfp_core::{constants, Error, Param, Result, SdkCode, SessionState};
pub use zkfp_types::{CaptureFrame, CapturedTemplate, DeviceInfo};
