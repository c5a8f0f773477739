//! Live capture state machine
//!
//! Capturing a fingerprint spans many ticks of the interactive loop. The
//! machine never blocks: each call to [`CaptureMachine::tick`] performs at
//! most one point-in-time SDK call and records where it got to.
//!
//! # States
//!
//! - `Idle`: nothing in progress
//! - `WaitingForFinger`: polling the sensor for a finger, once per tick
//! - `Capturing`: acquiring, retrying failures until the timeout runs out
//!
//! # Transitions
//!
//! - Idle → WaitingForFinger (capture requested with a device open)
//! - WaitingForFinger → Capturing (finger reported present)
//! - Capturing → Idle (acquisition succeeded, or kept failing past the timeout)
//! - WaitingForFinger/Capturing → Idle (device closed underneath)
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use zkfp::{CaptureEvent, CaptureMachine, CaptureState, DeviceSession, FakeBackend};
//!
//! let mut session = DeviceSession::new(FakeBackend::new());
//! session.initialize()?;
//! session.open_device(0)?;
//!
//! let mut machine = CaptureMachine::new();
//! machine.request(&session)?;
//! assert_eq!(machine.state(), CaptureState::WaitingForFinger);
//!
//! let start = Instant::now();
//! assert_eq!(machine.tick(&mut session, start), CaptureEvent::FingerDetected);
//!
//! let event = machine.tick(&mut session, start + Duration::from_millis(16));
//! assert!(matches!(event, CaptureEvent::Captured(_)));
//! assert_eq!(machine.state(), CaptureState::Idle);
//! # Ok::<(), zkfp::Error>(())
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use zkfp_backend::DeviceBackend;
use zkfp_core::constants::DEFAULT_CAPTURE_TIMEOUT;
use zkfp_core::{Error, Result};

use crate::session::{DeviceSession, LiveCapture};

/// Capture progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureState {
    /// Nothing in progress
    Idle,
    
    /// Polling the sensor for a finger
    WaitingForFinger,
    
    /// Acquiring the image and template
    Capturing,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::WaitingForFinger => "WaitingForFinger",
            Self::Capturing => "Capturing",
        };
        f.write_str(name)
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// No capture in progress
    Idle,
    
    /// Still waiting for a finger
    Waiting,
    
    /// Finger found, acquisition starts on the next tick
    FingerDetected,
    
    /// Acquisition succeeded
    Captured(LiveCapture),
    
    /// Acquisition failed within the timeout and will be retried
    Retrying {
        attempt: u32,
    },
    
    /// Acquisition kept failing past the timeout; carries the last failure
    TimedOut(Error),
    
    /// The device was closed while a capture was in progress
    Cancelled,
}

/// Cooperative, tick-driven capture state machine
#[derive(Debug, Clone)]
pub struct CaptureMachine {
    state: CaptureState,
    started_at: Option<Instant>,
    attempts: u32,
    timeout: Duration,
}

impl CaptureMachine {
    /// Create an idle machine with the default 3 second timeout
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            started_at: None,
            attempts: 0,
            timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }
    
    /// Set how long acquisition may keep failing before it is abandoned
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    
    pub fn state(&self) -> CaptureState {
        self.state
    }
    
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
    
    /// When the finger was detected, while capturing
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }
    
    /// Check if a capture is underway
    pub fn is_busy(&self) -> bool {
        self.state != CaptureState::Idle
    }
    
    /// Start a capture
    ///
    /// Does nothing if a capture is already underway.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceNotOpen`] if the session has no open reader; the
    /// machine stays idle.
    pub fn request<B: DeviceBackend>(&mut self, session: &DeviceSession<B>) -> Result<()> {
        if !session.is_device_open() {
            return Err(Error::DeviceNotOpen);
        }
        
        if self.is_busy() {
            debug!(state = %self.state, "Capture already in progress");
            return Ok(());
        }
        
        self.state = CaptureState::WaitingForFinger;
        info!("Waiting for finger");
        Ok(())
    }
    
    /// Abandon any capture in progress
    pub fn cancel(&mut self) {
        if self.is_busy() {
            debug!(state = %self.state, "Capture cancelled");
        }
        self.reset();
    }
    
    fn reset(&mut self) {
        self.state = CaptureState::Idle;
        self.started_at = None;
        self.attempts = 0;
    }
    
    /// Advance by one tick at time `now`
    pub fn tick<B: DeviceBackend>(&mut self, session: &mut DeviceSession<B>, now: Instant) -> CaptureEvent {
        if self.state == CaptureState::Idle {
            return CaptureEvent::Idle;
        }
        
        if !session.is_device_open() {
            warn!(state = %self.state, "Device closed during capture");
            self.reset();
            return CaptureEvent::Cancelled;
        }
        
        match self.state {
            CaptureState::Idle => CaptureEvent::Idle,
            CaptureState::WaitingForFinger => self.poll_finger(session, now),
            CaptureState::Capturing => self.attempt_capture(session, now),
        }
    }
    
    fn poll_finger<B: DeviceBackend>(&mut self, session: &mut DeviceSession<B>, now: Instant) -> CaptureEvent {
        match session.finger_present() {
            Ok(true) => {
                self.state = CaptureState::Capturing;
                self.started_at = Some(now);
                self.attempts = 0;
                debug!("Finger detected");
                CaptureEvent::FingerDetected
            }
            Ok(false) => CaptureEvent::Waiting,
            Err(e) => {
                trace!(error = %e, "Finger presence query failed");
                CaptureEvent::Waiting
            }
        }
    }
    
    fn attempt_capture<B: DeviceBackend>(&mut self, session: &mut DeviceSession<B>, now: Instant) -> CaptureEvent {
        self.attempts += 1;
        
        match session.acquire_live_fingerprint() {
            Ok(capture) => {
                info!(attempts = self.attempts, "Live fingerprint captured");
                self.reset();
                CaptureEvent::Captured(capture)
            }
            Err(e) => {
                let started = *self.started_at.get_or_insert(now);
                let elapsed = now.saturating_duration_since(started);
                
                if elapsed > self.timeout {
                    warn!(
                        attempts = self.attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Capture timed out: {}",
                        e
                    );
                    self.reset();
                    CaptureEvent::TimedOut(e)
                } else {
                    trace!(attempt = self.attempts, error = %e, "Capture attempt failed, retrying");
                    CaptureEvent::Retrying {
                        attempt: self.attempts,
                    }
                }
            }
        }
    }
}

impl Default for CaptureMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use zkfp_backend::FakeBackend;
    use zkfp_core::SdkCode;
    
    fn open_session(backend: FakeBackend) -> DeviceSession<FakeBackend> {
        let mut session = DeviceSession::new(backend);
        session.initialize().unwrap();
        session.open_device(0).unwrap();
        session
    }
    
    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }
    
    #[test]
    fn test_machine_new() {
        let machine = CaptureMachine::new();
        assert_eq!(machine.state(), CaptureState::Idle);
        assert_eq!(machine.timeout(), Duration::from_secs(3));
        assert!(!machine.is_busy());
    }
    
    #[test]
    fn test_request_without_device_stays_idle() {
        let session = DeviceSession::new(FakeBackend::new());
        let mut machine = CaptureMachine::new();
        
        assert_eq!(machine.request(&session), Err(Error::DeviceNotOpen));
        assert_eq!(machine.state(), CaptureState::Idle);
    }
    
    #[test]
    fn test_idle_tick_does_nothing() {
        let mut session = open_session(FakeBackend::new());
        let mut machine = CaptureMachine::new();
        
        assert_eq!(machine.tick(&mut session, Instant::now()), CaptureEvent::Idle);
        assert_eq!(session.backend().stats().presence_queries, 0);
    }
    
    #[test]
    fn test_full_capture_cycle() {
        let mut session = open_session(FakeBackend::new().with_finger_presence([false, false]));
        let mut machine = CaptureMachine::new();
        let t0 = Instant::now();
        
        machine.request(&session).unwrap();
        assert_eq!(machine.state(), CaptureState::WaitingForFinger);
        
        assert_eq!(machine.tick(&mut session, t0), CaptureEvent::Waiting);
        assert_eq!(machine.tick(&mut session, t0 + ms(16)), CaptureEvent::Waiting);
        assert_eq!(machine.tick(&mut session, t0 + ms(33)), CaptureEvent::FingerDetected);
        assert_eq!(machine.state(), CaptureState::Capturing);
        assert_eq!(machine.started_at(), Some(t0 + ms(33)));
        
        let event = machine.tick(&mut session, t0 + ms(50));
        let CaptureEvent::Captured(capture) = event else {
            panic!("expected a capture, got {:?}", event);
        };
        assert_eq!(capture.frame.pixels().len(), 120_000);
        assert_eq!(capture.template.hex().len(), 128);
        assert_eq!(machine.state(), CaptureState::Idle);
        assert_eq!(session.last_capture(), Some(&capture));
        assert_eq!(session.backend().stats().presence_queries, 3);
    }
    
    #[test]
    fn test_transient_failures_are_retried() {
        let mut session = open_session(FakeBackend::new().failing_acquire(2, SdkCode::CAPTURE));
        let mut machine = CaptureMachine::new();
        let t0 = Instant::now();
        
        machine.request(&session).unwrap();
        machine.tick(&mut session, t0);
        
        assert_eq!(machine.tick(&mut session, t0 + ms(16)), CaptureEvent::Retrying { attempt: 1 });
        assert_eq!(machine.tick(&mut session, t0 + ms(33)), CaptureEvent::Retrying { attempt: 2 });
        assert_eq!(machine.state(), CaptureState::Capturing);
        
        assert!(matches!(machine.tick(&mut session, t0 + ms(50)), CaptureEvent::Captured(_)));
        assert_eq!(session.last_error(), "");
    }
    
    #[test]
    fn test_capture_recovers_when_sensor_heals() {
        let mut session = open_session(FakeBackend::new().failing_acquire_always(SdkCode::CAPTURE));
        let mut machine = CaptureMachine::new();
        let t0 = Instant::now();
        
        machine.request(&session).unwrap();
        machine.tick(&mut session, t0);
        assert_eq!(machine.tick(&mut session, t0 + ms(16)), CaptureEvent::Retrying { attempt: 1 });
        
        session.backend_mut().heal_acquisition();
        assert!(matches!(machine.tick(&mut session, t0 + ms(33)), CaptureEvent::Captured(_)));
        
        session.backend_mut().queue_finger_presence(false);
        machine.request(&session).unwrap();
        assert_eq!(machine.tick(&mut session, t0 + ms(50)), CaptureEvent::Waiting);
        assert_eq!(machine.tick(&mut session, t0 + ms(66)), CaptureEvent::FingerDetected);
    }
    
    #[test]
    fn test_persistent_failure_times_out() {
        let mut session = open_session(FakeBackend::new());
        let mut machine = CaptureMachine::new().with_timeout(Duration::from_secs(3));
        let t0 = Instant::now();
        
        machine.request(&session).unwrap();
        machine.tick(&mut session, t0);
        let first = match machine.tick(&mut session, t0 + ms(16)) {
            CaptureEvent::Captured(capture) => capture,
            other => panic!("expected a capture, got {:?}", other),
        };
        
        session.backend_mut().fail_next_acquisitions(usize::MAX, SdkCode::CAPTURE);
        machine.request(&session).unwrap();
        machine.tick(&mut session, t0 + ms(100));
        
        assert_eq!(machine.tick(&mut session, t0 + ms(1_000)), CaptureEvent::Retrying { attempt: 1 });
        // exactly at the timeout the attempt is still retried
        assert_eq!(machine.tick(&mut session, t0 + ms(3_100)), CaptureEvent::Retrying { attempt: 2 });
        
        let event = machine.tick(&mut session, t0 + ms(3_101));
        assert_eq!(
            event,
            CaptureEvent::TimedOut(Error::Capture {
                code: SdkCode::CAPTURE,
                message: "Failed to acquire fingerprint".into(),
            })
        );
        assert_eq!(machine.state(), CaptureState::Idle);
        assert_eq!(
            session.last_error(),
            "Failed to acquire fingerprint. Error code: ZKFP_ERR_CAPTURE(-8)"
        );
        assert_eq!(session.last_capture(), Some(&first));
    }
    
    #[test]
    fn test_second_request_while_busy_is_ignored() {
        let mut session = open_session(FakeBackend::new());
        let mut machine = CaptureMachine::new();
        let t0 = Instant::now();
        
        machine.request(&session).unwrap();
        machine.tick(&mut session, t0);
        machine.request(&session).unwrap();
        
        assert_eq!(machine.state(), CaptureState::Capturing);
        assert_eq!(machine.started_at(), Some(t0));
    }
    
    #[test]
    fn test_device_closed_mid_capture_cancels() {
        let mut session = open_session(FakeBackend::new().with_finger_presence([false]));
        let mut machine = CaptureMachine::new();
        let t0 = Instant::now();
        
        machine.request(&session).unwrap();
        machine.tick(&mut session, t0);
        session.close_device();
        
        assert_eq!(machine.tick(&mut session, t0 + ms(16)), CaptureEvent::Cancelled);
        assert_eq!(machine.state(), CaptureState::Idle);
        assert_eq!(machine.started_at(), None);
    }
    
    #[test]
    fn test_cancel_resets() {
        let mut session = open_session(FakeBackend::new());
        let mut machine = CaptureMachine::new();
        
        machine.request(&session).unwrap();
        machine.tick(&mut session, Instant::now());
        machine.cancel();
        
        assert_eq!(machine.state(), CaptureState::Idle);
        assert_eq!(machine.started_at(), None);
        assert_eq!(session.backend().stats().acquire_calls, 0);
    }
}
