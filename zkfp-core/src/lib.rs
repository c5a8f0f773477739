//! # zkfp-core
//!
//! Core primitives for ZKTeco fingerprint reader sessions.
//!
//! This crate provides the pieces shared by every backend and the
//! session layer:
//! - SDK status codes
//! - Device parameter codes and decoding
//! - The session error taxonomy
//! - Session lifecycle state and last-error bookkeeping

pub mod constants;
pub mod error;
pub mod param;
pub mod session;
pub mod status;

pub use error::{Error, Result};
pub use param::Param;
pub use session::{LastError, SessionState};
pub use status::{SdkCode, SdkResult};
