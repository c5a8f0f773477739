//! SDK and capture constants

use std::time::Duration;

/// Upper bound on a template produced by the SDK (bytes)
pub const MAX_TEMPLATE_SIZE: usize = 2048;

/// Resolution passed to image extraction when none is configured
pub const DEFAULT_IMAGE_DPI: u32 = 500;

/// How long a capture may keep failing before it is abandoned
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(3);

/// Interactive loop tick rate (Hz)
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Still image used by the register/identify-by-image actions
pub const DEFAULT_IMAGE_PATH: &str = "finger.bmp";

/// Buffer size for integer parameters (one native `int`)
pub const PARAM_BUFFER_SIZE: usize = 4;

/// Buffer size for text parameters (vendor, product, serial)
pub const TEXT_PARAM_BUFFER_SIZE: usize = 64;

/// Largest integer parameter accepted from the reader (pixels, or dots
/// per inch for the DPI parameter)
pub const MAX_IMAGE_DIMENSION: u32 = 4096;
