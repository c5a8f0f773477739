//! Interactive capture console
//!
//! Drives the operator console at 60 Hz. Type one action per line:
//! connect, disconnect, register, clear, verify, identify, register-image,
//! identify-image, acquire, quit.
//!
//! Uses the in-memory reader unless built with `--features sdk`.

use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::EnvFilter;
use zkfp::constants::{DEFAULT_CAPTURE_TIMEOUT, DEFAULT_IMAGE_PATH, DEFAULT_TICK_RATE};
use zkfp::{Action, CaptureEvent, CaptureFrame, Console, DeviceBackend, DeviceSession};

#[cfg(feature = "sdk")]
fn backend() -> zkfp::SdkBackend {
    zkfp::SdkBackend::new()
}

#[cfg(not(feature = "sdk"))]
fn backend() -> zkfp::FakeBackend {
    // about half a second before the simulated finger lands
    zkfp::FakeBackend::new().with_finger_presence([false; 30])
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("invalid {}={}", key, value)),
        Err(_) => Ok(default),
    }
}

fn print_help() {
    let commands: Vec<&str> = Action::ALL.iter().map(|a| a.command()).collect();
    println!("Commands: {}, quit", commands.join(", "));
}

fn print_status<B: DeviceBackend>(console: &Console<B>) {
    println!("Status: {}", console.status());
    if !console.error_log().is_empty() {
        println!("Error: {}", console.error_log());
    }
}

/// Downsample a frame to ASCII, dark ridges as dense glyphs
fn thumbnail(frame: &CaptureFrame, cols: u32) -> String {
    const RAMP: &[u8] = b"@%#*+=-:. ";
    
    if frame.width() == 0 || frame.height() == 0 {
        return String::new();
    }
    
    let cols = cols.min(frame.width());
    let rows = (cols * frame.height() / frame.width() / 2).max(1);
    let mut out = String::with_capacity(((cols + 1) * rows) as usize);
    
    for row in 0..rows {
        for col in 0..cols {
            let x = col * frame.width() / cols;
            let y = row * frame.height() / rows;
            let level = frame.pixel(x, y).unwrap_or(0) as usize;
            out.push(RAMP[level * (RAMP.len() - 1) / 255] as char);
        }
        out.push('\n');
    }
    
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    
    let device_index: u32 = env_or("ZKFP_DEVICE_INDEX", 0)?;
    let image_path: String = env_or("ZKFP_IMAGE_PATH", DEFAULT_IMAGE_PATH.to_string())?;
    let timeout_ms: u64 = env_or("ZKFP_CAPTURE_TIMEOUT_MS", DEFAULT_CAPTURE_TIMEOUT.as_millis() as u64)?;
    
    let mut console = Console::new(DeviceSession::new(backend()))
        .with_device_index(device_index)
        .with_image_path(image_path)
        .with_capture_timeout(Duration::from_millis(timeout_ms));
    
    println!("ZKTeco Fingerprint Demo");
    print_help();
    print_status(&console);
    
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = interval(Duration::from_secs(1) / DEFAULT_TICK_RATE);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    
    let mut shown = (console.status().to_string(), console.error_log().to_string());
    
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "quit" || line == "exit" {
                    break;
                }
                
                match line.parse::<Action>() {
                    Ok(action) => console.trigger(action),
                    Err(e) => {
                        eprintln!("{}", e);
                        print_help();
                    }
                }
            }
            _ = ticker.tick() => {
                if let CaptureEvent::Captured(capture) = console.tick(Instant::now()) {
                    print!("{}", thumbnail(&capture.frame, 48));
                    println!(
                        "Template ({} bytes): {}",
                        capture.template.len(),
                        capture.template.hex()
                    );
                }
            }
        }
        
        if console.status() != shown.0 || console.error_log() != shown.1 {
            print_status(&console);
            shown = (console.status().to_string(), console.error_log().to_string());
        }
    }
    
    console.shutdown();
    println!("Bye");
    
    Ok(())
}
