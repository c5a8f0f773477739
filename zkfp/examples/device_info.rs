//! Open the first reader and print its information

use anyhow::Context;
use zkfp::DeviceSession;

#[cfg(feature = "sdk")]
fn backend() -> zkfp::SdkBackend {
    zkfp::SdkBackend::new()
}

#[cfg(not(feature = "sdk"))]
fn backend() -> zkfp::FakeBackend {
    zkfp::FakeBackend::new()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    
    let index: u32 = std::env::var("ZKFP_DEVICE_INDEX")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    
    let mut session = DeviceSession::new(backend());
    session.initialize().context("SDK initialization failed")?;
    
    match session.device_count() {
        None | Some(0) => anyhow::bail!("No fingerprint devices detected"),
        Some(count) => println!("✓ {} device(s) detected", count),
    }
    
    session.open_device(index).context("Failed to open device")?;
    println!("✓ Opened device {}", index);
    
    let info = session.device_info()?;
    println!("✓ Device: {}", info);
    
    if let Some(vendor) = &info.vendor {
        println!("  Vendor: {}", vendor);
    }
    
    session.close_device();
    session.terminate();
    println!("✓ Disconnected");
    
    Ok(())
}
