// src/lib.rs
//! GPS Fix Library
//!
//! Reads NMEA 0183 sentences from a GPS receiver and assembles `$GPGGA` and
//! `$GPRMC` pairs into complete, deduplicated position fixes.
//!
//! ```no_run
//! # async fn run() -> gps_fix::Result<()> {
//! use gps_fix::{GpsDevice, GpsSource};
//!
//! let source = GpsSource::File { path: "/dev/ttyAMA0".into() };
//! let mut fixes = GpsDevice::open(&source).await?.watch();
//! while let Some(fix) = fixes.recv().await {
//!     println!("{} {}", fix.lat, fix.lon);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod display;
pub mod error;
pub mod gps;

// Re-export main types for convenience
pub use device::{Closer, Fixes, GpsDevice, GpsSource};
pub use error::{GpsError, Result};
pub use gps::{AssemblyState, Fix, FixAssembler};
