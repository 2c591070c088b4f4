// src/gps/data.rs
//! GPS fix data structures and utilities

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One positional reading assembled from a GGA and an RMC sentence
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub time: u32,        // hhmmss as printed by the receiver
    pub quality: u8,      // 0 - invalid, 1 - GPS, 2 - DGPS, ...
    pub satellites: u8,   // Satellites in view
    pub lat: f64,         // Decimal degrees, negative south
    pub lon: f64,         // Decimal degrees, negative west
    pub alt: f64,         // Meters
    pub speed: f64,       // Knots over ground
    pub track_angle: f64, // Course over ground in degrees
}

impl Fix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare position, altitude and course only.
    /// Time, quality, satellites and speed are not checked.
    pub fn same_position(&self, other: &Fix) -> bool {
        self.lat == other.lat
            && self.lon == other.lon
            && self.alt == other.alt
            && self.track_angle == other.track_angle
    }

    /// Check if the receiver reported a usable fix
    pub fn has_fix(&self) -> bool {
        self.quality != 0
    }

    /// Receiver time of day, `None` if the hhmmss value is out of range
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.time / 10000, self.time / 100 % 100, self.time % 100)
    }

    /// `HH:MM:SS`, or the raw hhmmss digits when out of range
    pub fn time_label(&self) -> String {
        match self.time_of_day() {
            Some(t) => t.format("%H:%M:%S").to_string(),
            None => format!("{:06}", self.time),
        }
    }

    /// Get fix quality description
    pub fn quality_description(&self) -> String {
        match self.quality {
            0 => "No fix".to_string(),
            1 => "GPS".to_string(),
            2 => "DGPS".to_string(),
            3 => "PPS".to_string(),
            4 => "RTK".to_string(),
            5 => "Float RTK".to_string(),
            6 => "Estimated".to_string(),
            7 => "Manual".to_string(),
            8 => "Simulation".to_string(),
            q => format!("Unknown ({})", q),
        }
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.8},{:.8} alt {:.1} m, {:.1} kn @ {:.1}°, {} sats ({})",
            self.time_label(),
            self.lat,
            self.lon,
            self.alt,
            self.speed,
            self.track_angle,
            self.satellites,
            self.quality_description()
        )
    }
}
