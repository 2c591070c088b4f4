// src/gps/assembler.rs
//! Assembly of GGA and RMC sentences into complete fixes

use super::{
    data::Fix,
    fields::{Field, SentenceKind},
    nmea::{self, FieldMap},
};
use log::{debug, trace};

/// Altitude changes at or below this many meters are treated as jitter once
/// a cycle already has an altitude
pub const ALT_EPSILON: f64 = 0.1;

/// Progress of the fix currently being assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    /// Nothing collected since the last emitted fix
    Empty,
    /// Only one of the two sentence types has contributed
    Partial,
    /// Both sentence types contributed but the fix repeats the last one
    Complete,
}

/// Accumulates sentences until both sentence types have contributed, then
/// hands out the fix unless it repeats the previously emitted one.
///
/// A single reader owns the assembler; it has no interior locking.
#[derive(Debug, Default)]
pub struct FixAssembler {
    next: Fix,
    last: Fix,
    has_gga: bool,
    has_rmc: bool,
}

impl FixAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize and feed one raw line. Returns the fix it completed, if any.
    pub fn feed_line(&mut self, line: &str) -> Option<Fix> {
        let fields = nmea::tokenize(line);
        if fields.is_empty() {
            trace!("Ignoring line: {}", line.trim());
            return None;
        }
        self.feed(&fields)
    }

    /// Feed one tokenized sentence. Returns the fix it completed, if any.
    pub fn feed(&mut self, fields: &FieldMap<'_>) -> Option<Fix> {
        let kind = fields.kind()?;

        let time = nmea::parse_time(fields.get(Field::Time));
        if time < self.next.time {
            debug!(
                "Discarding {:?} sentence at {:06}, fix in progress is at {:06}",
                kind, time, self.next.time
            );
            return None;
        }

        self.next.time = time;
        self.next.lat = nmea::parse_coordinate(fields.get(Field::Lat));
        self.next.lon = nmea::parse_coordinate(fields.get(Field::Lon));

        match kind {
            SentenceKind::Gga => {
                self.next.quality = nmea::parse_int(fields.get(Field::Quality));
                self.next.satellites = nmea::parse_int(fields.get(Field::Satellites));

                let alt = nmea::parse_float(fields.get(Field::Alt));
                if !self.has_gga || (alt - self.next.alt).abs() > ALT_EPSILON {
                    self.next.alt = alt;
                }
                self.has_gga = true;
            }
            SentenceKind::Rmc => {
                self.next.speed = nmea::parse_float(fields.get(Field::Speed));
                self.next.track_angle = nmea::parse_float(fields.get(Field::TrackAngle));
                self.has_rmc = true;
            }
        }

        if !(self.has_gga && self.has_rmc) {
            return None;
        }

        if self.next.same_position(&self.last) {
            debug!("Suppressing duplicate fix at {:06}", self.next.time);
            return None;
        }

        let fix = self.next;
        self.last = fix;
        self.reset();
        Some(fix)
    }

    /// Current progress towards the next fix
    pub fn state(&self) -> AssemblyState {
        match (self.has_gga, self.has_rmc) {
            (false, false) => AssemblyState::Empty,
            (true, true) => AssemblyState::Complete,
            _ => AssemblyState::Partial,
        }
    }

    /// The fix being accumulated
    pub fn in_progress(&self) -> &Fix {
        &self.next
    }

    /// The most recently emitted fix, all zero before the first one
    pub fn last_emitted(&self) -> &Fix {
        &self.last
    }

    fn reset(&mut self) {
        self.next = Fix::default();
        self.has_gga = false;
        self.has_rmc = false;
    }
}
