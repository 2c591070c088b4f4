// src/gps/fields.rs
//! Column layouts of the NMEA sentences the assembler understands

/// Sentence types that contribute to a fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentenceKind {
    /// Global Positioning System Fix Data: position, quality, altitude
    Gga,
    /// Recommended Minimum data: position, speed, course
    Rmc,
}

/// Named column of a sentence. `Lat` and `Lon` occupy two columns each
/// (numeric value followed by the hemisphere letter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Time,
    Status,
    Lat,
    Lon,
    Quality,
    Satellites,
    Alt,
    Speed,
    TrackAngle,
    /// Placeholder for columns that are never collected
    Ignored,
}

/// Ordered column layout of one sentence identifier
#[derive(Debug)]
pub struct SentenceLayout {
    pub id: &'static str,
    pub kind: SentenceKind,
    pub fields: &'static [Field],
}

use Field::*;

// $GPGGA,hhmmss,llll.ll,a,yyyyy.yy,a,q,ss,hdop,alt,M,...
static GGA: SentenceLayout = SentenceLayout {
    id: "$GPGGA",
    kind: SentenceKind::Gga,
    fields: &[Ignored, Time, Lat, Lat, Lon, Lon, Quality, Satellites, Ignored, Alt],
};

// $GPRMC,hhmmss,A,llll.ll,a,yyyyy.yy,a,knots,course,ddmmyy,...
static RMC: SentenceLayout = SentenceLayout {
    id: "$GPRMC",
    kind: SentenceKind::Rmc,
    fields: &[Ignored, Time, Status, Lat, Lat, Lon, Lon, Speed, TrackAngle],
};

static LAYOUTS: [&SentenceLayout; 2] = [&GGA, &RMC];

/// Look up the column layout for a sentence identifier such as `$GPGGA`
pub fn lookup(sentence_id: &str) -> Option<&'static SentenceLayout> {
    LAYOUTS.iter().copied().find(|layout| layout.id == sentence_id)
}
