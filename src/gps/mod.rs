// src/gps/mod.rs
//! NMEA decoding and fix assembly

pub mod assembler;
pub mod data;
pub mod fields;
pub mod nmea;

pub use assembler::{AssemblyState, FixAssembler};
pub use data::Fix;
