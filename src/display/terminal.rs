// src/display/terminal.rs
//! Terminal output of fixes

use super::OutputFormat;
use crate::{
    device::Fixes,
    error::{GpsError, Result},
    gps::Fix,
};
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::{future::Future, io::Write};

pub struct TerminalDisplay {
    format: OutputFormat,
}

impl TerminalDisplay {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the startup banner (text output only)
    pub fn render_header(&self, out: &mut impl Write, source: &str) -> Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }

        queue!(
            out,
            SetForegroundColor(Color::Green),
            Print(format!("Reading fixes from {}\n", source)),
            Print("Press Ctrl+C to exit\n"),
            ResetColor
        )
        .map_err(GpsError::Io)?;
        out.flush()?;
        Ok(())
    }

    /// Print fixes until the stream ends or `shutdown` completes. On shutdown
    /// the stream is closed and this returns without waiting for the reader,
    /// which may still be blocked on a silent device.
    pub async fn run<W: Write>(
        &self,
        fixes: &mut Fixes,
        out: &mut W,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                fix = fixes.recv() => match fix {
                    Some(fix) => self.render_fix(out, &fix)?,
                    None => break,
                },
                _ = &mut shutdown => {
                    fixes.close();
                    break;
                }
            }
        }

        Ok(())
    }

    /// Write one fix and flush
    pub fn render_fix(&self, out: &mut impl Write, fix: &Fix) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, fix)?;
                writeln!(out)?;
            }
            OutputFormat::Text => self.render_text(out, fix)?,
        }
        out.flush()?;
        Ok(())
    }

    fn render_text(&self, out: &mut impl Write, fix: &Fix) -> Result<()> {
        let quality_color = if fix.has_fix() { Color::Green } else { Color::Red };

        queue!(
            out,
            SetForegroundColor(Color::Cyan),
            Print(format!("{} ", fix.time_label())),
            SetForegroundColor(quality_color),
            Print(format!("{:<10}", fix.quality_description())),
            ResetColor,
            Print(format!(
                " {:>12.8} {:>13.8}  {:>8.1} m  {:>6.1} kn  {:>5.1}°  {:>2} sats\n",
                fix.lat, fix.lon, fix.alt, fix.speed, fix.track_angle, fix.satellites
            ))
        )
        .map_err(GpsError::Io)?;
        Ok(())
    }
}
