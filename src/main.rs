// src/main.rs
//! gps-fix - print complete GPS fixes read from a serial port or device file

use anyhow::Context;
use clap::Parser;
use gps_fix::{
    config::GpsConfig,
    device::{list_serial_ports, GpsDevice},
    display::{terminal::TerminalDisplay, OutputFormat},
    GpsSource,
};
use log::info;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Parser)]
#[command(name = "gps-fix", version, about = "Print complete GPS fixes from NMEA GGA/RMC sentences")]
struct Args {
    /// Read from this serial port
    #[arg(short, long, conflicts_with = "file")]
    serial: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Read from this device or file path
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Use this config file instead of ~/.config/gps-fix/config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save the effective settings to the config file
    #[arg(long)]
    save: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(args));
    // A reader stuck on a silent device must not keep the process alive
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run(args: Args) -> anyhow::Result<()> {

    if args.list_ports {
        let ports = list_serial_ports()?;
        if ports.is_empty() {
            println!("No serial ports found.");
        } else {
            println!("Available serial ports:");
            for port in ports {
                println!("  {}", port);
            }
        }
        return Ok(());
    }

    let config_path = match args.config {
        Some(path) => path,
        None => GpsConfig::get_config_path()?,
    };
    let mut config = GpsConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(port) = args.serial {
        config.update_serial(port, args.baud);
    } else if let Some(baud) = args.baud {
        config.serial_baudrate = baud;
    }
    if let Some(path) = args.file {
        config.update_file(path);
    }
    if let Some(output) = args.output {
        config.output = output;
    }

    if args.save {
        config
            .save_to(&config_path)
            .with_context(|| format!("saving {}", config_path.display()))?;
        info!("Saved settings to {}", config_path.display());
    }

    let source = config.to_source()?;
    let source_name = match &source {
        GpsSource::Serial { port, baudrate } => format!("{} at {} baud", port, baudrate),
        GpsSource::File { path } => path.display().to_string(),
    };

    let device = GpsDevice::open(&source).await?;
    let mut fixes = device.watch();

    let display = TerminalDisplay::new(config.output);
    let mut stdout = std::io::stdout();
    display.render_header(&mut stdout, &source_name)?;

    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        info!("Interrupted, closing GPS stream");
    };
    display.run(&mut fixes, &mut stdout, ctrl_c).await?;

    info!("GPS stream closed");
    Ok(())
}
