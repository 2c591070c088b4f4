// src/device.rs
//! GPS device access and the background fix reader

use crate::{
    error::{GpsError, Result},
    gps::{Fix, FixAssembler},
};
use log::{debug, info, warn};
use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader},
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_serial::SerialPortBuilderExt;

/// Timeout handed to the serial port builder
pub const SERIAL_TIMEOUT: Duration = Duration::from_millis(1000);

/// Where NMEA sentences are read from
#[derive(Debug, Clone, PartialEq)]
pub enum GpsSource {
    Serial { port: String, baudrate: u32 },
    File { path: PathBuf },
}

type DeviceReader = BufReader<Box<dyn AsyncRead + Unpin + Send>>;

/// An opened GPS device that has not started producing fixes yet
pub struct GpsDevice {
    reader: DeviceReader,
}

impl GpsDevice {
    /// Open the device described by `source`
    pub async fn open(source: &GpsSource) -> Result<Self> {
        match source {
            GpsSource::Serial { port, baudrate } => {
                info!("Connecting to GPS on {} at {} baud", port, baudrate);
                let serial = tokio_serial::new(port, *baudrate)
                    .timeout(SERIAL_TIMEOUT)
                    .open_native_async()
                    .map_err(|e| {
                        GpsError::Connection(format!("Failed to open serial port {}: {}", port, e))
                    })?;
                Ok(Self::from_reader(serial))
            }
            GpsSource::File { path } => {
                info!("Reading GPS sentences from {}", path.display());
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    GpsError::Connection(format!("Failed to open {}: {}", path.display(), e))
                })?;
                Ok(Self::from_reader(file))
            }
        }
    }

    /// Wrap any byte stream carrying NMEA sentences
    pub fn from_reader<R: AsyncRead + Unpin + Send + 'static>(reader: R) -> Self {
        let reader: Box<dyn AsyncRead + Unpin + Send> = Box::new(reader);
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Spawn the background reader. Fixes are handed over one at a time
    /// through the returned [`Fixes`]; the reader waits for each hand-off.
    pub fn watch(self) -> Fixes {
        let closer = Closer::new();
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(watch_device(self.reader, closer.clone(), tx));

        Fixes { rx, closer, task }
    }
}

/// A fix waiting for the consumer, acknowledged once taken
struct Handoff {
    fix: Fix,
    ack: oneshot::Sender<()>,
}

/// Consumer side of a watched device
pub struct Fixes {
    rx: mpsc::Receiver<Handoff>,
    closer: Closer,
    task: JoinHandle<()>,
}

impl Fixes {
    /// Wait for the next fix. Returns `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Fix> {
        let Handoff { fix, ack } = self.rx.recv().await?;
        let _ = ack.send(());
        Some(fix)
    }

    /// Stop reading. The reader notices after its current read returns.
    pub fn close(&self) {
        self.closer.close();
    }

    /// A handle that can close the stream from another task
    pub fn closer(&self) -> Closer {
        self.closer.clone()
    }

    /// Check if the stream has not been closed
    pub fn is_open(&self) -> bool {
        self.closer.is_open()
    }

    /// Check if the reader task has stopped and released the device
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Fixes {
    fn drop(&mut self) {
        self.closer.close();
    }
}

/// Shared close flag of a watched device
#[derive(Debug, Clone)]
pub struct Closer {
    running: Arc<AtomicBool>,
}

impl Closer {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn close(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

async fn watch_device<R: AsyncBufRead + Unpin>(
    mut reader: R,
    closer: Closer,
    fixes: mpsc::Sender<Handoff>,
) {
    let mut assembler = FixAssembler::new();
    let mut buf = Vec::with_capacity(128);

    while closer.is_open() {
        let read = reader.read_until(b'\n', &mut buf).await;
        if !closer.is_open() {
            break;
        }

        match read {
            Ok(0) => {
                info!("GPS stream ended");
                break;
            }
            Ok(_) => {
                let completed = assembler.feed_line(&String::from_utf8_lossy(&buf));
                buf.clear();

                if let Some(fix) = completed {
                    if !hand_off(&fixes, fix).await {
                        debug!("Fix consumer went away");
                        break;
                    }
                }
            }
            // Partial line stays in `buf` until the rest arrives
            Err(e) if e.kind() == ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!("Error reading from GPS device: {}", e);
                break;
            }
        }
    }

    debug!("GPS reader stopped");
}

/// Hand `fix` to the consumer and wait until it has been taken
async fn hand_off(fixes: &mpsc::Sender<Handoff>, fix: Fix) -> bool {
    let (ack, taken) = oneshot::channel();
    if fixes.send(Handoff { fix, ack }).await.is_err() {
        return false;
    }
    taken.await.is_ok()
}

/// List available serial ports as `name - type` lines
pub fn list_serial_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|port| format!("{} - {:?}", port.port_name, port.port_type))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::Write,
        pin::Pin,
        sync::atomic::AtomicUsize,
        task::{Context, Poll},
    };
    use tokio::{
        io::{AsyncWriteExt, ReadBuf},
        time::timeout,
    };

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";

    fn moving_track(count: u32) -> String {
        let mut out = String::new();
        for i in 0..count {
            let time = 123519 + i;
            let minutes = format!("{:02}.000", 10 + i);
            out.push_str(&format!(
                "$GPGGA,{},48{},N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n",
                time, minutes
            ));
            out.push_str(&format!(
                "$GPRMC,{},A,48{},N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n",
                time, minutes
            ));
        }
        out
    }

    #[tokio::test]
    async fn test_watch_delivers_fix_then_ends() {
        let input = format!("{}{}", GGA, RMC);
        let mut fixes = GpsDevice::from_reader(std::io::Cursor::new(input.into_bytes())).watch();

        let fix = fixes.recv().await.expect("one fix");
        assert_eq!(fix.quality, 1);
        assert_eq!(fix.satellites, 8);
        assert_eq!(fix.alt, 545.4);
        assert_eq!(fix.speed, 22.4);
        assert_eq!(fix.track_angle, 84.4);
        assert!((fix.lat - 48.1173).abs() < 1e-6);
        assert!((fix.lon - 11.51667).abs() < 1e-5);

        assert_eq!(fixes.recv().await, None);
    }

    #[tokio::test]
    async fn test_watch_skips_noise_and_unknown_sentences() {
        let mut input = b"\xff\xfe\x00noise\r\n".to_vec();
        input.extend_from_slice(b"$GPGSV,3,1,12,01,40,083,46*75\r\n");
        input.extend_from_slice(GGA.as_bytes());
        input.extend_from_slice(RMC.as_bytes());
        let mut fixes = GpsDevice::from_reader(std::io::Cursor::new(input)).watch();

        assert!(fixes.recv().await.is_some());
        assert!(fixes.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_pairs_are_delivered_once() {
        let repeat = RMC.replace("022.4", "010.0");
        let input = format!("{}{}{}{}", GGA, RMC, GGA, repeat);
        let mut fixes = GpsDevice::from_reader(std::io::Cursor::new(input.into_bytes())).watch();

        assert!(fixes.recv().await.is_some());
        assert_eq!(fixes.recv().await, None);
    }

    /// Counts bytes the reader task has pulled from the device
    struct CountingReader<R> {
        inner: R,
        read: Arc<AtomicUsize>,
    }

    impl<R: AsyncRead + Unpin> AsyncRead for CountingReader<R> {
        fn poll_read(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            let this = self.get_mut();
            let before = buf.filled().len();
            let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
            this.read.fetch_add(buf.filled().len() - before, Ordering::SeqCst);
            poll
        }
    }

    #[tokio::test]
    async fn test_close_mid_fix_emits_nothing() {
        let (client, mut server) = tokio::io::duplex(1024);
        let read = Arc::new(AtomicUsize::new(0));
        let reader = CountingReader {
            inner: client,
            read: Arc::clone(&read),
        };
        let mut fixes = GpsDevice::from_reader(reader).watch();

        server.write_all(GGA.as_bytes()).await.unwrap();

        // The reader feeds a line to the assembler in the same poll that
        // reads it, so once the bytes are gone the fix is half assembled
        let consumed = timeout(Duration::from_secs(1), async {
            while read.load(Ordering::SeqCst) < GGA.len() {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(consumed.is_ok());
        assert!(!fixes.is_finished());

        fixes.close();
        server.write_all(RMC.as_bytes()).await.unwrap();
        drop(server);

        assert!(!fixes.is_open());
        assert_eq!(fixes.recv().await, None);
    }

    #[tokio::test]
    async fn test_closer_from_another_task() {
        let (client, server) = tokio::io::duplex(1024);
        let mut fixes = GpsDevice::from_reader(client).watch();
        let closer = fixes.closer();

        tokio::spawn(async move {
            closer.close();
            drop(server);
        });

        assert_eq!(fixes.recv().await, None);
        assert!(!fixes.is_open());
    }

    #[tokio::test]
    async fn test_slow_consumer_stalls_reader() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut fixes = GpsDevice::from_reader(client).watch();
        let track = moving_track(5);

        let writer = tokio::spawn(async move {
            server.write_all(track.as_bytes()).await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!writer.is_finished());

        let mut received = Vec::new();
        while let Some(fix) = fixes.recv().await {
            received.push(fix);
        }

        writer.await.unwrap();
        assert_eq!(received.len(), 5);
        assert!(received.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[tokio::test]
    async fn test_dropping_consumer_releases_device() {
        let (client, mut server) = tokio::io::duplex(4096);
        let fixes = GpsDevice::from_reader(client).watch();
        let closer = fixes.closer();
        drop(fixes);
        assert!(!closer.is_open());

        // Once its pending read returns the reader drops the device, which
        // makes further writes fail
        let released = timeout(Duration::from_secs(1), async {
            while server.write_all(GGA.as_bytes()).await.is_ok() {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(released.is_ok());
    }

    #[tokio::test]
    async fn test_open_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}{}", GGA, RMC).unwrap();
        let source = GpsSource::File {
            path: file.path().to_path_buf(),
        };

        let mut fixes = GpsDevice::open(&source).await.unwrap().watch();
        let fix = fixes.recv().await.unwrap();
        assert_eq!(fix.time, 123519);
        assert_eq!(fixes.recv().await, None);
        assert!(timeout(Duration::from_secs(1), async {
            while !fixes.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .is_ok());
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let source = GpsSource::File {
            path: PathBuf::from("/nonexistent/gps/device"),
        };

        match GpsDevice::open(&source).await {
            Err(GpsError::Connection(msg)) => assert!(msg.contains("/nonexistent/gps/device")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("opening a missing file should fail"),
        }
    }
}
