//! Lists cameras, then captures from one for a few seconds and prints what
//! arrived.
//!
//! ```text
//! capture-probe [DEVICE_PREFIX] [WIDTH HEIGHT FPS FORMAT] [SECONDS]
//! ```
//! Set `RUST_LOG=debug` for the session log.

#[cfg(target_os = "windows")]
fn main() -> std::process::ExitCode {
    env_logger::init();

    match probe::run(std::env::args().skip(1).collect()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("capture-probe: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn main() -> std::process::ExitCode {
    env_logger::init();
    eprintln!("capture-probe: Media Foundation capture is only available on Windows");
    std::process::ExitCode::FAILURE
}

#[cfg(target_os = "windows")]
mod probe {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use video_capture_core::{
        Capability, CaptureConfiguration, CaptureDelegate, CaptureError, DeviceDirectory, Frame,
        PixelFormat, SessionState, VideoCapture,
    };
    use video_capture_windows::MediaFoundationProvider;

    struct LoggingDelegate;

    impl CaptureDelegate for LoggingDelegate {
        fn on_state_changed(&self, state: &SessionState) {
            println!("  state: {}", state);
        }

        fn on_error(&self, error: &CaptureError) {
            eprintln!("  capture error: {}", error);
        }
    }

    fn parse<T: std::str::FromStr>(value: &str, what: &str) -> Result<T, String> {
        value
            .parse()
            .map_err(|_| format!("invalid {}: {}", what, value))
    }

    pub(super) fn run(args: Vec<String>) -> Result<(), String> {
        let requested = match args.get(1..5) {
            Some([w, h, fps, format]) => Capability::new(
                parse(w, "width")?,
                parse(h, "height")?,
                parse(fps, "frame rate")?,
                format.parse::<PixelFormat>()?,
            ),
            _ => Capability::new(640, 480, 30, PixelFormat::Yuy2),
        };
        let seconds: u64 = match args.get(5) {
            Some(s) => parse(s, "duration")?,
            None => 3,
        };

        let provider = MediaFoundationProvider::new().map_err(|e| e.to_string())?;
        let directory = Arc::new(
            DeviceDirectory::new(Arc::new(provider), CaptureConfiguration::default())
                .map_err(|e| e.to_string())?,
        );

        let devices = directory.enumerate().map_err(|e| e.to_string())?;
        println!("{} camera(s):", devices.len());
        for (index, device) in devices.iter().enumerate() {
            println!("  [{}] {}", index, device.display_name);
            println!("      {}", device.unique_id);
        }

        let device_id = match args.first() {
            Some(prefix) => prefix.clone(),
            None => match devices.first() {
                Some(device) => device.unique_id.clone(),
                None => return Ok(()),
            },
        };

        println!("formats offered by {}:", device_id);
        for format in directory.capabilities(&device_id).map_err(|e| e.to_string())? {
            println!("  #{:<3} {}", format.native.0, format.capability);
        }

        let frames = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&frames);
        let mut capture = VideoCapture::new(
            Arc::clone(&directory),
            Arc::new(move |_: &Frame<'_>| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        capture.set_delegate(Arc::new(LoggingDelegate));

        capture.init(&device_id).map_err(|e| e.to_string())?;
        capture.start_capture(&requested).map_err(|e| e.to_string())?;
        if let Some(settings) = capture.capture_settings() {
            println!("requested {}, capturing {}", requested, settings);
        }

        thread::sleep(Duration::from_secs(seconds));
        capture.stop_capture();

        let diagnostics = capture.diagnostics();
        println!(
            "{} frames ({} bytes) in {}s, last timestamp {:?} ms",
            frames.load(Ordering::Relaxed),
            diagnostics.bytes_delivered,
            seconds,
            diagnostics.last_capture_time_ms
        );
        Ok(())
    }
}
