use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::capability::Capability;
use crate::models::error::NativeError;
use crate::models::frame::{hns_to_ms, Frame};
use crate::session::pending::Pending;
use crate::traits::frame_consumer::FrameConsumer;

struct SinkShared {
    format: Capability,
    consumer: RwLock<Option<Arc<dyn FrameConsumer>>>,
    frames: AtomicU64,
}

/// Adapts native sample delivery to [`Frame`] callbacks.
///
/// Created per start, bound to the negotiated format. The backend receives a
/// [`SampleSink`] for pushing samples; releasing the adapter detaches the
/// consumer so late samples are dropped.
pub struct FrameSinkAdapter {
    shared: Arc<SinkShared>,
}

/// Delivery endpoint handed to a backend by [`FrameSinkAdapter::initialize`].
#[derive(Clone)]
pub struct SampleSink {
    shared: Arc<SinkShared>,
}

impl FrameSinkAdapter {
    pub fn configure(target_format: Capability, consumer: Arc<dyn FrameConsumer>) -> Self {
        Self {
            shared: Arc::new(SinkShared {
                format: target_format,
                consumer: RwLock::new(Some(consumer)),
                frames: AtomicU64::new(0),
            }),
        }
    }

    /// Produce the delivery endpoint for the backend.
    pub fn initialize(&self) -> Pending<SampleSink> {
        if !self.is_attached() {
            return Pending::ready(Err(NativeError::invalid_state("sink already released")));
        }
        Pending::ready(Ok(SampleSink {
            shared: Arc::clone(&self.shared),
        }))
    }

    pub fn format(&self) -> Capability {
        self.shared.format
    }

    pub fn is_attached(&self) -> bool {
        self.shared.consumer.read().is_some()
    }

    pub fn frames_delivered(&self) -> u64 {
        self.shared.frames.load(Ordering::Relaxed)
    }

    /// Detach the consumer. Blocks until an in-flight callback returns, so
    /// no frame is delivered after this call. Idempotent.
    pub fn release(&self) {
        self.shared.consumer.write().take();
    }
}

impl Drop for FrameSinkAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

impl SampleSink {
    /// Forward one native sample to the consumer.
    ///
    /// `buffer` is only borrowed for the duration of the call.
    /// `native_timestamp` is in 100-nanosecond units. Returns false if the
    /// sink has been released and the sample was dropped.
    pub fn on_sample(&self, buffer: &[u8], native_timestamp: i64) -> bool {
        let consumer = self.shared.consumer.read();
        let Some(consumer) = consumer.as_ref() else {
            return false;
        };

        let frame = Frame {
            data: buffer,
            capture_time_ms: hns_to_ms(native_timestamp),
            format: self.shared.format,
        };
        log::trace!(
            "frame delivered: {} bytes, capture time {} ms",
            frame.len(),
            frame.capture_time_ms
        );
        consumer.on_incoming_frame(&frame);
        self.shared.frames.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn format(&self) -> Capability {
        self.shared.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capability::PixelFormat;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    fn vga() -> Capability {
        Capability::new(640, 480, 30, PixelFormat::Yuy2)
    }

    #[test]
    fn forwards_samples_with_millisecond_timestamps() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&seen);
        let adapter = FrameSinkAdapter::configure(
            vga(),
            Arc::new(move |frame: &Frame<'_>| {
                recorded.lock().push((frame.data.to_vec(), frame.capture_time_ms, frame.format));
            }),
        );

        let sink = adapter.initialize().wait(None).unwrap();
        assert!(sink.on_sample(&[1, 2, 3], 1_234_560));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (vec![1, 2, 3], 123, vga()));
        assert_eq!(adapter.frames_delivered(), 1);
    }

    #[test]
    fn released_sink_drops_samples() {
        let adapter = FrameSinkAdapter::configure(
            vga(),
            Arc::new(|_: &Frame<'_>| panic!("frame after release")),
        );
        let sink = adapter.initialize().wait(None).unwrap();

        adapter.release();
        adapter.release();

        assert!(!sink.on_sample(&[0; 4], 0));
        assert_eq!(adapter.frames_delivered(), 0);
        assert!(adapter.initialize().wait(None).is_err());
    }

    #[test]
    fn release_waits_for_in_flight_callback() {
        let entered = Arc::new(Barrier::new(2));
        let finished = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));

        let adapter = {
            let entered = Arc::clone(&entered);
            let finished = Arc::clone(&finished);
            let calls = Arc::clone(&calls);
            FrameSinkAdapter::configure(
                vga(),
                Arc::new(move |_: &Frame<'_>| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    entered.wait();
                    thread::sleep(Duration::from_millis(100));
                    finished.store(true, Ordering::SeqCst);
                }),
            )
        };
        let sink = adapter.initialize().wait(None).unwrap();

        let delivering = sink.clone();
        let delivery = thread::spawn(move || delivering.on_sample(&[0; 4], 0));
        entered.wait();

        adapter.release();

        assert!(finished.load(Ordering::SeqCst));
        assert!(delivery.join().unwrap());
        assert!(!sink.on_sample(&[0; 4], 10_000));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.frames_delivered(), 1);
    }

    #[test]
    fn dropping_adapter_detaches_consumer() {
        let adapter = FrameSinkAdapter::configure(vga(), Arc::new(|_: &Frame<'_>| {}));
        let sink = adapter.initialize().wait(None).unwrap();
        drop(adapter);
        assert!(!sink.on_sample(&[0; 4], 0));
    }
}
