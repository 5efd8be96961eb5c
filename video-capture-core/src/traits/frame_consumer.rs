use crate::models::frame::Frame;

/// Receives every frame delivered by an active capture.
///
/// Called synchronously on the delivery thread with no queueing, so a slow
/// consumer throttles the capture pipeline. Must not block indefinitely and
/// must not start or stop capture from inside the callback.
pub trait FrameConsumer: Send + Sync {
    fn on_incoming_frame(&self, frame: &Frame<'_>);
}

impl<F> FrameConsumer for F
where
    F: Fn(&Frame<'_>) + Send + Sync,
{
    fn on_incoming_frame(&self, frame: &Frame<'_>) {
        self(frame)
    }
}
