use super::error::CaptureError;
use super::events::CaptureEvent;

/// External provider of network lifecycle events.
///
/// Both operations are fire-and-forget: their outcomes arrive later on the
/// event feed as [`CaptureEvent::AttachResult`] and
/// [`CaptureEvent::BodyResult`]. An `Err` here means the request could not
/// even be sent.
pub trait CaptureSource {
    /// Asks the source to attach. Must be safe to call while attached; the
    /// source then answers with an "already active" result.
    fn enable(&mut self) -> Result<(), CaptureError>;

    /// Asks the source for the response body of `request_id`.
    fn request_body(&mut self, request_id: &str) -> Result<(), CaptureError>;

    /// Drains events that arrived since the last call.
    fn poll_events(&mut self) -> Vec<CaptureEvent>;
}

/// A source that never attaches; used when no bridge command is configured.
#[derive(Debug, Default)]
pub struct NullSource;

impl CaptureSource for NullSource {
    fn enable(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::Permanent(
            "no capture bridge configured (set bridge_command or pass --bridge)".to_string(),
        ))
    }

    fn request_body(&mut self, _request_id: &str) -> Result<(), CaptureError> {
        Err(CaptureError::Disconnected)
    }

    fn poll_events(&mut self) -> Vec<CaptureEvent> {
        Vec::new()
    }
}
