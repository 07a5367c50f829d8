//! Capture source backed by a child process speaking JSON lines.
//!
//! The child receives [`BridgeCommand`]s on stdin and writes
//! [`CaptureEvent`]s to stdout, one JSON object per line. A reader thread
//! parses stdout into a channel that the host loop drains through
//! [`CaptureSource::poll_events`]; the core itself stays single-threaded.

use super::error::CaptureError;
use super::events::{BridgeCommand, CaptureEvent};
use super::source::CaptureSource;
use crate::domain::{NetmodalError, Result};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

pub struct ProcessBridge {
    child: Child,
    stdin: Option<ChildStdin>,
    events: Receiver<CaptureEvent>,
}

impl std::fmt::Debug for ProcessBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessBridge")
            .field("pid", &self.child.id())
            .field("connected", &self.stdin.is_some())
            .finish()
    }
}

impl ProcessBridge {
    /// Spawns `argv[0]` with the remaining arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if `argv` is empty or the process cannot be started.
    pub fn spawn(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| NetmodalError::Config("bridge_command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        tracing::info!(program = %program, pid = child.id(), "capture bridge started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| NetmodalError::Capture("bridge stdout unavailable".to_string()))?;
        let stdin = child.stdin.take();

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("capture-bridge".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            tracing::warn!(error = %e, "bridge read failed");
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<CaptureEvent>(&line) {
                        Ok(event) => {
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, line = %line, "malformed bridge line skipped"),
                    }
                }
                let _ = tx.send(CaptureEvent::Detached {
                    reason: Some("capture bridge exited".to_string()),
                });
            })?;

        Ok(Self {
            child,
            stdin,
            events: rx,
        })
    }

    fn send(&mut self, command: &BridgeCommand) -> std::result::Result<(), CaptureError> {
        let stdin = self.stdin.as_mut().ok_or(CaptureError::Disconnected)?;
        let mut line = serde_json::to_string(command).map_err(|e| CaptureError::Permanent(e.to_string()))?;
        line.push('\n');

        if let Err(e) = stdin.write_all(line.as_bytes()).and_then(|()| stdin.flush()) {
            tracing::warn!(error = %e, "bridge write failed");
            self.stdin = None;
            return Err(CaptureError::Disconnected);
        }
        tracing::trace!(?command, "bridge command sent");
        Ok(())
    }
}

impl CaptureSource for ProcessBridge {
    fn enable(&mut self) -> std::result::Result<(), CaptureError> {
        self.send(&BridgeCommand::Enable)
    }

    fn request_body(&mut self, request_id: &str) -> std::result::Result<(), CaptureError> {
        self.send(&BridgeCommand::GetBody {
            request_id: request_id.to_string(),
        })
    }

    fn poll_events(&mut self) -> Vec<CaptureEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

impl Drop for ProcessBridge {
    fn drop(&mut self) {
        self.stdin = None;
        if let Err(e) = self.child.kill() {
            tracing::debug!(error = %e, "bridge already exited");
        }
        let _ = self.child.wait();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn drain_until(bridge: &mut ProcessBridge, want: usize) -> Vec<CaptureEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.len() < want && Instant::now() < deadline {
            events.extend(bridge.poll_events());
            thread::sleep(Duration::from_millis(10));
        }
        events
    }

    #[test]
    fn reads_events_and_reports_exit_as_detach() {
        let script = r#"printf '%s\n' '{"kind":"attachResult"}' 'garbage' '{"kind":"finished","requestId":"1","timestamp":2.0}'"#;
        let argv = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        let mut bridge = ProcessBridge::spawn(&argv).unwrap();

        let events = drain_until(&mut bridge, 3);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], CaptureEvent::AttachResult { error: None });
        assert_eq!(events[1].kind(), "finished");
        assert!(matches!(events[2], CaptureEvent::Detached { .. }));
    }

    #[test]
    fn empty_argv_is_a_config_error() {
        assert!(matches!(ProcessBridge::spawn(&[]), Err(NetmodalError::Config(_))));
    }
}
