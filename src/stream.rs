// SPDX-License-Identifier: GPL-3.0-only

//! Stream lifecycle
//!
//! A [`CaptureSession`] acquires a capture source, reports its readiness and
//! always has a current frame once playback has started. Acquisition failures
//! stop whatever was partially opened before the error is returned.

use crate::backends::{CaptureConstraints, CaptureSource, StreamInfo};
use crate::context::KillSwitch;
use crate::errors::{VelvetError, VelvetResult};
use crate::frame::Frame;
use tracing::{debug, error, info};

/// Readiness notifications of a capture stream, in the order they occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Dimensions are known
    DataLoaded { width: u32, height: u32 },
    /// Metadata is available and playback has been requested
    MetadataLoaded,
    /// The first frame arrived
    PlaybackStarted,
}

/// Owns the capture source for one stream
pub struct CaptureSession {
    source: Box<dyn CaptureSource>,
    constraints: CaptureConstraints,
    info: Option<StreamInfo>,
    last_frame: Option<Frame>,
    events: Vec<StreamEvent>,
}

impl CaptureSession {
    pub fn new(source: Box<dyn CaptureSource>, constraints: CaptureConstraints) -> Self {
        Self {
            source,
            constraints,
            info: None,
            last_frame: None,
            events: Vec::new(),
        }
    }

    /// Acquire the device and start the stream
    pub fn activate(&mut self, switch: &KillSwitch) -> VelvetResult<StreamInfo> {
        switch.ensure_enabled()?;

        let info = match self.source.open(&self.constraints) {
            Ok(info) if info.width == 0 || info.height == 0 => {
                Err(VelvetError::UnrecognizedMediaStream(format!(
                    "{} reported an empty {}x{} stream",
                    self.source.describe(),
                    info.width,
                    info.height
                )))
            }
            other => other,
        };

        let info = match info {
            Ok(info) => info,
            Err(e) => {
                error!(source = %self.source.describe(), error = %e, "Stream activation failed");
                self.source.stop();
                return Err(e);
            }
        };

        self.last_frame = None;
        self.events.clear();
        self.record(StreamEvent::DataLoaded {
            width: info.width,
            height: info.height,
        });
        self.record(StreamEvent::MetadataLoaded);
        info!(source = %self.source.describe(), stream = %info, "Stream activated");

        self.info = Some(info.clone());
        Ok(info)
    }

    /// Check for the first frame
    ///
    /// Returns true once playback has started.
    pub fn poll_playback(&mut self) -> VelvetResult<bool> {
        if self.is_playing() {
            return Ok(true);
        }
        if !self.is_active() {
            return Ok(false);
        }
        if let Some(frame) = self.source.next_frame()? {
            self.last_frame = Some(frame);
            self.record(StreamEvent::PlaybackStarted);
        }
        Ok(self.is_playing())
    }

    /// The frame currently shown by the stream
    ///
    /// When the source has nothing new the previous frame is returned again.
    pub fn current_frame(&mut self) -> VelvetResult<Option<&Frame>> {
        if self.is_active()
            && let Some(frame) = self.source.next_frame()?
        {
            if self.last_frame.is_none() {
                self.record(StreamEvent::PlaybackStarted);
            }
            self.last_frame = Some(frame);
        }
        Ok(self.last_frame.as_ref())
    }

    /// Terminate every track of the stream. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.info.take().is_some() {
            info!(source = %self.source.describe(), "Stream stopped");
        }
        self.source.stop();
        self.last_frame = None;
    }

    pub fn is_active(&self) -> bool {
        self.info.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.is_active() && self.last_frame.is_some()
    }

    pub fn info(&self) -> Option<&StreamInfo> {
        self.info.as_ref()
    }

    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    fn record(&mut self, event: StreamEvent) {
        debug!(event = ?event, "Stream event");
        self.events.push(event);
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("source", &self.source.describe())
            .field("info", &self.info)
            .field("playing", &self.is_playing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::PatternSource;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that fails to open and counts stop calls
    struct FailingSource {
        error: VelvetError,
        stops: Arc<AtomicUsize>,
    }

    impl CaptureSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        fn open(&mut self, _constraints: &CaptureConstraints) -> VelvetResult<StreamInfo> {
            Err(self.error.clone())
        }

        fn next_frame(&mut self) -> VelvetResult<Option<Frame>> {
            Ok(None)
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn is_open(&self) -> bool {
            false
        }
    }

    fn pattern_session() -> CaptureSession {
        CaptureSession::new(
            Box::new(PatternSource::new()),
            CaptureConstraints { width: 2, height: 2 },
        )
    }

    #[test]
    fn test_activate_records_readiness() {
        let mut session = pattern_session();
        let info = session.activate(&KillSwitch::new()).unwrap();
        assert_eq!((info.width, info.height), (2, 2));
        assert!(session.is_active());
        assert!(!session.is_playing());
        assert_eq!(
            session.events(),
            &[
                StreamEvent::DataLoaded { width: 2, height: 2 },
                StreamEvent::MetadataLoaded
            ]
        );

        assert!(session.poll_playback().unwrap());
        assert_eq!(session.events().last(), Some(&StreamEvent::PlaybackStarted));
    }

    #[test]
    fn test_activate_when_disabled() {
        let switch = KillSwitch::new();
        switch.trip();
        let mut session = pattern_session();
        assert_eq!(session.activate(&switch), Err(VelvetError::Disabled));
        assert!(!session.is_active());
    }

    #[test]
    fn test_failed_activation_stops_source() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut session = CaptureSession::new(
            Box::new(FailingSource {
                error: VelvetError::DeviceAcquisition("permission denied".into()),
                stops: Arc::clone(&stops),
            }),
            CaptureConstraints::default(),
        );

        let err = session.activate(&KillSwitch::new()).unwrap_err();
        assert!(matches!(err, VelvetError::DeviceAcquisition(_)));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(!session.is_active());
    }

    #[test]
    fn test_current_frame_before_activation() {
        let mut session = pattern_session();
        assert!(session.current_frame().unwrap().is_none());
        assert!(!session.poll_playback().unwrap());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut session = pattern_session();
        session.activate(&KillSwitch::new()).unwrap();
        assert!(session.current_frame().unwrap().is_some());
        session.stop();
        session.stop();
        assert!(!session.is_active());
        assert!(session.current_frame().unwrap().is_none());
    }
}
