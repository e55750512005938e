//! Capture stage for the sender pipeline
//!
//! One tick grabs the current camera frame, encodes it and hands it to the
//! connection. Nothing is buffered between ticks and missed ticks are never
//! caught up.

use crate::capture::FrameSource;
use crate::encoder::JpegFrameEncoder;
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::types::TickOutcome;
use crate::utils::net::{FrameSink, Outbound, SendOutcome};
use log::warn;
use std::sync::Arc;

pub struct CaptureStage {
    encoder: JpegFrameEncoder,
    health: Arc<PipelineHealth>,
}

impl CaptureStage {
    pub fn new(encoder: JpegFrameEncoder, health: Arc<PipelineHealth>) -> Self {
        Self { encoder, health }
    }

    pub fn health(&self) -> &Arc<PipelineHealth> {
        &self.health
    }

    /// Runs one capture → encode → send cycle.
    pub fn tick<S: FrameSink>(&self, camera: Option<&mut dyn FrameSource>, sink: &S) -> TickOutcome {
        if !sink.is_open() {
            self.health.record_skip_not_open();
            return TickOutcome::NotOpen;
        }

        let Some(frame) = camera.filter(|c| c.is_ready()).and_then(|c| c.grab()) else {
            self.health.record_skip_no_camera();
            return TickOutcome::CameraNotReady;
        };
        let (width, height) = frame.dimensions();

        let jpeg = match self.encoder.encode(&frame) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!("Dropping {}x{} frame: {}", width, height, e);
                self.health.record_encode_failure();
                return TickOutcome::EncodeFailed;
            }
        };

        let bytes = jpeg.len();
        match sink.send(Outbound::Binary(jpeg)) {
            SendOutcome::NotOpen => {
                self.health.record_skip_not_open();
                TickOutcome::NotOpen
            }
            outcome => {
                if outcome == SendOutcome::Superseded {
                    self.health.record_frame_superseded();
                }
                self.health.record_frame_sent(bytes);
                TickOutcome::Sent { bytes, width, height }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CameraSource, PatternCamera};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        open: bool,
        sent: Mutex<Vec<Outbound>>,
    }

    impl RecordingSink {
        fn open() -> Self {
            Self {
                open: true,
                ..Default::default()
            }
        }
    }

    impl FrameSink for RecordingSink {
        fn is_open(&self) -> bool {
            self.open
        }

        fn send(&self, message: Outbound) -> SendOutcome {
            let mut sent = self.sent.lock().unwrap();
            sent.push(message);
            if sent.len() > 1 { SendOutcome::Superseded } else { SendOutcome::Queued }
        }
    }

    fn stage() -> CaptureStage {
        CaptureStage::new(JpegFrameEncoder::new(), Arc::new(PipelineHealth::new()))
    }

    #[tokio::test]
    async fn test_tick_sends_one_jpeg_at_native_resolution() {
        let stage = stage();
        let sink = RecordingSink::open();
        let mut camera = PatternCamera::new(32, 24).acquire().await.unwrap();

        let outcome = stage.tick(Some(camera.as_mut()), &sink);
        match outcome {
            TickOutcome::Sent { width, height, bytes } => {
                assert_eq!((width, height), (32, 24));
                assert!(bytes > 0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Outbound::Binary(b) => assert_eq!(&b[..2], &[0xFF, 0xD8]),
            other => panic!("expected binary frame, got {:?}", other),
        }
        assert_eq!(stage.health().summary().frames_sent, 1);
    }

    #[tokio::test]
    async fn test_tick_skips_when_not_open() {
        let stage = stage();
        let sink = RecordingSink::default();
        let mut camera = PatternCamera::new(32, 24).acquire().await.unwrap();

        assert_eq!(stage.tick(Some(camera.as_mut()), &sink), TickOutcome::NotOpen);
        assert!(sink.sent.lock().unwrap().is_empty());
        assert_eq!(stage.health().summary().frames_dropped, 1);
    }

    #[tokio::test]
    async fn test_tick_skips_without_ready_camera() {
        let stage = stage();
        let sink = RecordingSink::open();
        assert_eq!(stage.tick(None, &sink), TickOutcome::CameraNotReady);

        let mut camera = PatternCamera::new(32, 24).acquire().await.unwrap();
        camera.release();
        assert_eq!(stage.tick(Some(camera.as_mut()), &sink), TickOutcome::CameraNotReady);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_superseded_frames_are_counted() {
        let stage = stage();
        let sink = RecordingSink::open();
        let mut camera = PatternCamera::new(16, 16).acquire().await.unwrap();

        assert!(stage.tick(Some(camera.as_mut()), &sink).is_sent());
        assert!(stage.tick(Some(camera.as_mut()), &sink).is_sent());

        let summary = stage.health().summary();
        assert_eq!(summary.frames_sent, 2);
        assert_eq!(summary.frames_superseded, 1);
    }
}
