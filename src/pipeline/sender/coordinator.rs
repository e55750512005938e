//! Sender pipeline coordinator
//!
//! Owns the camera and the capture timer for one student connection, and
//! watches the inbound stream for this student's own emotion results.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::task::AbortOnDropHandle;

use crate::assets::CAPTURE_PERIOD;
use crate::capture::{CameraHandle, CameraSource, DeviceError, FrameSource};
use crate::encoder::JpegFrameEncoder;
use crate::events::TelemetryEvent;
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::sender::capture_stage::CaptureStage;
use crate::pipeline::PipelineStage;
use crate::utils::net::{Connection, ConnectionEvent, ParticipantId};
use crate::utils::sos::SignalOfStop;

type Acquisition = AbortOnDropHandle<Option<Result<Box<dyn FrameSource>, DeviceError>>>;

/// Closes the connection and stops the agent's tasks when dropped.
///
/// Held for the whole of `run()`, so a run future that is dropped before it
/// finishes releases the same resources as a normal exit.
struct Release {
    connection: Connection,
    sos: SignalOfStop,
}

impl Drop for Release {
    fn drop(&mut self) {
        self.connection.close();
        self.sos.cancel();
    }
}

/// Streams webcam frames at a fixed cadence: Acquire → (Capture → Encode → Send)*
///
/// Frames are only produced while the connection is open and the camera is
/// ready. A camera that fails to open leaves the agent running with no
/// output. The agent stops when its connection closes or its signal fires,
/// releasing the camera and closing the connection on the way out.
pub struct FrameCaptureAgent {
    participant: ParticipantId,
    camera: Option<Box<dyn CameraSource>>,
    connection: Connection,
    events: Option<mpsc::Receiver<ConnectionEvent>>,
    stage: CaptureStage,
    period: Duration,
    mood: watch::Sender<Option<String>>,
    health: Arc<PipelineHealth>,
    sos: SignalOfStop,
}

impl FrameCaptureAgent {
    /// Create a new capture agent
    pub fn new(
        participant: ParticipantId,
        camera: Box<dyn CameraSource>,
        connection: Connection,
        events: mpsc::Receiver<ConnectionEvent>,
        health: Arc<PipelineHealth>,
        sos: SignalOfStop,
    ) -> Self {
        let (mood, _) = watch::channel(None);
        Self {
            participant,
            camera: Some(camera),
            connection,
            events: Some(events),
            stage: CaptureStage::new(JpegFrameEncoder::new(), health.clone()),
            period: CAPTURE_PERIOD,
            mood,
            health,
            sos,
        }
    }

    /// Override the capture period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Get the pipeline health metrics
    pub fn health(&self) -> &Arc<PipelineHealth> {
        &self.health
    }

    /// Latest emotion the backend reported for this student.
    pub fn current_mood(&self) -> watch::Receiver<Option<String>> {
        self.mood.subscribe()
    }

    /// Last-write-wins projection of this student's own emotion updates.
    /// An own update without an emotion clears the mood.
    fn observe(&self, text: &str) {
        match TelemetryEvent::parse(text) {
            Ok(TelemetryEvent::EmotionUpdate(update)) if update.participant_id.as_ref() == Some(&self.participant) => {
                debug!("Own mood is now {:?}", update.emotion);
                self.mood.send_replace(update.emotion);
            }
            Ok(_) => {}
            Err(e) => debug!("Ignoring unreadable message: {}", e),
        }
    }

    fn start_acquisition(&mut self) -> Option<Acquisition> {
        let mut camera = self.camera.take()?;
        info!("Acquiring camera ({})", camera.describe());
        Some(AbortOnDropHandle::new(self.sos.spawn(async move { camera.acquire().await })))
    }

    fn teardown(&self, acquisition: Option<Acquisition>, camera: Option<CameraHandle>, release: Release) {
        if let Some(pending) = acquisition {
            pending.abort();
        }
        drop(camera);
        drop(release);
        info!("Capture stopped for {}. {}", self.participant, self.health.summary());
    }
}

impl Drop for FrameCaptureAgent {
    fn drop(&mut self) {
        self.connection.close();
        self.sos.cancel();
    }
}

async fn wait_acquisition(
    acquisition: &mut Option<Acquisition>,
) -> Result<Option<Result<Box<dyn FrameSource>, DeviceError>>, tokio::task::JoinError> {
    match acquisition {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl PipelineStage for FrameCaptureAgent {
    async fn run(&mut self) -> Result<()> {
        let mut events = self
            .events
            .take()
            .ok_or_else(|| anyhow!("capture agent for {} already ran", self.participant))?;

        let release = Release {
            connection: self.connection.clone(),
            sos: self.sos.clone(),
        };
        let mut acquisition = self.start_acquisition();
        let mut camera: Option<CameraHandle> = None;

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Capturing every {:?} as {}", self.period, self.participant);

        loop {
            tokio::select! {
                _ = self.sos.wait_cancellation() => {
                    info!("Capture agent for {} stopping", self.participant);
                    break;
                }
                joined = wait_acquisition(&mut acquisition), if acquisition.is_some() => {
                    acquisition = None;
                    match joined {
                        Ok(Some(Ok(source))) => {
                            let handle = CameraHandle::new(source);
                            let (w, h) = handle.resolution();
                            info!("Camera ready at {}x{}", w, h);
                            camera = Some(handle);
                        }
                        Ok(Some(Err(e))) => error!("Camera unavailable, no frames will be sent: {}", e),
                        Ok(None) => {}
                        Err(e) => error!("Camera acquisition task failed: {}", e),
                    }
                }
                _ = ticker.tick() => {
                    let source = camera.as_mut().map(|c| c.source_mut());
                    let outcome = self.stage.tick(source, &self.connection);
                    debug!("Tick: {}", outcome);
                }
                event = events.recv() => match event {
                    Some(ConnectionEvent::Opened) => info!("Streaming frames as {}", self.participant),
                    Some(ConnectionEvent::Message(text)) => self.observe(&text),
                    Some(ConnectionEvent::Closed(reason)) => {
                        warn!("Connection {}, capture for {} ends here", reason, self.participant);
                        break;
                    }
                    None => break,
                }
            }
        }

        self.teardown(acquisition, camera, release);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "FrameCaptureAgent"
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.connection.close();
        self.sos.cancel();
        Ok(())
    }
}
