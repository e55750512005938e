use crate::assets::{DEFAULT_JOIN_URL, HEALTH_LOG_INTERVAL, SNAPSHOT_INTERVAL};
use crate::capture::{CameraSource, PatternCamera, StillImageCamera};
use crate::config::{CameraChoice, Config, DashboardConfig, Mode, StudentConfig};
use crate::pipeline::receiver::DashboardCoordinator;
use crate::pipeline::sender::FrameCaptureAgent;
use crate::pipeline::{Clock, PipelineHealth, PipelineStage, SystemClock};
use crate::telemetry::{DashboardSnapshot, TelemetryAggregator, TelemetryState};
use crate::utils::net::session::invite_link;
use crate::utils::net::{ConnectionManager, Endpoint, ParticipantId, Role};
use crate::utils::sos::SignalOfStop;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::watch;

pub mod assets;
pub mod capture;
pub mod config;
pub mod encoder;
pub mod events;
pub mod pipeline;
pub mod telemetry;
pub mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_args()?;
    let sos = SignalOfStop::new();
    let _stop_on_exit = sos.drop_guard();

    // gracefully tear both agents down on SIGINT
    let ctrl_c = sos.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            ctrl_c.cancel();
        }
    });

    match config.mode {
        Mode::Student(student) => run_student(student, &sos).await,
        Mode::Dashboard(dashboard) => run_dashboard(dashboard, &sos).await,
        Mode::Invite(invite) => {
            println!("{}", invite_link(invite.join_url.as_str(), &invite.session_id)?);
            Ok(())
        }
    }
}

async fn run_student(config: StudentConfig, sos: &SignalOfStop) -> anyhow::Result<()> {
    let participant = ParticipantId::for_role(Role::Student, &config.username);
    let endpoint = Endpoint::new(config.server.as_str(), config.session_id.as_str(), participant.clone())?;
    info!("Joining session {} as {}", endpoint.session_id(), participant);

    let camera: Box<dyn CameraSource> = match config.camera {
        CameraChoice::Pattern { width, height } => Box::new(PatternCamera::new(width, height)),
        CameraChoice::Still(path) => Box::new(StillImageCamera::new(path)),
    };

    let (connection, events) = ConnectionManager::new(sos.child()).connect(&endpoint)?;
    let health = Arc::new(PipelineHealth::new());
    let mut agent = FrameCaptureAgent::new(participant, camera, connection, events, health.clone(), sos.child());

    spawn_health_log(agent.name(), health, sos);

    let mut mood = agent.current_mood();
    sos.spawn(async move {
        while mood.changed().await.is_ok() {
            match mood.borrow_and_update().clone() {
                Some(emotion) => info!("Current mood: {}", emotion),
                None => info!("Current mood cleared"),
            }
        }
    });

    let result = agent.run().await;
    agent.shutdown().await?;
    result
}

async fn run_dashboard(config: DashboardConfig, sos: &SignalOfStop) -> anyhow::Result<()> {
    let endpoint = Endpoint::new(
        config.server.as_str(),
        config.session_id.as_str(),
        ParticipantId::teacher_dashboard(),
    )?;
    info!(
        "Dashboard for session {}, invite students with {}",
        endpoint.session_id(),
        invite_link(DEFAULT_JOIN_URL, endpoint.session_id())?
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let initial = if config.prefill_history {
        TelemetryState::with_prefilled_history(clock.now())
    } else {
        TelemetryState::new()
    };
    let health = Arc::new(PipelineHealth::new());
    let aggregator = TelemetryAggregator::with_state(initial, clock.clone(), health.clone());

    let (connection, events) = ConnectionManager::new(sos.child()).connect(&endpoint)?;
    let mut status = connection.subscribe_state();
    sos.spawn(async move {
        while status.changed().await.is_ok() {
            let state = *status.borrow_and_update();
            info!("Dashboard connection {}", state);
        }
    });

    let mut coordinator = DashboardCoordinator::new(aggregator, connection, events, sos.child());
    let state = coordinator.subscribe();

    spawn_health_log(coordinator.name(), health, sos);
    spawn_snapshot_log(state.clone(), clock.clone(), config.json, sos);

    let result = coordinator.run().await;
    coordinator.shutdown().await?;
    emit_snapshot(&DashboardSnapshot::of(&state.borrow(), clock.now()), config.json);
    result
}

fn emit_snapshot(snapshot: &DashboardSnapshot, json: bool) {
    if !json {
        info!("{}", snapshot);
        return;
    }
    match serde_json::to_string(snapshot) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to serialize snapshot: {}", e),
    }
}

fn spawn_snapshot_log(state: watch::Receiver<TelemetryState>, clock: Arc<dyn Clock>, json: bool, sos: &SignalOfStop) {
    sos.spawn(async move {
        let mut interval = tokio::time::interval(SNAPSHOT_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let snapshot = DashboardSnapshot::of(&state.borrow(), clock.now());
            emit_snapshot(&snapshot, json);
        }
    });
}

// Log health metrics periodically
fn spawn_health_log(name: &'static str, health: Arc<PipelineHealth>, sos: &SignalOfStop) {
    sos.spawn(async move {
        let mut interval = tokio::time::interval(HEALTH_LOG_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            info!("{}: {}", name, health.summary());
        }
    });
}
