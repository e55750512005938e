//! Receiver pipeline coordinator
//!
//! Single dispatch loop for the dashboard connection: every inbound message
//! goes through the aggregator, one at a time, in arrival order.

use crate::pipeline::PipelineStage;
use crate::telemetry::{TelemetryAggregator, TelemetryState};
use crate::utils::net::{Connection, ConnectionEvent};
use crate::utils::sos::SignalOfStop;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::{mpsc, watch};

/// Coordinates the receiver pipeline: Receive → Parse → Aggregate
pub struct DashboardCoordinator {
    aggregator: TelemetryAggregator,
    connection: Connection,
    events: Option<mpsc::Receiver<ConnectionEvent>>,
    sos: SignalOfStop,
}

impl DashboardCoordinator {
    pub fn new(
        aggregator: TelemetryAggregator,
        connection: Connection,
        events: mpsc::Receiver<ConnectionEvent>,
        sos: SignalOfStop,
    ) -> Self {
        Self {
            aggregator,
            connection,
            events: Some(events),
            sos,
        }
    }

    pub fn aggregator(&self) -> &TelemetryAggregator {
        &self.aggregator
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Canonical state, updated after every dispatched event.
    pub fn subscribe(&self) -> watch::Receiver<TelemetryState> {
        self.aggregator.subscribe()
    }
}

#[async_trait]
impl PipelineStage for DashboardCoordinator {
    async fn run(&mut self) -> Result<()> {
        let mut events = self
            .events
            .take()
            .ok_or_else(|| anyhow!("dashboard coordinator already ran"))?;

        loop {
            tokio::select! {
                _ = self.sos.wait_cancellation() => {
                    info!("Dashboard stopping");
                    break;
                }
                event = events.recv() => match event {
                    Some(ConnectionEvent::Opened) => info!("Dashboard connected to {}", self.connection.url()),
                    Some(ConnectionEvent::Message(text)) => {
                        self.aggregator.dispatch_raw(&text);
                    }
                    Some(ConnectionEvent::Closed(reason)) => {
                        warn!("Dashboard connection {}; no reconnection is attempted, restart to resume", reason);
                        break;
                    }
                    None => break,
                }
            }
        }

        self.connection.close();
        info!("Dashboard stopped. {}", self.aggregator.health().summary());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DashboardCoordinator"
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.connection.close();
        self.sos.cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Emotion, Mood};
    use crate::utils::net::{ConnectionManager, ConnectionState, Endpoint, ParticipantId, Role};
    use async_tungstenite::tokio::accept_async;
    use async_tungstenite::tungstenite::Message;
    use futures_util::SinkExt;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_dispatch_loop_survives_malformed_messages() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            for text in [
                r#"{"event":"student_count","data":{"count":2}}"#,
                "not json at all",
                r#"{"event":"emotion_update","data":{"participant_id":"student_a","emotion":"sad","engagement_score":50},"image":"AAAA"}"#,
                r#"{"event":"poll_started","data":{}}"#,
                r#"{"event":"new_insight","data":{"message":"Energy is dropping"}}"#,
            ] {
                ws.send(Message::text(text)).await.unwrap();
            }
            ws.send(Message::Close(None)).await.unwrap();
        });

        let sos = SignalOfStop::new();
        let endpoint = Endpoint::new(
            &format!("ws://127.0.0.1:{}/api/v1/ws", port),
            "s1",
            ParticipantId::for_role(Role::TeacherDashboard, "ignored"),
        )
        .unwrap();
        let (connection, events) = ConnectionManager::new(sos.clone()).connect(&endpoint).unwrap();
        let mut coordinator = DashboardCoordinator::new(TelemetryAggregator::new(), connection, events, sos);
        let state = coordinator.subscribe();

        timeout(Duration::from_secs(10), coordinator.run()).await.unwrap().unwrap();
        server.await.unwrap();

        let aggregator = coordinator.aggregator();
        assert_eq!(aggregator.active_students(), 2);
        assert_eq!(aggregator.smoothed_engagement(), 10.0);
        assert_eq!(aggregator.dominant_mood(), Mood::Dominant(Emotion::Sad));
        assert_eq!(aggregator.active_feeds().len(), 1);
        assert_eq!(state.borrow().insights.len(), 1);

        let summary = aggregator.health().summary();
        assert_eq!(summary.malformed_messages, 1);
        assert_eq!(summary.messages_received, 4);
        assert_eq!(coordinator.connection().state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_shutdown_closes_connection_and_stops_run() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let endpoint = Endpoint::new(
            &format!("ws://127.0.0.1:{}/api/v1/ws", port),
            "s1",
            ParticipantId::teacher_dashboard(),
        )
        .unwrap();

        let sos = SignalOfStop::new();
        let (connection, events) = ConnectionManager::new(sos.clone()).connect(&endpoint).unwrap();
        let mut coordinator = DashboardCoordinator::new(TelemetryAggregator::new(), connection, events, sos.child());

        coordinator.shutdown().await.unwrap();
        assert_eq!(coordinator.connection().state(), ConnectionState::Closed);
        timeout(Duration::from_secs(5), coordinator.run()).await.unwrap().unwrap();
        assert!(!sos.cancelled());
    }
}
