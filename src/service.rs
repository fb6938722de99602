//! Decision service
//!
//! Boundary entry point: simulate, derive metrics, then optionally hand the
//! context to the orchestrator. Transports (the HTTP API, the demo binary)
//! only talk to this type.

use crate::agents::{AgentAnalysis, AgentCapability, AgentContext};
use crate::metrics::{self, HistoricalMetrics};
use crate::models::{FinancialAction, UserProfile};
use crate::orchestrator::{OrchestrationEvent, OrchestrationResult, Orchestrator, Stage};
use crate::simulation::{SimulationEngine, SimulationResult};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

const STREAM_BUFFER: usize = 32;

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub simulation: SimulationResult,
    pub historical_metrics: HistoricalMetrics,
    pub analysis: Option<OrchestrationResult>,
}

/// Event delivered to streaming clients; the payload carries no tag, the
/// name comes from [`StreamEvent::event_name`]
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Status {
        #[serde(skip_serializing_if = "Option::is_none")]
        run_id: Option<Uuid>,
        stage: Stage,
    },
    Simulation {
        result: SimulationResult,
        elapsed: u64,
    },
    Agent {
        agent: AgentCapability,
        result: AgentAnalysis,
        elapsed: u64,
    },
    Complete(Box<OrchestrationResult>),
    Error {
        reason: String,
    },
}

impl StreamEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamEvent::Status { .. } => "status",
            StreamEvent::Simulation { .. } => "simulation",
            StreamEvent::Agent { .. } => "agent",
            StreamEvent::Complete(_) => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete(_) | StreamEvent::Error { .. })
    }
}

impl From<OrchestrationEvent> for StreamEvent {
    fn from(event: OrchestrationEvent) -> Self {
        match event {
            OrchestrationEvent::Status { run_id, stage } => StreamEvent::Status {
                run_id: Some(run_id),
                stage,
            },
            OrchestrationEvent::AgentCompleted {
                agent,
                result,
                elapsed,
                ..
            } => StreamEvent::Agent {
                agent,
                result,
                elapsed,
            },
            OrchestrationEvent::Complete { result } => StreamEvent::Complete(result),
            OrchestrationEvent::Error { reason, .. } => StreamEvent::Error { reason },
        }
    }
}

pub struct DecisionService {
    engine: SimulationEngine,
    orchestrator: Orchestrator,
}

impl DecisionService {
    pub fn new(engine: SimulationEngine, orchestrator: Orchestrator) -> Self {
        Self {
            engine,
            orchestrator,
        }
    }

    pub fn agent_set(&self) -> &str {
        self.orchestrator.agent_set()
    }

    pub async fn evaluate(
        &self,
        user: &UserProfile,
        action: &FinancialAction,
        evaluate_with_agents: bool,
    ) -> Result<Evaluation> {
        let (simulation, historical_metrics) = self.prepare(user, action)?;

        if !evaluate_with_agents {
            return Ok(Evaluation {
                simulation,
                historical_metrics,
                analysis: None,
            });
        }

        let ctx = AgentContext {
            user: user.clone(),
            action: action.clone(),
            simulation_result: simulation.clone(),
            historical_metrics: historical_metrics.clone(),
        };
        let analysis = self.orchestrator.run(&ctx).await?;

        Ok(Evaluation {
            simulation,
            historical_metrics,
            analysis: Some(analysis),
        })
    }

    /// Simulations only, one per action, against the same starting profile
    pub fn compare(
        &self,
        user: &UserProfile,
        actions: &[FinancialAction],
    ) -> Result<Vec<SimulationResult>> {
        info!(actions = actions.len(), "Comparing actions");
        self.engine.compare(user, actions)
    }

    pub fn evaluate_streaming(
        self: Arc<Self>,
        user: UserProfile,
        action: FinancialAction,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            self.stream(user, action, tx).await;
        });

        rx
    }

    async fn stream(&self, user: UserProfile, action: FinancialAction, tx: mpsc::Sender<StreamEvent>) {
        send(&tx, StreamEvent::Status {
            run_id: None,
            stage: Stage::Simulation,
        })
        .await;

        let started = Instant::now();
        let simulation_result = match self.engine.simulate(&user, &action) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Simulation rejected");
                send(&tx, StreamEvent::Error {
                    reason: e.to_string(),
                })
                .await;
                return;
            }
        };

        send(&tx, StreamEvent::Simulation {
            result: simulation_result.clone(),
            elapsed: started.elapsed().as_millis() as u64,
        })
        .await;

        send(&tx, StreamEvent::Status {
            run_id: None,
            stage: Stage::Metrics,
        })
        .await;

        let ctx = AgentContext {
            historical_metrics: metrics::calculate(&user),
            user,
            action,
            simulation_result,
        };

        let (inner_tx, mut inner_rx) = mpsc::channel::<OrchestrationEvent>(STREAM_BUFFER);
        let forward = async {
            while let Some(event) = inner_rx.recv().await {
                send(&tx, event.into()).await;
            }
        };

        tokio::join!(self.orchestrator.run_streaming(&ctx, inner_tx), forward);
    }

    fn prepare(
        &self,
        user: &UserProfile,
        action: &FinancialAction,
    ) -> Result<(SimulationResult, HistoricalMetrics)> {
        let simulation = self.engine.simulate(user, action)?;
        let historical_metrics = metrics::calculate(user);

        info!(
            action = %action.kind(),
            amount = action.amount(),
            months_of_data = historical_metrics.months_of_data,
            "Simulation complete"
        );

        Ok((simulation, historical_metrics))
    }
}

async fn send(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) {
    if tx.send(event).await.is_err() {
        warn!("Stream client went away");
    }
}
