use kameo::Actor;
use kameo::message::{Context, Message};
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::reply::{Reply, ReplyError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use crate::actors::core::{CustomerPhase, Phase, WorkerPhase};
use crate::models::{ActorId, ServiceType};

// ============================================================================
// Activity Monitor Actor - Tracks every actor's state machine
// ============================================================================
//
// Responsibilities:
// - Record the latest phase of every customer and worker
// - Classify finished customers as served or turned away
// - Count completed services per worker
// - List actors that never reached a terminal phase
//
// ============================================================================

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug)]
pub struct PhaseChanged {
    pub actor: ActorId,
    pub phase: Phase,
}

#[derive(Debug)]
pub struct GetActivity;

/// Last known state of one actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorActivity {
    pub actor: ActorId,
    pub phase: Phase,
    pub service: Option<ServiceType>,
    pub transitions: u32,
    pub last_change: DateTime<Utc>,
    pub served: bool,
    pub turned_away: bool,
    pub services_completed: usize,
}

impl ActorActivity {
    fn new(actor: ActorId, phase: Phase) -> Self {
        Self {
            actor,
            phase,
            service: None,
            transitions: 0,
            last_change: Utc::now(),
            served: false,
            turned_away: false,
            services_completed: 0,
        }
    }

    fn record(&mut self, phase: Phase) {
        self.phase = phase;
        self.transitions += 1;
        self.last_change = Utc::now();
        if let Some(service) = phase.service() {
            self.service = Some(service);
        }

        match phase {
            Phase::Customer(CustomerPhase::WentHomeClosed) => self.turned_away = true,
            Phase::Customer(CustomerPhase::SignaledDone(_)) => self.served = true,
            Phase::Worker(WorkerPhase::AwaitingDeparture(_)) => self.services_completed += 1,
            _ => {}
        }
    }
}

/// Aggregated view of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub customers_started: usize,
    pub customers_served: usize,
    pub customers_served_by_service: BTreeMap<String, usize>,
    pub customers_turned_away: usize,
    pub workers_started: usize,
    pub workers_gone_home: usize,
    pub services_by_worker: BTreeMap<u32, usize>,
    /// Actors that have not reached a terminal phase, with their last phase
    pub unfinished: Vec<(ActorId, Phase)>,
}

impl ActivityReport {
    pub fn all_finished(&self) -> bool {
        self.unfinished.is_empty()
    }
}

// Implement Reply for ActivityReport to use it as a message reply type
impl Reply for ActivityReport {
    type Ok = Self;
    type Error = Infallible;
    type Value = Self;

    fn to_result(self) -> Result<Self, Infallible> {
        Ok(self)
    }

    fn into_any_err(self) -> Option<Box<dyn ReplyError>> {
        None
    }

    fn into_value(self) -> Self::Value {
        self
    }
}

// ============================================================================
// Activity Monitor Actor
// ============================================================================

#[derive(Default)]
pub struct ActivityMonitor {
    actors: HashMap<ActorId, ActorActivity>,
}

impl ActivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn compute_report(&self) -> ActivityReport {
        let mut report = ActivityReport::default();

        for activity in self.actors.values() {
            match activity.actor {
                ActorId::Customer(_) => {
                    report.customers_started += 1;
                    if activity.served {
                        report.customers_served += 1;
                        if let Some(service) = activity.service {
                            *report
                                .customers_served_by_service
                                .entry(service.label().to_string())
                                .or_default() += 1;
                        }
                    }
                    if activity.turned_away {
                        report.customers_turned_away += 1;
                    }
                }
                ActorId::Worker(id) => {
                    report.workers_started += 1;
                    if activity.phase.is_terminal() {
                        report.workers_gone_home += 1;
                    }
                    report
                        .services_by_worker
                        .insert(id, activity.services_completed);
                }
            }

            if !activity.phase.is_terminal() {
                report.unfinished.push((activity.actor, activity.phase));
            }
        }

        report.unfinished.sort_by_key(|(actor, _)| *actor);
        report
    }
}

impl Actor for ActivityMonitor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(
        state: Self::Args,
        _actor_ref: ActorRef<Self>
    ) -> Result<Self, Self::Error> {
        tracing::debug!("ActivityMonitor started");
        Ok(state)
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<PhaseChanged> for ActivityMonitor {
    type Reply = ();

    async fn handle(&mut self, msg: PhaseChanged, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        tracing::trace!(
            actor = %msg.actor,
            phase = ?msg.phase,
            "Actor phase changed"
        );

        self.actors
            .entry(msg.actor)
            .or_insert_with(|| ActorActivity::new(msg.actor, msg.phase))
            .record(msg.phase);
    }
}

impl Message<GetActivity> for ActivityMonitor {
    type Reply = ActivityReport;

    async fn handle(&mut self, _msg: GetActivity, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.compute_report()
    }
}

/// Publish a phase change, fire and forget
pub async fn report_phase(monitor: &ActorRef<ActivityMonitor>, actor: ActorId, phase: impl Into<Phase>) {
    let phase = phase.into();
    if let Err(e) = monitor.tell(PhaseChanged { actor, phase }).await {
        tracing::warn!(actor = %actor, phase = ?phase, error = %e, "Failed to report phase");
    }
}
