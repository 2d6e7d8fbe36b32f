use kameo::actor::ActorRef;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use crate::actors::core::{actor_rng, WorkerPhase};
use crate::actors::infrastructure::{report_phase, ActivityMonitor};
use crate::config::{random_delay, OfficeConfig, MAX_SERVICE_TIME_MS};
use crate::error::Result;
use crate::models::{ActorId, Event, ServiceType};
use crate::office::{wait_for_activity, PostOffice, QueueCheck};
use crate::utils::Backoff;

// ============================================================================
// Worker Actor
// ============================================================================
//
// Loop:
//   CheckingQueues -> Breaking -> CheckingQueues
//                  -> Selecting -> Dequeued -> Signaled -> AwaitingReady
//                     -> Serving -> AwaitingDeparture -> CheckingQueues
//                  -> WentHome
//
// A worker leaves only after seeing `closed` with every queue empty under
// the closing guard; no customer can be admitted after that point.
//
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerOutcome {
    pub services: usize,
    pub breaks: usize,
    pub benign_races: usize,
}

pub struct WorkerActor {
    id: u32,
    max_break: Duration,
    rng: StdRng,
    backoff: Backoff,
    outcome: WorkerOutcome,
    office: Arc<PostOffice>,
    monitor: ActorRef<ActivityMonitor>,
}

impl WorkerActor {
    pub fn new(
        id: u32,
        config: &OfficeConfig,
        office: Arc<PostOffice>,
        monitor: ActorRef<ActivityMonitor>,
    ) -> Self {
        Self {
            id,
            max_break: config.worker_max_break(),
            rng: actor_rng(config.seed, ActorId::Worker(id)),
            backoff: Backoff::default(),
            outcome: WorkerOutcome::default(),
            office,
            monitor,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        ActorId::Worker(self.id)
    }

    async fn transition(&self, phase: WorkerPhase) {
        tracing::trace!(worker = self.id, phase = ?phase, "Worker transition");
        report_phase(&self.monitor, self.actor_id(), phase).await;
    }

    pub async fn run(mut self) -> Result<WorkerOutcome> {
        self.transition(WorkerPhase::Started).await;
        self.office.transcript().log(Event::WorkerStarted(self.id)).await?;

        self.work().await?;
        Ok(self.outcome)
    }

    async fn work(&mut self) -> Result<()> {
        loop {
            self.transition(WorkerPhase::CheckingQueues).await;
            match self.office.check_queues(self.id).await? {
                QueueCheck::GoHome => {
                    self.transition(WorkerPhase::WentHome).await;
                    tracing::debug!(
                        worker = self.id,
                        services = self.outcome.services,
                        "Worker going home"
                    );
                    return Ok(());
                }
                QueueCheck::Idle(mut activity) => {
                    self.transition(WorkerPhase::Breaking).await;
                    self.outcome.breaks += 1;

                    tokio::time::sleep(random_delay(&mut self.rng, self.max_break)).await;
                    // Nothing changed since the check means nothing to do yet
                    wait_for_activity(&mut activity).await?;

                    self.office.transcript().log(Event::WorkerBreakFinished(self.id)).await?;
                    continue;
                }
                QueueCheck::Pending => {}
            }

            let Some(service) = self.pick_up().await else {
                continue;
            };

            self.serve(service).await?;
            self.outcome.services += 1;
        }
    }

    /// Take a waiting customer. `None` means another worker got there first
    /// and the caller goes back to checking the queues.
    async fn pick_up(&mut self) -> Option<ServiceType> {
        self.transition(WorkerPhase::Selecting).await;
        match self.office.dequeue(&mut self.rng).await {
            Some(service) => {
                self.backoff.reset();
                Some(service)
            }
            None => {
                self.outcome.benign_races += 1;
                self.office.metrics().benign_races.inc();
                tracing::trace!(worker = self.id, "Queues drained before pickup, rechecking");
                self.backoff.wait().await;
                None
            }
        }
    }

    async fn serve(&mut self, service: ServiceType) -> Result<()> {
        let started = Instant::now();
        let channel = self.office.channel(service);

        self.transition(WorkerPhase::Dequeued(service)).await;
        channel.call_customer();
        self.transition(WorkerPhase::Signaled(service)).await;

        self.transition(WorkerPhase::AwaitingReady(service)).await;
        channel.await_ready().await?;

        self.transition(WorkerPhase::Serving(service)).await;
        self.office
            .transcript()
            .log(Event::WorkerServing { worker: self.id, service })
            .await?;
        let service_time = random_delay(&mut self.rng, Duration::from_millis(MAX_SERVICE_TIME_MS));
        tokio::time::sleep(service_time).await;

        self.transition(WorkerPhase::AwaitingDeparture(service)).await;
        self.office.transcript().log(Event::WorkerServiceFinished(self.id)).await?;
        channel.await_departure().await?;

        self.office
            .metrics()
            .record_service(service, started.elapsed().as_secs_f64());
        Ok(())
    }
}
