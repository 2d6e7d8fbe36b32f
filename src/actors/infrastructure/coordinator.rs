use kameo::actor::ActorRef;
use kameo::Actor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;
use crate::actors::core::coordinator_rng;
use crate::actors::customer::{CustomerActor, CustomerOutcome};
use crate::actors::worker::{WorkerActor, WorkerOutcome};
use crate::config::OfficeConfig;
use crate::error::{OfficeError, Result};
use crate::metrics::Metrics;
use crate::models::SERVICE_TYPE_COUNT;
use crate::office::PostOffice;
use crate::transcript::Transcript;
use super::{ActivityMonitor, ActivityReport, GetActivity};

// ============================================================================
// Office Coordinator - Runs one simulation from opening to last actor
// ============================================================================
//
// Responsibilities:
// - Builds the shared office, metrics and activity monitor
// - Spawns workers first, then customers
// - Closes the office after a randomized delay
// - Waits for every actor to finish
// - Tears the run down when any actor fails
//
// Task Hierarchy:
//   OfficeCoordinator
//   ├── ActivityMonitor (kameo)
//   ├── WorkerActor x NU
//   └── CustomerActor x NZ
//
// ============================================================================

enum ActorOutcome {
    Customer(u32, CustomerOutcome),
    Worker(u32, WorkerOutcome),
}

/// Result of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config: OfficeConfig,
    pub close_delay_ms: u64,
    pub transcript_lines: u64,
    pub final_queue_lengths: [usize; SERVICE_TYPE_COUNT],
    pub activity: ActivityReport,
}

pub struct OfficeCoordinator {
    config: OfficeConfig,
    office: Arc<PostOffice>,
    metrics: Arc<Metrics>,
    run_id: Uuid,
}

impl OfficeCoordinator {
    pub fn new(config: OfficeConfig, transcript: Arc<Transcript>) -> Result<Self> {
        let metrics = Arc::new(Metrics::new()?);
        let office = Arc::new(PostOffice::new(transcript, metrics.clone()));
        Ok(Self {
            config,
            office,
            metrics,
            run_id: Uuid::new_v4(),
        })
    }

    pub fn office(&self) -> &Arc<PostOffice> {
        &self.office
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub async fn run(self) -> Result<RunSummary> {
        let span = tracing::info_span!("office", run_id = %self.run_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> Result<RunSummary> {
        let started_at = Utc::now();
        tracing::info!(
            customers = self.config.customers,
            workers = self.config.workers,
            seed = self.config.seed,
            "Office opening"
        );

        let monitor = ActivityMonitor::spawn(ActivityMonitor::new());
        let mut actors = JoinSet::new();

        let mut rng = coordinator_rng(self.config.seed);
        let close_delay = self.config.close_delay(&mut rng);
        tracing::debug!(close_delay_ms = close_delay.as_millis() as u64, "Close scheduled");

        if close_delay.is_zero() {
            // No opening window: the door is shut before any actor can be polled
            if let Err(e) = self.close_office().await {
                return Err(self.abort(e, &monitor, &mut actors).await);
            }
            self.spawn_actors(&monitor, &mut actors);
        } else {
            self.spawn_actors(&monitor, &mut actors);
            if let Err(e) = self.stay_open(close_delay, &mut actors).await {
                return Err(self.abort(e, &monitor, &mut actors).await);
            }
            if let Err(e) = self.close_office().await {
                return Err(self.abort(e, &monitor, &mut actors).await);
            }
        }

        while let Some(joined) = actors.join_next().await {
            if let Err(e) = Self::settle(joined) {
                return Err(self.abort(e, &monitor, &mut actors).await);
            }
        }

        let activity = monitor
            .ask(GetActivity)
            .await
            .map_err(|e| OfficeError::Monitor(e.to_string()))?;
        if let Err(e) = monitor.stop_gracefully().await {
            tracing::warn!(error = %e, "Activity monitor did not stop cleanly");
        }

        let summary = RunSummary {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            config: self.config.clone(),
            close_delay_ms: u64::try_from(close_delay.as_millis()).unwrap_or(u64::MAX),
            transcript_lines: self.office.transcript().len().await,
            final_queue_lengths: self.office.queue_lengths().await,
            activity,
        };

        tracing::info!(
            served = summary.activity.customers_served,
            turned_away = summary.activity.customers_turned_away,
            lines = summary.transcript_lines,
            "All actors finished"
        );
        Ok(summary)
    }

    async fn close_office(&self) -> Result<()> {
        self.office.close().await?;
        tracing::info!("Office closed to new customers");
        Ok(())
    }

    fn spawn_actors(
        &self,
        monitor: &ActorRef<ActivityMonitor>,
        actors: &mut JoinSet<Result<ActorOutcome>>,
    ) {
        for id in 1..=self.config.workers {
            let worker = WorkerActor::new(id, &self.config, self.office.clone(), monitor.clone());
            let span = tracing::debug_span!("worker", id);
            actors.spawn(
                async move { worker.run().await.map(|outcome| ActorOutcome::Worker(id, outcome)) }
                    .instrument(span),
            );
        }

        for id in 1..=self.config.customers {
            let customer = CustomerActor::new(id, &self.config, self.office.clone(), monitor.clone());
            let span = tracing::debug_span!("customer", id);
            actors.spawn(
                async move {
                    customer
                        .run()
                        .await
                        .map(|outcome| ActorOutcome::Customer(id, outcome))
                }
                .instrument(span),
            );
        }

        tracing::debug!(spawned = actors.len(), "Actors spawned");
    }

    /// Keep the office open for `delay`, reaping actors that finish early
    async fn stay_open(
        &self,
        delay: Duration,
        actors: &mut JoinSet<Result<ActorOutcome>>,
    ) -> Result<()> {
        let deadline = tokio::time::sleep(delay);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return Ok(()),
                Some(joined) = actors.join_next() => Self::settle(joined)?,
            }
        }
    }

    fn settle(joined: std::result::Result<Result<ActorOutcome>, tokio::task::JoinError>) -> Result<()> {
        match joined?? {
            ActorOutcome::Customer(id, outcome) => {
                tracing::trace!(customer = id, outcome = ?outcome, "Customer finished");
            }
            ActorOutcome::Worker(id, outcome) => {
                tracing::trace!(
                    worker = id,
                    services = outcome.services,
                    breaks = outcome.breaks,
                    benign_races = outcome.benign_races,
                    "Worker finished"
                );
            }
        }
        Ok(())
    }

    /// Fatal path: report who was stuck, release every waiter, stop all tasks
    async fn abort(
        &self,
        error: OfficeError,
        monitor: &ActorRef<ActivityMonitor>,
        actors: &mut JoinSet<Result<ActorOutcome>>,
    ) -> OfficeError {
        tracing::error!(error = %error, "Simulation failed, shutting down");

        match monitor.ask(GetActivity).await {
            Ok(report) => {
                for (actor, phase) in &report.unfinished {
                    tracing::warn!(actor = %actor, phase = ?phase, "Actor unfinished at shutdown");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not query activity monitor"),
        }

        self.office.close_channels();
        actors.shutdown().await;
        if let Err(e) = monitor.stop_gracefully().await {
            tracing::warn!(error = %e, "Activity monitor did not stop cleanly");
        }
        error
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActorId, Event, ServiceType};
    use crate::transcript::TranscriptEntry;
    use std::collections::HashMap;

    const TIMEOUT: Duration = Duration::from_secs(600);

    async fn simulate(config: OfficeConfig) -> (RunSummary, Vec<TranscriptEntry>) {
        let transcript = Arc::new(Transcript::in_memory());
        let coordinator = OfficeCoordinator::new(config, transcript.clone()).unwrap();
        let summary = tokio::time::timeout(TIMEOUT, coordinator.run())
            .await
            .expect("simulation hung")
            .unwrap();
        (summary, transcript.entries().await)
    }

    /// Ids of customers and workers a config will spawn, workers first
    fn actor_ids(config: &OfficeConfig) -> Vec<ActorId> {
        (1..=config.workers)
            .map(ActorId::Worker)
            .chain((1..=config.customers).map(ActorId::Customer))
            .collect()
    }

    fn lines_of(entries: &[TranscriptEntry], actor: ActorId) -> Vec<Event> {
        entries
            .iter()
            .filter(|e| e.event.actor() == Some(actor))
            .map(|e| e.event)
            .collect()
    }

    fn closing_seq(entries: &[TranscriptEntry]) -> u64 {
        let closings: Vec<u64> = entries
            .iter()
            .filter(|e| e.event == Event::Closing)
            .map(|e| e.seq)
            .collect();
        assert_eq!(closings.len(), 1, "closing must be logged exactly once");
        closings[0]
    }

    /// Invariants every run must satisfy, regardless of timing
    fn assert_consistent(summary: &RunSummary, entries: &[TranscriptEntry]) {
        assert_eq!(summary.final_queue_lengths, [0, 0, 0]);
        assert_eq!(summary.transcript_lines, entries.len() as u64);
        assert!(summary.activity.all_finished());

        // Sequence numbers are dense and strictly increasing
        for (index, entry) in entries.iter().enumerate() {
            assert_eq!(entry.seq, index as u64 + 1);
        }

        let closing = closing_seq(entries);

        for actor in actor_ids(&summary.config) {
            let events = lines_of(entries, actor);
            match actor {
                ActorId::Customer(id) => {
                    assert_eq!(events.first(), Some(&Event::CustomerStarted(id)));
                    assert_eq!(events.last(), Some(&Event::CustomerGoingHome(id)));

                    let called = events.iter().filter(|e| **e == Event::CustomerCalled(id)).count();
                    let entering = events
                        .iter()
                        .filter(|e| matches!(e, Event::CustomerEntering { .. }))
                        .count();
                    assert!(called <= 1, "customer {} called twice", id);
                    assert_eq!(called, entering, "customer {} entered but was never called", id);

                    if entering == 1 {
                        assert_eq!(events.len(), 4);
                    } else {
                        assert_eq!(events.len(), 2);
                    }
                }
                ActorId::Worker(id) => {
                    assert_eq!(events.first(), Some(&Event::WorkerStarted(id)));
                    assert_eq!(events.last(), Some(&Event::WorkerGoingHome(id)));

                    // serving / service finished alternate, breaks pair up
                    let mut serving = false;
                    let mut on_break = false;
                    for event in &events {
                        match event {
                            Event::WorkerServing { .. } => {
                                assert!(!serving && !on_break);
                                serving = true;
                            }
                            Event::WorkerServiceFinished(_) => {
                                assert!(serving, "worker {} finished without serving", id);
                                serving = false;
                            }
                            Event::WorkerTakingBreak(_) => {
                                assert!(!serving && !on_break);
                                on_break = true;
                            }
                            Event::WorkerBreakFinished(_) => {
                                assert!(on_break);
                                on_break = false;
                            }
                            _ => {}
                        }
                    }
                    assert!(!serving && !on_break);
                }
            }
        }

        // Every admission precedes closing; nobody is admitted afterwards
        for entry in entries {
            if matches!(entry.event, Event::CustomerEntering { .. }) {
                assert!(entry.seq < closing);
            }
        }

        let served: usize = entries
            .iter()
            .filter(|e| matches!(e.event, Event::WorkerServing { .. }))
            .count();
        let admitted = entries
            .iter()
            .filter(|e| matches!(e.event, Event::CustomerEntering { .. }))
            .count();
        assert_eq!(served, admitted);
        assert_eq!(summary.activity.customers_served, admitted);
        assert_eq!(
            summary.activity.customers_served + summary.activity.customers_turned_away,
            summary.config.customers as usize
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_worker_no_customers_goes_home() {
        let config = OfficeConfig::new(0, 1, 0, 0, 0).unwrap().with_seed(1);
        let (summary, entries) = simulate(config).await;

        assert_consistent(&summary, &entries);
        assert_eq!(
            lines_of(&entries, ActorId::Worker(1)),
            vec![Event::WorkerStarted(1), Event::WorkerGoingHome(1)]
        );
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].event, Event::Closing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_zero_window_closes_before_actors_on_multi_thread_runtime() {
        for seed in 0..50 {
            let config = OfficeConfig::new(0, 1, 0, 0, 0).unwrap().with_seed(seed);
            let (summary, entries) = simulate(config).await;

            assert_consistent(&summary, &entries);
            assert_eq!(entries[0].event, Event::Closing);
            assert_eq!(
                lines_of(&entries, ActorId::Worker(1)),
                vec![Event::WorkerStarted(1), Event::WorkerGoingHome(1)]
            );
        }

        let config = OfficeConfig::new(30, 4, 0, 0, 0).unwrap().with_seed(8);
        let (summary, entries) = simulate(config).await;
        assert_consistent(&summary, &entries);
        assert_eq!(summary.activity.customers_turned_away, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_customer_is_served() {
        let config = OfficeConfig::new(1, 1, 0, 0, 10_000).unwrap().with_seed(2);
        let (summary, entries) = simulate(config).await;

        assert_consistent(&summary, &entries);
        assert_eq!(summary.activity.customers_served, 1);
        assert!(summary.close_delay_ms >= 5_000);

        let customer = lines_of(&entries, ActorId::Customer(1));
        let Some(Event::CustomerEntering { service, .. }) = customer.get(1).copied() else {
            panic!("customer was not admitted: {:?}", customer);
        };
        assert_eq!(
            customer,
            vec![
                Event::CustomerStarted(1),
                Event::CustomerEntering { customer: 1, service },
                Event::CustomerCalled(1),
                Event::CustomerGoingHome(1),
            ]
        );

        let seq_of = |event: Event| entries.iter().find(|e| e.event == event).map(|e| e.seq);
        let entering = seq_of(Event::CustomerEntering { customer: 1, service }).unwrap();
        let serving = seq_of(Event::WorkerServing { worker: 1, service }).unwrap();
        let finished = seq_of(Event::WorkerServiceFinished(1)).unwrap();
        assert!(serving > entering);
        assert!(finished > serving);
        assert!(closing_seq(&entries) > finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_zero_parameters_close_immediately() {
        let config = OfficeConfig::new(20, 3, 0, 0, 0).unwrap().with_seed(3);
        let (summary, entries) = simulate(config).await;

        assert_consistent(&summary, &entries);
        assert_eq!(summary.close_delay_ms, 0);
        // The office closed before any actor ran, so nobody got in
        assert_eq!(entries[0].event, Event::Closing);
        assert_eq!(summary.activity.customers_turned_away, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stress_thousand_customers_twenty_workers() {
        let config = OfficeConfig::new(1000, 20, 100, 10, 200).unwrap().with_seed(4);
        let (summary, entries) = simulate(config).await;

        assert_consistent(&summary, &entries);
        assert_eq!(summary.activity.workers_gone_home, 20);
        assert!(summary.activity.customers_served > 0);

        let per_worker: usize = summary.activity.services_by_worker.values().sum();
        assert_eq!(per_worker, summary.activity.customers_served);

        let by_service: usize = summary.activity.customers_served_by_service.values().sum();
        assert_eq!(by_service, summary.activity.customers_served);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_customers_are_turned_away() {
        // Customers arrive up to 10s late, the office closes within 100ms
        let config = OfficeConfig::new(200, 4, 10_000, 5, 100).unwrap().with_seed(5);
        let (summary, entries) = simulate(config).await;

        assert_consistent(&summary, &entries);
        assert!(summary.activity.customers_turned_away > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_seed_same_decisions() {
        let config = OfficeConfig::new(30, 3, 50, 5, 100).unwrap().with_seed(99);
        let (first, first_entries) = simulate(config.clone()).await;
        let (second, second_entries) = simulate(config).await;

        let services = |entries: &[TranscriptEntry]| -> HashMap<u32, ServiceType> {
            entries
                .iter()
                .filter_map(|e| match e.event {
                    Event::CustomerEntering { customer, service } => Some((customer, service)),
                    _ => None,
                })
                .collect()
        };

        assert_eq!(first.close_delay_ms, second.close_delay_ms);
        assert_eq!(services(&first_entries), services(&second_entries));
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_match_transcript() {
        let config = OfficeConfig::new(50, 5, 20, 5, 100).unwrap().with_seed(6);
        let transcript = Arc::new(Transcript::in_memory());
        let coordinator = OfficeCoordinator::new(config, transcript.clone()).unwrap();
        let metrics = coordinator.metrics().clone();

        let summary = tokio::time::timeout(TIMEOUT, coordinator.run())
            .await
            .expect("simulation hung")
            .unwrap();

        assert_eq!(
            metrics.customers_admitted.get() as usize,
            summary.activity.customers_served
        );
        assert_eq!(
            metrics.customers_turned_away.get() as usize,
            summary.activity.customers_turned_away
        );
        let completed: u64 = ServiceType::ALL
            .iter()
            .map(|s| metrics.services_completed.with_label_values(&[s.label()]).get())
            .sum();
        assert_eq!(completed as usize, summary.activity.customers_served);
        for service in ServiceType::ALL {
            assert_eq!(metrics.queue_length.with_label_values(&[service.label()]).get(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_failure_aborts_run() {
        struct Broken;
        impl std::io::Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let config = OfficeConfig::new(10, 2, 10, 5, 100).unwrap().with_seed(7);
        let coordinator = OfficeCoordinator::new(config, Arc::new(Transcript::to_writer(Broken))).unwrap();

        let result = tokio::time::timeout(TIMEOUT, coordinator.run())
            .await
            .expect("failed run must not hang");
        assert!(matches!(result, Err(OfficeError::TranscriptWrite { .. })));
    }
}
