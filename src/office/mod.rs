// ============================================================================
// Office Module - state shared by every actor of a run
// ============================================================================
//
// Guard order is always `closing` then `queues`. The pickup path takes
// `queues` alone. Decisions made under `closing` write their transcript
// line before the guard is released, so transcript order is decision order.
//
// ============================================================================

mod queues;
mod rendezvous;

pub use queues::QueueBoard;
pub use rendezvous::{CountingGate, GateClosed, RendezvousChannel};

use crate::error::{OfficeError, Result};
use crate::metrics::Metrics;
use crate::models::{Event, ServiceType, SERVICE_TYPE_COUNT};
use crate::transcript::Transcript;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Outcome of a customer's closing check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Office was closed, the customer already logged going home
    Closed,
    Enqueued(ServiceType),
}

/// Outcome of a worker's queue inspection
#[derive(Debug)]
pub enum QueueCheck {
    /// Closed and every queue drained, the worker already logged going home
    GoHome,
    /// Nothing to do yet. The receiver was subscribed under the closing
    /// guard and changes on the next enqueue or on closing.
    Idle(watch::Receiver<u64>),
    /// At least one customer is waiting
    Pending,
}

pub struct PostOffice {
    closing: Mutex<bool>,
    queues: Mutex<QueueBoard>,
    activity: watch::Sender<u64>,
    channels: [RendezvousChannel; SERVICE_TYPE_COUNT],
    transcript: Arc<Transcript>,
    metrics: Arc<Metrics>,
}

impl PostOffice {
    pub fn new(transcript: Arc<Transcript>, metrics: Arc<Metrics>) -> Self {
        let (activity, _) = watch::channel(0);
        Self {
            closing: Mutex::new(false),
            queues: Mutex::new(QueueBoard::default()),
            activity,
            channels: ServiceType::ALL.map(RendezvousChannel::new),
            transcript,
            metrics,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn channel(&self, service: ServiceType) -> &RendezvousChannel {
        &self.channels[service.index()]
    }

    /// Customer closing check: either go home or join a random queue
    pub async fn admit<R: Rng + ?Sized>(&self, customer: u32, rng: &mut R) -> Result<Admission> {
        let closed = self.closing.lock().await;

        if *closed {
            self.transcript.log(Event::CustomerGoingHome(customer)).await?;
            self.metrics.customers_turned_away.inc();
            return Ok(Admission::Closed);
        }

        let service = ServiceType::random(rng);
        let length = self.queues.lock().await.enqueue(service);
        self.metrics.customers_admitted.inc();
        self.metrics.set_queue_length(service, length);

        self.transcript
            .log(Event::CustomerEntering { customer, service })
            .await?;
        self.bump_activity();

        drop(closed);
        Ok(Admission::Enqueued(service))
    }

    /// Worker queue inspection, decides between going home, a break, or a pickup
    pub async fn check_queues(&self, worker: u32) -> Result<QueueCheck> {
        let closed = self.closing.lock().await;

        if !self.queues.lock().await.all_empty() {
            return Ok(QueueCheck::Pending);
        }

        if *closed {
            self.transcript.log(Event::WorkerGoingHome(worker)).await?;
            return Ok(QueueCheck::GoHome);
        }

        let activity = self.activity.subscribe();
        self.transcript.log(Event::WorkerTakingBreak(worker)).await?;
        self.metrics.worker_breaks.inc();

        drop(closed);
        Ok(QueueCheck::Idle(activity))
    }

    /// Take one customer from a random non-empty queue.
    /// `None` means the queues drained since the last check.
    pub async fn dequeue<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ServiceType> {
        let mut queues = self.queues.lock().await;
        let service = queues.pick_non_empty(rng)?;
        let length = queues.take(service)?;
        self.metrics.set_queue_length(service, length);
        Some(service)
    }

    /// Close the office. Only the first call logs and returns `true`.
    pub async fn close(&self) -> Result<bool> {
        let mut closed = self.closing.lock().await;
        if *closed {
            return Ok(false);
        }

        self.transcript.log(Event::Closing).await?;
        *closed = true;
        self.bump_activity();
        Ok(true)
    }

    pub async fn is_closed(&self) -> bool {
        *self.closing.lock().await
    }

    pub async fn queue_lengths(&self) -> [usize; SERVICE_TYPE_COUNT] {
        self.queues.lock().await.lengths()
    }

    /// Fail every pending and future handshake wait
    pub fn close_channels(&self) {
        for channel in &self.channels {
            channel.close();
        }
    }

    fn bump_activity(&self) {
        self.activity.send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}

/// Wait for the next office activity after an idle check
pub async fn wait_for_activity(activity: &mut watch::Receiver<u64>) -> Result<()> {
    activity
        .changed()
        .await
        .map_err(|_| OfficeError::ActivityFeedClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn office() -> Arc<PostOffice> {
        Arc::new(PostOffice::new(
            Arc::new(Transcript::in_memory()),
            Arc::new(Metrics::new().unwrap()),
        ))
    }

    #[tokio::test]
    async fn test_admit_while_open_enqueues() {
        let office = office();
        let mut rng = StdRng::seed_from_u64(5);

        let admission = office.admit(1, &mut rng).await.unwrap();
        let Admission::Enqueued(service) = admission else {
            panic!("open office must admit");
        };

        let lengths = office.queue_lengths().await;
        assert_eq!(lengths[service.index()], 1);
        assert_eq!(lengths.iter().sum::<usize>(), 1);

        let entries = office.transcript().entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, Event::CustomerEntering { customer: 1, service });
        assert_eq!(office.metrics().customers_admitted.get(), 1);
    }

    #[tokio::test]
    async fn test_admit_after_close_turns_customer_away() {
        let office = office();
        let mut rng = StdRng::seed_from_u64(5);

        assert!(office.close().await.unwrap());
        assert_eq!(office.admit(7, &mut rng).await.unwrap(), Admission::Closed);
        assert_eq!(office.queue_lengths().await, [0, 0, 0]);

        let events: Vec<Event> = office
            .transcript()
            .entries()
            .await
            .into_iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(events, vec![Event::Closing, Event::CustomerGoingHome(7)]);
        assert_eq!(office.metrics().customers_turned_away.get(), 1);
    }

    #[tokio::test]
    async fn test_close_is_monotonic() {
        let office = office();
        assert!(!office.is_closed().await);
        assert!(office.close().await.unwrap());
        assert!(!office.close().await.unwrap());
        assert!(office.is_closed().await);

        let closings = office
            .transcript()
            .entries()
            .await
            .into_iter()
            .filter(|e| e.event == Event::Closing)
            .count();
        assert_eq!(closings, 1);
    }

    #[tokio::test]
    async fn test_check_queues_decisions() {
        let office = office();
        let mut rng = StdRng::seed_from_u64(9);

        assert!(matches!(office.check_queues(1).await.unwrap(), QueueCheck::Idle(_)));

        office.admit(1, &mut rng).await.unwrap();
        office.close().await.unwrap();
        // Closed but a customer still waits: keep working
        assert!(matches!(office.check_queues(1).await.unwrap(), QueueCheck::Pending));

        assert!(office.dequeue(&mut rng).await.is_some());
        assert!(matches!(office.check_queues(1).await.unwrap(), QueueCheck::GoHome));
    }

    #[tokio::test]
    async fn test_dequeue_on_empty_queues_is_benign() {
        let office = office();
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(office.dequeue(&mut rng).await, None);
        assert_eq!(office.queue_lengths().await, [0, 0, 0]);
    }

    #[tokio::test]
    async fn test_each_admission_is_dequeued_once() {
        let office = office();
        let mut rng = StdRng::seed_from_u64(13);

        for customer in 1..=30 {
            office.admit(customer, &mut rng).await.unwrap();
        }
        let mut picked = 0;
        while office.dequeue(&mut rng).await.is_some() {
            picked += 1;
        }
        assert_eq!(picked, 30);
        assert_eq!(office.queue_lengths().await, [0, 0, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_worker_is_woken_by_arrival() {
        let office = office();
        let QueueCheck::Idle(mut activity) = office.check_queues(1).await.unwrap() else {
            panic!("empty open office must idle");
        };

        let waiter = tokio::spawn(async move { wait_for_activity(&mut activity).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        let mut rng = StdRng::seed_from_u64(1);
        office.admit(1, &mut rng).await.unwrap();
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_idle_worker_is_woken_by_closing() {
        let office = office();
        let QueueCheck::Idle(mut activity) = office.check_queues(1).await.unwrap() else {
            panic!("empty open office must idle");
        };

        office.close().await.unwrap();
        wait_for_activity(&mut activity).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_channels_fails_waiters() {
        let office = office();
        let waiter = {
            let office = office.clone();
            tokio::spawn(async move { office.channel(ServiceType::Parcels).await_call().await })
        };
        tokio::task::yield_now().await;

        office.close_channels();
        assert!(matches!(
            waiter.await.unwrap(),
            Err(OfficeError::ChannelClosed(ServiceType::Parcels))
        ));
    }
}
