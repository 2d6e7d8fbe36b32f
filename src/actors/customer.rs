use kameo::actor::ActorRef;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use crate::actors::core::{actor_rng, CustomerPhase};
use crate::actors::infrastructure::{report_phase, ActivityMonitor};
use crate::config::{random_delay, OfficeConfig, MAX_SERVICE_TIME_MS};
use crate::error::Result;
use crate::models::{ActorId, Event, ServiceType};
use crate::office::{Admission, PostOffice};

// ============================================================================
// Customer Actor
// ============================================================================
//
// Started -> PreArrivalDelay -> ClosedCheck -> WentHomeClosed
//                                           \-> Enqueued -> WaitingForCall
//   -> Called -> SignaledReady -> SignaledDone -> Terminated
//
// Once enqueued a customer is never cancelled: workers only leave when
// every queue is empty, so somebody will call.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerOutcome {
    Served(ServiceType),
    TurnedAway,
}

pub struct CustomerActor {
    id: u32,
    max_wait: Duration,
    rng: StdRng,
    office: Arc<PostOffice>,
    monitor: ActorRef<ActivityMonitor>,
}

impl CustomerActor {
    pub fn new(
        id: u32,
        config: &OfficeConfig,
        office: Arc<PostOffice>,
        monitor: ActorRef<ActivityMonitor>,
    ) -> Self {
        Self {
            id,
            max_wait: config.customer_max_wait(),
            rng: actor_rng(config.seed, ActorId::Customer(id)),
            office,
            monitor,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        ActorId::Customer(self.id)
    }

    async fn transition(&self, phase: CustomerPhase) {
        tracing::trace!(customer = self.id, phase = ?phase, "Customer transition");
        report_phase(&self.monitor, self.actor_id(), phase).await;
    }

    pub async fn run(mut self) -> Result<CustomerOutcome> {
        self.transition(CustomerPhase::Started).await;
        self.office.transcript().log(Event::CustomerStarted(self.id)).await?;

        self.transition(CustomerPhase::PreArrivalDelay).await;
        tokio::time::sleep(random_delay(&mut self.rng, self.max_wait)).await;

        self.transition(CustomerPhase::ClosedCheck).await;
        let service = match self.office.admit(self.id, &mut self.rng).await? {
            Admission::Closed => {
                tracing::debug!(customer = self.id, "Office closed, going home unserved");
                self.transition(CustomerPhase::WentHomeClosed).await;
                self.transition(CustomerPhase::Terminated).await;
                return Ok(CustomerOutcome::TurnedAway);
            }
            Admission::Enqueued(service) => service,
        };
        self.transition(CustomerPhase::Enqueued(service)).await;

        let channel = self.office.channel(service);

        self.transition(CustomerPhase::WaitingForCall(service)).await;
        channel.await_call().await?;

        self.transition(CustomerPhase::Called(service)).await;
        self.office.transcript().log(Event::CustomerCalled(self.id)).await?;
        let explain = random_delay(&mut self.rng, Duration::from_millis(MAX_SERVICE_TIME_MS));
        tokio::time::sleep(explain).await;
        channel.signal_ready();

        self.transition(CustomerPhase::SignaledReady(service)).await;
        self.office.transcript().log(Event::CustomerGoingHome(self.id)).await?;
        channel.signal_departure();

        self.transition(CustomerPhase::SignaledDone(service)).await;
        tracing::debug!(customer = self.id, service = service.number(), "Customer served");
        self.transition(CustomerPhase::Terminated).await;
        Ok(CustomerOutcome::Served(service))
    }
}
