use crate::models::ServiceType;
use serde::{Deserialize, Serialize};

// ============================================================================
// Actor Phases
// ============================================================================
//
// The state machines each actor walks through. Actors publish every
// transition to the activity monitor, which makes the last known phase of
// every actor available for reports and for diagnosing a stuck run.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerPhase {
    Started,
    PreArrivalDelay,
    ClosedCheck,
    WentHomeClosed,
    Enqueued(ServiceType),
    WaitingForCall(ServiceType),
    Called(ServiceType),
    SignaledReady(ServiceType),
    SignaledDone(ServiceType),
    Terminated,
}

impl CustomerPhase {
    pub fn service(&self) -> Option<ServiceType> {
        match *self {
            CustomerPhase::Enqueued(service)
            | CustomerPhase::WaitingForCall(service)
            | CustomerPhase::Called(service)
            | CustomerPhase::SignaledReady(service)
            | CustomerPhase::SignaledDone(service) => Some(service),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CustomerPhase::Terminated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerPhase {
    Started,
    CheckingQueues,
    Breaking,
    Selecting,
    Dequeued(ServiceType),
    Signaled(ServiceType),
    AwaitingReady(ServiceType),
    Serving(ServiceType),
    AwaitingDeparture(ServiceType),
    WentHome,
}

impl WorkerPhase {
    pub fn service(&self) -> Option<ServiceType> {
        match *self {
            WorkerPhase::Dequeued(service)
            | WorkerPhase::Signaled(service)
            | WorkerPhase::AwaitingReady(service)
            | WorkerPhase::Serving(service)
            | WorkerPhase::AwaitingDeparture(service) => Some(service),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerPhase::WentHome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Customer(CustomerPhase),
    Worker(WorkerPhase),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        match self {
            Phase::Customer(phase) => phase.is_terminal(),
            Phase::Worker(phase) => phase.is_terminal(),
        }
    }

    pub fn service(&self) -> Option<ServiceType> {
        match self {
            Phase::Customer(phase) => phase.service(),
            Phase::Worker(phase) => phase.service(),
        }
    }
}

impl From<CustomerPhase> for Phase {
    fn from(phase: CustomerPhase) -> Self {
        Phase::Customer(phase)
    }
}

impl From<WorkerPhase> for Phase {
    fn from(phase: WorkerPhase) -> Self {
        Phase::Worker(phase)
    }
}
