use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Domain Models
// ============================================================================

/// Number of service counters (and therefore queues) in the office
pub const SERVICE_TYPE_COUNT: usize = 3;

/// Kind of service a customer queues for
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceType {
    Letters,
    Parcels,
    MoneyServices,
}

impl ServiceType {
    pub const ALL: [ServiceType; SERVICE_TYPE_COUNT] = [
        ServiceType::Letters,
        ServiceType::Parcels,
        ServiceType::MoneyServices,
    ];

    /// Zero-based queue index
    pub fn index(self) -> usize {
        match self {
            ServiceType::Letters => 0,
            ServiceType::Parcels => 1,
            ServiceType::MoneyServices => 2,
        }
    }

    /// One-based number printed in the transcript
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Uniform choice over all service types
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..SERVICE_TYPE_COUNT)]
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceType::Letters => "letters",
            ServiceType::Parcels => "parcels",
            ServiceType::MoneyServices => "money_services",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Identity of a simulated actor
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActorId {
    Customer(u32),
    Worker(u32),
}

impl ActorId {
    pub fn is_customer(&self) -> bool {
        matches!(self, ActorId::Customer(_))
    }

    pub fn is_worker(&self) -> bool {
        matches!(self, ActorId::Worker(_))
    }

    pub fn number(&self) -> u32 {
        match self {
            ActorId::Customer(id) | ActorId::Worker(id) => *id,
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorId::Customer(id) => write!(f, "Z {}", id),
            ActorId::Worker(id) => write!(f, "U {}", id),
        }
    }
}

// ============================================================================
// Transcript Events
// These are the observable steps of a run, one transcript line each
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    CustomerStarted(u32),
    CustomerEntering { customer: u32, service: ServiceType },
    CustomerCalled(u32),
    CustomerGoingHome(u32),
    WorkerStarted(u32),
    WorkerServing { worker: u32, service: ServiceType },
    WorkerServiceFinished(u32),
    WorkerTakingBreak(u32),
    WorkerBreakFinished(u32),
    WorkerGoingHome(u32),
    Closing,
}

impl Event {
    /// Actor that produced the event, `None` for office-wide events
    pub fn actor(&self) -> Option<ActorId> {
        match *self {
            Event::CustomerStarted(id)
            | Event::CustomerEntering { customer: id, .. }
            | Event::CustomerCalled(id)
            | Event::CustomerGoingHome(id) => Some(ActorId::Customer(id)),
            Event::WorkerStarted(id)
            | Event::WorkerServing { worker: id, .. }
            | Event::WorkerServiceFinished(id)
            | Event::WorkerTakingBreak(id)
            | Event::WorkerBreakFinished(id)
            | Event::WorkerGoingHome(id) => Some(ActorId::Worker(id)),
            Event::Closing => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Event::CustomerStarted(id) => write!(f, "{}: started", ActorId::Customer(id)),
            Event::CustomerEntering { customer, service } => write!(
                f,
                "{}: entering office for a service {}",
                ActorId::Customer(customer),
                service
            ),
            Event::CustomerCalled(id) => {
                write!(f, "{}: called by office worker", ActorId::Customer(id))
            }
            Event::CustomerGoingHome(id) => write!(f, "{}: going home", ActorId::Customer(id)),
            Event::WorkerStarted(id) => write!(f, "{}: started", ActorId::Worker(id)),
            Event::WorkerServing { worker, service } => write!(
                f,
                "{}: serving a service of type {}",
                ActorId::Worker(worker),
                service
            ),
            Event::WorkerServiceFinished(id) => {
                write!(f, "{}: service finished", ActorId::Worker(id))
            }
            Event::WorkerTakingBreak(id) => write!(f, "{}: taking break", ActorId::Worker(id)),
            Event::WorkerBreakFinished(id) => write!(f, "{}: break finished", ActorId::Worker(id)),
            Event::WorkerGoingHome(id) => write!(f, "{}: going home", ActorId::Worker(id)),
            Event::Closing => write!(f, "closing"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
