use crate::error::{OfficeError, Result};
use crate::models::ServiceType;
use tokio::sync::Semaphore;

// ============================================================================
// Rendezvous Channel
// ============================================================================
//
// Per service type, three counting gates carry one customer/worker handshake:
//
//   worker ── call ──▶ customer
//   worker ◀── ready ── customer
//   worker ◀── depart ── customer
//
// Gates count; they do not queue. Which waiter a release wakes is
// unspecified, only the number of units is conserved.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("gate closed")]
pub struct GateClosed;

/// Counting acquire/release primitive starting at zero
#[derive(Debug)]
pub struct CountingGate {
    permits: Semaphore,
}

impl CountingGate {
    pub fn new() -> Self {
        Self {
            permits: Semaphore::new(0),
        }
    }

    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    /// Wait for one unit and consume it
    pub async fn acquire(&self) -> std::result::Result<(), GateClosed> {
        let permit = self.permits.acquire().await.map_err(|_| GateClosed)?;
        permit.forget();
        Ok(())
    }

    /// Units released but not yet acquired
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wake every waiter with [`GateClosed`]
    pub fn close(&self) {
        self.permits.close();
    }
}

impl Default for CountingGate {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct RendezvousChannel {
    service: ServiceType,
    call: CountingGate,
    ready: CountingGate,
    depart: CountingGate,
}

impl RendezvousChannel {
    pub fn new(service: ServiceType) -> Self {
        Self {
            service,
            call: CountingGate::new(),
            ready: CountingGate::new(),
            depart: CountingGate::new(),
        }
    }

    pub fn service(&self) -> ServiceType {
        self.service
    }

    // Worker side

    /// Wake one customer waiting on this service
    pub fn call_customer(&self) {
        self.call.release();
    }

    pub async fn await_ready(&self) -> Result<()> {
        self.ready.acquire().await.map_err(|_| self.closed())
    }

    pub async fn await_departure(&self) -> Result<()> {
        self.depart.acquire().await.map_err(|_| self.closed())
    }

    // Customer side

    pub async fn await_call(&self) -> Result<()> {
        self.call.acquire().await.map_err(|_| self.closed())
    }

    pub fn signal_ready(&self) {
        self.ready.release();
    }

    pub fn signal_departure(&self) {
        self.depart.release();
    }

    /// Outstanding units per gate as (call, ready, depart)
    pub fn pending(&self) -> (usize, usize, usize) {
        (
            self.call.available(),
            self.ready.available(),
            self.depart.available(),
        )
    }

    pub fn close(&self) {
        self.call.close();
        self.ready.close();
        self.depart.close();
    }

    fn closed(&self) -> OfficeError {
        OfficeError::ChannelClosed(self.service)
    }
}
