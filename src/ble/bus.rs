//! Domain event bus and the shared scratch buffer.
//!
//! Producers assemble their payload in [`SCRATCH`] and publish a copy on
//! [`EventBus`]. The localization service subscribes once, when it is
//! started, and sees each payload as a borrowed [`DomainEvent`].

use defmt::warn;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};
use heapless::Vec;
use indoorloc::config::SCRATCH_BUFFER_SIZE;
use indoorloc::service::{DomainEvent, EventKind, ScratchBuffer, ScratchLease};
use indoorloc::Result;

const BUS_CAPACITY: usize = 4;
const BUS_SUBSCRIBERS: usize = 1;
const BUS_PUBLISHERS: usize = 2;

/// Event as it travels over the bus.
#[derive(Clone)]
pub struct BusEvent {
    pub code: u16,
    pub payload: Vec<u8, SCRATCH_BUFFER_SIZE>,
}

impl BusEvent {
    pub fn as_domain_event(&self) -> DomainEvent<'_> {
        DomainEvent::from_raw(self.code, &self.payload)
    }
}

pub type EventBus =
    PubSubChannel<CriticalSectionRawMutex, BusEvent, BUS_CAPACITY, BUS_SUBSCRIBERS, BUS_PUBLISHERS>;

pub type EventPublisher = Publisher<
    'static,
    CriticalSectionRawMutex,
    BusEvent,
    BUS_CAPACITY,
    BUS_SUBSCRIBERS,
    BUS_PUBLISHERS,
>;

pub type EventSubscriber = Subscriber<
    'static,
    CriticalSectionRawMutex,
    BusEvent,
    BUS_CAPACITY,
    BUS_SUBSCRIBERS,
    BUS_PUBLISHERS,
>;

/// Scratch area shared by every list producer.
pub static SCRATCH: Mutex<CriticalSectionRawMutex, ScratchBuffer> =
    Mutex::new(ScratchBuffer::new());

/// Assemble a payload in the scratch buffer with `fill` and publish it.
///
/// The lease is held only for the synchronous extent of this call.
pub fn publish_with_scratch<F>(publisher: &EventPublisher, kind: EventKind, fill: F) -> Result<()>
where
    F: FnOnce(&mut ScratchLease<'_>) -> Result<()>,
{
    SCRATCH.lock(|scratch| {
        let mut lease = scratch.lease()?;
        if let Err(e) = fill(&mut lease) {
            warn!("event {} payload not assembled: {}", kind.raw(), e);
            return Err(e);
        }
        let mut payload = Vec::new();
        // Same capacity on both sides.
        let _ = payload.extend_from_slice(lease.as_slice());
        publisher.publish_immediate(BusEvent {
            code: kind.raw(),
            payload,
        });
        Ok(())
    })
}
