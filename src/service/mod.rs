//! Indoor localization GATT service.
//!
//! Ties transport events, domain events, peer writes and the periodic tick
//! to the characteristic registry:
//!
//! 1. **Registry** - characteristics allocated from the feature flags.
//! 2. **RSSI filter** - smooths samples while a central is connected.
//! 3. **Write router** - scan control and tracked-device writes.
//! 4. **Event bridge** - list-changed events into the list characteristics.
//! 5. **Tick** - indicator update, then re-arm.
//!
//! Every entry point runs to completion without blocking. The caller is
//! responsible for never entering the service re-entrantly.

pub mod characteristic;
pub mod events;
pub mod registry;
pub mod router;
pub mod rssi;
pub mod scratch;
pub mod tick;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use characteristic::{Characteristic, CharacteristicId, Properties};
pub use events::{BleEvent, ConnHandle, DomainEvent, EventKind};
pub use registry::{CharacteristicRegistry, Published};
pub use router::{CommandDispatcher, DeviceTracker, WriteTargets};
pub use rssi::{Actuator, RssiFilter};
pub use scratch::{ScratchBuffer, ScratchLease};
pub use tick::{TickScheduler, TickTimer};
pub use transport::GattTransport;

use crate::config::{ServiceConfig, SERVICE_NAME};
use crate::error::Result;

pub struct IndoorLocalizationService<T: GattTransport> {
    config: ServiceConfig,
    registry: CharacteristicRegistry,
    rssi: RssiFilter,
    scheduler: TickScheduler,
    connection: Option<ConnHandle>,
    transport: T,
}

impl<T: GattTransport> IndoorLocalizationService<T> {
    /// Build the service. Characteristics are allocated here, once.
    pub fn new(config: ServiceConfig, scratch: &ScratchBuffer, transport: T) -> Self {
        let registry = CharacteristicRegistry::initialize(&config.features, scratch);
        Self::with_registry(config, registry, transport)
    }

    /// Build the service around a registry allocated earlier, e.g. one
    /// whose layout has already been registered with the stack.
    pub fn with_registry(config: ServiceConfig, registry: CharacteristicRegistry, transport: T) -> Self {
        info!("{}: {}", SERVICE_NAME, config.features);
        Self {
            registry,
            rssi: RssiFilter::new(),
            scheduler: TickScheduler::from_hz(config.update_frequency_hz),
            connection: None,
            config,
            transport,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &CharacteristicRegistry {
        &self.registry
    }

    pub fn rssi(&self) -> &RssiFilter {
        &self.rssi
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn connection(&self) -> Option<ConnHandle> {
        self.connection
    }

    fn indicator_enabled(&self) -> bool {
        self.config.features.signal_strength && self.config.rssi_indicator
    }

    /// Transport lifecycle and sampling events.
    pub fn on_ble_event(&mut self, event: BleEvent) {
        match event {
            BleEvent::Connected(conn) => {
                info!("connected: {}", conn);
                self.connection = Some(conn);
                if self.config.features.signal_strength {
                    self.transport.start_rssi(conn);
                }
            }
            BleEvent::Disconnected(conn) => {
                info!("disconnected: {}", conn);
                if self.config.features.signal_strength {
                    self.transport.stop_rssi(conn);
                }
                self.connection = None;
                self.registry.clear_subscriptions();
            }
            BleEvent::SignalStrengthSample(raw) => {
                if self.connection.is_none() {
                    trace!("rssi {} without connection ignored", raw);
                    return;
                }
                self.set_rssi_level(raw);
            }
            BleEvent::Subscription { target, enabled } => {
                debug!("subscription {}: {}", target, enabled);
                self.registry.set_subscribed(target, enabled);
            }
        }
    }

    fn set_rssi_level(&mut self, raw: i8) {
        if !self.registry.contains(CharacteristicId::SignalStrength) {
            return;
        }
        // Capacity is one byte; this cannot be oversized.
        let _ = self.registry.publish(
            CharacteristicId::SignalStrength,
            &[raw as u8],
            &mut self.transport,
        );
        if self.config.rssi_indicator {
            let avg = self.rssi.update(raw);
            debug!("RSSI: {} avg: {}", raw, avg);
        }
    }

    /// Domain events from the event bus.
    ///
    /// The payload is copied before returning. Unknown kinds are ignored.
    pub fn handle_event(&mut self, event: &DomainEvent<'_>) -> Result<Published> {
        let Some(target) = event.kind.target() else {
            debug!("ignoring event {}", event.kind.raw());
            return Ok(Published::Skipped);
        };
        self.registry.publish(target, event.payload, &mut self.transport)
    }

    /// A write from the peer on `target`.
    pub fn on_write(
        &mut self,
        target: CharacteristicId,
        payload: &[u8],
        targets: &mut WriteTargets<'_>,
    ) -> Result<Published> {
        self.registry.accept_write(target, payload, targets)
    }

    /// Arm the first tick.
    pub fn start_ticking(&self, timer: &mut dyn TickTimer) {
        self.scheduler.schedule_next(timer);
    }

    /// Periodic tick: indicator update, then re-arm.
    pub fn tick(&mut self, actuator: &mut dyn Actuator, timer: &mut dyn TickTimer) {
        if self.indicator_enabled() {
            self.rssi.drive(actuator);
        }
        self.scheduler.complete(timer);
    }
}
