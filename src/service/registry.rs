//! Characteristic registry - the conditional set of exposed characteristics.
//!
//! Slots are allocated once from the [`FeatureConfig`] and never change
//! afterwards. A disabled feature leaves its slot empty; every operation
//! on an empty slot is skipped without touching anything.

use crate::config::{self, FeatureConfig};
use crate::error::{Error, Result};
use crate::service::characteristic::{Characteristic, CharacteristicId, Properties};
use crate::service::router::{self, WriteTargets};
use crate::service::scratch::ScratchBuffer;
use crate::service::transport::GattTransport;

/// Outcome of a publish or write on a registry slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Published {
    /// The characteristic is not configured; nothing happened.
    Skipped,
    /// Value stored; `notified` tells whether a notification was sent.
    Stored { notified: bool },
}

pub struct CharacteristicRegistry {
    slots: [Option<Characteristic>; CharacteristicId::COUNT],
}

impl CharacteristicRegistry {
    /// Allocate the characteristics selected by `features`.
    ///
    /// Variable-length characteristics take the scratch buffer's capacity
    /// as their maximum length.
    pub fn initialize(features: &FeatureConfig, scratch: &ScratchBuffer) -> Self {
        let mut registry = Self {
            slots: Default::default(),
        };
        let max_len = scratch.capacity();

        info!("Create indoor localization service");

        if features.signal_strength {
            info!("add Signal Strength characteristics");
            registry.insert(
                Characteristic::new(
                    CharacteristicId::SignalStrength,
                    config::CHAR_RSSI_NAME,
                    Properties::new().read().notify(),
                    &[config::RSSI_DEFAULT_VALUE as u8],
                    1,
                )
                .with_fixed_len(),
            );
        } else {
            info!("skip Signal Strength characteristics");
        }

        if features.scan_control {
            info!("add Scan Control characteristic");
            registry.insert(
                Characteristic::new(
                    CharacteristicId::ScanControl,
                    config::CHAR_SCAN_NAME,
                    Properties::new().write(),
                    &[config::SCAN_CONTROL_DEFAULT_VALUE],
                    1,
                )
                .with_fixed_len()
                .with_write_handler(router::forward_scan_command),
            );
        } else {
            info!("skip Scan Control characteristic");
        }

        if features.peripheral_list {
            info!("add Devices characteristic");
            registry.insert(Characteristic::new(
                CharacteristicId::PeripheralList,
                config::CHAR_DEVICES_NAME,
                Properties::new().notify(),
                &[],
                max_len,
            ));
        } else {
            info!("skip Devices characteristic");
        }

        if features.tracked_devices {
            info!("add Tracked Device characteristics");
            registry.insert(Characteristic::new(
                CharacteristicId::TrackedDeviceList,
                config::CHAR_TRACK_NAME,
                Properties::new().read(),
                &[],
                max_len,
            ));
            registry.insert(
                Characteristic::new(
                    CharacteristicId::TrackedDeviceCommand,
                    config::CHAR_ADD_TRACKED_NAME,
                    Properties::new().write(),
                    &[],
                    max_len,
                )
                .with_write_handler(router::forward_tracker_command),
            );
        } else {
            info!("skip Tracked Device characteristics");
        }

        registry
    }

    fn insert(&mut self, characteristic: Characteristic) {
        let index = characteristic.id().index();
        self.slots[index] = Some(characteristic);
    }

    pub fn get(&self, id: CharacteristicId) -> Option<&Characteristic> {
        self.slots[id.index()].as_ref()
    }

    fn get_mut(&mut self, id: CharacteristicId) -> Option<&mut Characteristic> {
        self.slots[id.index()].as_mut()
    }

    pub fn contains(&self, id: CharacteristicId) -> bool {
        self.get(id).is_some()
    }

    /// Configured characteristics in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Characteristic> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `value` into `target`, mirror it into the GATT table and notify
    /// the peer when subscribed.
    ///
    /// Oversized values are rejected and leave the characteristic as it was.
    /// Transport failures are logged and swallowed.
    pub fn publish<T: GattTransport>(
        &mut self,
        target: CharacteristicId,
        value: &[u8],
        transport: &mut T,
    ) -> Result<Published> {
        let Some(characteristic) = self.get_mut(target) else {
            debug!("publish to absent {} skipped", target);
            return Ok(Published::Skipped);
        };

        if !characteristic.store(value) {
            warn!(
                "payload of {} bytes exceeds {} max {}",
                value.len(),
                target,
                characteristic.max_len()
            );
            return Err(Error::PayloadTooLarge {
                target,
                len: value.len(),
                max: characteristic.max_len(),
            });
        }

        if let Err(e) = transport.set_value(target, characteristic.value()) {
            warn!("set_value {} failed: {}", target, e);
        }

        let mut notified = false;
        if characteristic.should_notify() {
            match transport.notify(target, characteristic.value()) {
                Ok(()) => notified = true,
                Err(e) => warn!("notify {} failed: {}", target, e),
            }
        }

        Ok(Published::Stored { notified })
    }

    /// Accept a write from the peer and run the bound handler.
    ///
    /// The payload is copied into the characteristic's own storage first,
    /// so the handler never sees the transport's transient buffer.
    pub fn accept_write(
        &mut self,
        target: CharacteristicId,
        payload: &[u8],
        targets: &mut WriteTargets<'_>,
    ) -> Result<Published> {
        let Some(characteristic) = self.get_mut(target) else {
            debug!("write to absent {} skipped", target);
            return Ok(Published::Skipped);
        };

        if !characteristic.properties().write {
            warn!("write to read-only {}", target);
            return Err(Error::NotWritable(target));
        }

        if characteristic.is_fixed_len() && payload.len() < characteristic.max_len() {
            warn!(
                "write of {} bytes to {} needs exactly {}",
                payload.len(),
                target,
                characteristic.max_len()
            );
            return Err(Error::MalformedCommand { len: payload.len() });
        }

        if !characteristic.store(payload) {
            warn!(
                "write of {} bytes exceeds {} max {}",
                payload.len(),
                target,
                characteristic.max_len()
            );
            return Err(Error::PayloadTooLarge {
                target,
                len: payload.len(),
                max: characteristic.max_len(),
            });
        }

        if let Some(handler) = characteristic.write_handler() {
            handler(characteristic, targets);
        }

        Ok(Published::Stored { notified: false })
    }

    /// Record a CCCD change. Ignored for absent or non-notifying slots.
    pub fn set_subscribed(&mut self, target: CharacteristicId, enabled: bool) {
        if let Some(characteristic) = self.get_mut(target) {
            if characteristic.properties().notify {
                characteristic.set_subscribed(enabled);
            }
        }
    }

    /// Drop all subscriptions (connection ended).
    pub fn clear_subscriptions(&mut self) {
        for characteristic in self.slots.iter_mut().flatten() {
            characteristic.set_subscribed(false);
        }
    }
}
