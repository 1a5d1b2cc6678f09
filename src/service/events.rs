//! Events delivered to the service.
//!
//! Two sources: the BLE transport (connection lifecycle, RSSI samples,
//! CCCD writes) and the domain event bus (list changes produced by the
//! scanner and the tracker).

use crate::config::{EVT_SCANNED_DEVICES, EVT_TRACKED_DEVICES};
use crate::service::characteristic::CharacteristicId;

/// SoftDevice connection handle.
pub type ConnHandle = u16;

/// Transport-level events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleEvent {
    /// A central connected.
    Connected(ConnHandle),
    /// The central disconnected.
    Disconnected(ConnHandle),
    /// New RSSI reading for the active connection (dBm).
    SignalStrengthSample(i8),
    /// The central enabled or disabled notifications on a characteristic.
    Subscription {
        target: CharacteristicId,
        enabled: bool,
    },
}

/// Kind of a domain event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    ScannedDevicesChanged,
    TrackedDevicesChanged,
    /// Any code this service does not know. Ignored.
    Unknown(u16),
}

impl EventKind {
    pub const fn from_raw(code: u16) -> Self {
        match code {
            EVT_SCANNED_DEVICES => EventKind::ScannedDevicesChanged,
            EVT_TRACKED_DEVICES => EventKind::TrackedDevicesChanged,
            other => EventKind::Unknown(other),
        }
    }

    pub const fn raw(self) -> u16 {
        match self {
            EventKind::ScannedDevicesChanged => EVT_SCANNED_DEVICES,
            EventKind::TrackedDevicesChanged => EVT_TRACKED_DEVICES,
            EventKind::Unknown(code) => code,
        }
    }

    /// Characteristic that mirrors this event's payload, if any.
    pub const fn target(self) -> Option<CharacteristicId> {
        match self {
            EventKind::ScannedDevicesChanged => Some(CharacteristicId::PeripheralList),
            EventKind::TrackedDevicesChanged => Some(CharacteristicId::TrackedDeviceList),
            EventKind::Unknown(_) => None,
        }
    }
}

/// A domain event with its borrowed payload.
///
/// The payload belongs to the producer and is only valid while the event
/// is being delivered.
#[derive(Clone, Copy, Debug)]
pub struct DomainEvent<'a> {
    pub kind: EventKind,
    pub payload: &'a [u8],
}

impl<'a> DomainEvent<'a> {
    pub const fn new(kind: EventKind, payload: &'a [u8]) -> Self {
        Self { kind, payload }
    }

    pub const fn from_raw(code: u16, payload: &'a [u8]) -> Self {
        Self::new(EventKind::from_raw(code), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_kinds() {
        assert_eq!(
            EventKind::from_raw(EVT_SCANNED_DEVICES),
            EventKind::ScannedDevicesChanged
        );
        assert_eq!(
            EventKind::from_raw(EVT_TRACKED_DEVICES),
            EventKind::TrackedDevicesChanged
        );
    }

    #[test]
    fn unknown_code_is_preserved() {
        let kind = EventKind::from_raw(0x7FFF);
        assert_eq!(kind, EventKind::Unknown(0x7FFF));
        assert_eq!(kind.raw(), 0x7FFF);
        assert_eq!(kind.target(), None);
    }

    #[test]
    fn dispatch_table() {
        assert_eq!(
            EventKind::ScannedDevicesChanged.target(),
            Some(CharacteristicId::PeripheralList)
        );
        assert_eq!(
            EventKind::TrackedDevicesChanged.target(),
            Some(CharacteristicId::TrackedDeviceList)
        );
    }
}
