//! Characteristic slots exposed by the localization service.

use heapless::Vec;

use crate::config::{self, SCRATCH_BUFFER_SIZE};
use crate::service::router::WriteHandler;

/// Stable identity of every characteristic the service may expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharacteristicId {
    /// Current RSSI of the connected central (read, notify).
    SignalStrength,
    /// Remote scan control (write).
    ScanControl,
    /// Peripherals seen by the last scan (notify).
    PeripheralList,
    /// Devices currently tracked (read).
    TrackedDeviceList,
    /// Add/remove a tracked device (write).
    TrackedDeviceCommand,
}

impl CharacteristicId {
    pub const COUNT: usize = 5;

    pub const ALL: [CharacteristicId; Self::COUNT] = [
        CharacteristicId::SignalStrength,
        CharacteristicId::ScanControl,
        CharacteristicId::PeripheralList,
        CharacteristicId::TrackedDeviceList,
        CharacteristicId::TrackedDeviceCommand,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// 16-bit alias inside the service base UUID.
    pub const fn alias(self) -> u16 {
        match self {
            CharacteristicId::SignalStrength => config::RSSI_UUID,
            CharacteristicId::ScanControl => config::SCAN_DEVICE_UUID,
            CharacteristicId::PeripheralList => config::LIST_DEVICE_UUID,
            CharacteristicId::TrackedDeviceList => config::TRACKED_DEVICE_LIST_UUID,
            CharacteristicId::TrackedDeviceCommand => config::TRACKED_DEVICE_UUID,
        }
    }

    /// Full 128-bit UUID (little-endian).
    pub const fn uuid(self) -> [u8; 16] {
        config::namespaced_uuid(self.alias())
    }
}

/// Read/write/notify capability flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Properties {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl Properties {
    pub const fn new() -> Self {
        Self {
            read: false,
            write: false,
            notify: false,
        }
    }

    pub const fn read(mut self) -> Self {
        self.read = true;
        self
    }

    pub const fn write(mut self) -> Self {
        self.write = true;
        self
    }

    pub const fn notify(mut self) -> Self {
        self.notify = true;
        self
    }
}

/// A single characteristic: identity, capabilities and its own value storage.
///
/// The value never grows past `max_len`.
pub struct Characteristic {
    id: CharacteristicId,
    name: &'static str,
    properties: Properties,
    max_len: usize,
    value: Vec<u8, SCRATCH_BUFFER_SIZE>,
    fixed_len: bool,
    subscribed: bool,
    on_write: Option<WriteHandler>,
}

impl Characteristic {
    /// Create a characteristic holding `default` as its initial value.
    ///
    /// `max_len` is clamped to the storage capacity. `default` must fit.
    pub fn new(
        id: CharacteristicId,
        name: &'static str,
        properties: Properties,
        default: &[u8],
        max_len: usize,
    ) -> Self {
        let max_len = max_len.min(SCRATCH_BUFFER_SIZE);
        debug_assert!(default.len() <= max_len);
        let mut value = Vec::new();
        // Cannot fail once the default fits.
        let _ = value.extend_from_slice(default);
        Self {
            id,
            name,
            properties,
            max_len,
            value,
            fixed_len: false,
            subscribed: false,
            on_write: None,
        }
    }

    /// Bind the handler invoked after a write has been stored.
    pub fn with_write_handler(mut self, handler: WriteHandler) -> Self {
        self.on_write = Some(handler);
        self
    }

    /// Only values of exactly `max_len` bytes are accepted from the peer.
    pub fn with_fixed_len(mut self) -> Self {
        self.fixed_len = true;
        self
    }

    pub fn is_fixed_len(&self) -> bool {
        self.fixed_len
    }

    pub fn id(&self) -> CharacteristicId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn properties(&self) -> Properties {
        self.properties
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub(crate) fn set_subscribed(&mut self, enabled: bool) {
        self.subscribed = enabled;
    }

    pub(crate) fn write_handler(&self) -> Option<WriteHandler> {
        self.on_write
    }

    /// Replace the stored value. Returns `false` (and leaves the old value
    /// intact) when `data` exceeds `max_len`.
    pub(crate) fn store(&mut self, data: &[u8]) -> bool {
        if data.len() > self.max_len {
            return false;
        }
        self.value.clear();
        self.value.extend_from_slice(data).is_ok()
    }

    /// Whether a publish should be pushed to the peer right away.
    pub fn should_notify(&self) -> bool {
        self.properties.notify && self.subscribed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_index_their_own_position() {
        for (i, id) in CharacteristicId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn aliases_are_unique() {
        let aliases = CharacteristicId::ALL.map(|id| id.alias());
        for (i, a) in aliases.iter().enumerate() {
            assert!(!aliases[i + 1..].contains(a));
        }
    }

    #[test]
    fn default_value_is_stored() {
        let c = Characteristic::new(
            CharacteristicId::ScanControl,
            "scan",
            Properties::new().write(),
            &[255],
            1,
        );
        assert_eq!(c.value(), &[255]);
        assert_eq!(c.len(), 1);
        assert!(!c.is_subscribed());
    }

    #[test]
    fn store_rejects_oversized_value_and_keeps_old() {
        let mut c = Characteristic::new(
            CharacteristicId::SignalStrength,
            "rssi",
            Properties::new().read().notify(),
            &[1],
            1,
        );
        assert!(!c.store(&[1, 2]));
        assert_eq!(c.value(), &[1]);
        assert!(c.store(&[0xC4]));
        assert_eq!(c.value(), &[0xC4]);
    }

    #[test]
    #[should_panic]
    fn default_longer_than_max_len_is_a_bug() {
        let _ = Characteristic::new(
            CharacteristicId::ScanControl,
            "scan",
            Properties::new().write(),
            &[1, 2],
            1,
        );
    }

    #[test]
    fn fixed_len_is_opt_in() {
        let c = Characteristic::new(
            CharacteristicId::ScanControl,
            "scan",
            Properties::new().write(),
            &[255],
            1,
        );
        assert!(!c.is_fixed_len());
        assert!(c.with_fixed_len().is_fixed_len());
    }

    #[test]
    fn max_len_is_clamped_to_storage() {
        let c = Characteristic::new(
            CharacteristicId::PeripheralList,
            "devices",
            Properties::new().notify(),
            &[],
            SCRATCH_BUFFER_SIZE * 2,
        );
        assert_eq!(c.max_len(), SCRATCH_BUFFER_SIZE);
        assert!(c.is_empty());
    }

    #[test]
    fn notify_requires_capability_and_subscriber() {
        let mut list = Characteristic::new(
            CharacteristicId::TrackedDeviceList,
            "tracked",
            Properties::new().read(),
            &[],
            16,
        );
        list.set_subscribed(true);
        assert!(!list.should_notify());

        let mut rssi = Characteristic::new(
            CharacteristicId::SignalStrength,
            "rssi",
            Properties::new().read().notify(),
            &[1],
            1,
        );
        assert!(!rssi.should_notify());
        rssi.set_subscribed(true);
        assert!(rssi.should_notify());
    }
}
