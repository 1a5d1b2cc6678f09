//! Application-wide constants and compile-time configuration.
//!
//! Identities, timing parameters and protocol constants live here so
//! they can be tuned in one place. Which characteristics exist is
//! chosen with cargo features and captured once in [`ServiceConfig`].

// Service identity

/// Vendor base UUID of the localization service, little-endian as the
/// SoftDevice expects it (`7e170000-429c-41aa-83d7-d91220abeb33`).
///
/// Bytes 12..14 hold the 16-bit alias; the service itself uses alias 0.
pub const SERVICE_BASE_UUID: [u8; 16] = [
    0x33, 0xeb, 0xab, 0x20, 0x12, 0xd9, 0xd7, 0x83, 0xaa, 0x41, 0x9c, 0x42, 0x00, 0x00, 0x17, 0x7e,
];

/// Human-readable service name.
pub const SERVICE_NAME: &str = "Localization Service";

/// GAP device name, also sent in the scan response.
pub const DEVICE_NAME: &str = "IndoorLoc";

/// 16-bit aliases inside the service base UUID.
pub const RSSI_UUID: u16 = 0x0001;
pub const SCAN_DEVICE_UUID: u16 = 0x0002;
pub const LIST_DEVICE_UUID: u16 = 0x0003;
pub const TRACKED_DEVICE_LIST_UUID: u16 = 0x0004;
pub const TRACKED_DEVICE_UUID: u16 = 0x0005;

/// Characteristic names.
pub const CHAR_RSSI_NAME: &str = "Received signal level";
pub const CHAR_SCAN_NAME: &str = "Scan for Devices";
pub const CHAR_DEVICES_NAME: &str = "Devices";
pub const CHAR_TRACK_NAME: &str = "List tracked devices";
pub const CHAR_ADD_TRACKED_NAME: &str = "Add tracked device";

/// Default value of the signal-strength characteristic before the first sample.
pub const RSSI_DEFAULT_VALUE: i8 = 1;

/// Default value of the scan-control characteristic (no command yet).
pub const SCAN_CONTROL_DEFAULT_VALUE: u8 = 255;

// Shared buffer

/// Capacity of the shared scratch buffer. Every variable-length
/// characteristic takes this as its maximum length.
pub const SCRATCH_BUFFER_SIZE: usize = 200;

// RSSI indicator

/// Tick frequency of the localization service (Hz).
pub const LOCALIZATION_SERVICE_UPDATE_FREQUENCY: u32 = 10;

/// Seed for the running RSSI average.
pub const RSSI_AVERAGE_SEED: i8 = -90;

/// Smoothed RSSI above which the indicator switches fully on (dBm).
pub const RSSI_HIGH_THRESHOLD: i8 = -70;

/// Smoothed RSSI below which the indicator switches fully off (dBm).
pub const RSSI_LOW_THRESHOLD: i8 = -80;

/// Indicator output levels.
pub const INDICATOR_ON: u8 = 255;
pub const INDICATOR_OFF: u8 = 0;

// Commands & events

/// Opcode handed to the command dispatcher for scan-control writes.
pub const CMD_SCAN_DEVICES: u8 = 0x0D;

/// Raw event codes published on the domain event bus.
pub const EVT_SCANNED_DEVICES: u16 = 0x0180;
pub const EVT_TRACKED_DEVICES: u16 = 0x0181;

// Firmware collaborators

/// Duration of a remote-triggered BLE scan window (seconds).
pub const BLE_SCAN_DURATION_SECS: u64 = 5;

/// Maximum number of peripherals kept from one scan.
pub const BLE_MAX_DISCOVERED: usize = 16;

/// Maximum number of tracked devices.
pub const MAX_TRACKED_DEVICES: usize = 8;

/// Interval at which the connection's RSSI is polled for changes (ms).
pub const RSSI_POLL_INTERVAL_MS: u64 = 100;

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const BLE_ADV_INTERVAL: u32 = 160;

/// Which characteristic groups the service exposes.
///
/// The tracked-device flag covers both the list and the command
/// characteristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeatureConfig {
    pub signal_strength: bool,
    pub scan_control: bool,
    pub peripheral_list: bool,
    pub tracked_devices: bool,
}

impl FeatureConfig {
    /// Every characteristic group enabled.
    pub const fn all() -> Self {
        Self {
            signal_strength: true,
            scan_control: true,
            peripheral_list: true,
            tracked_devices: true,
        }
    }

    /// No characteristic at all. The service still exists but is empty.
    pub const fn none() -> Self {
        Self {
            signal_strength: false,
            scan_control: false,
            peripheral_list: false,
            tracked_devices: false,
        }
    }

    /// Flags selected by the `char-*` cargo features.
    pub const fn from_build() -> Self {
        Self {
            signal_strength: cfg!(feature = "char-rssi"),
            scan_control: cfg!(feature = "char-scan-devices"),
            peripheral_list: cfg!(feature = "char-peripheral-list"),
            tracked_devices: cfg!(feature = "char-track-devices"),
        }
    }
}

/// Full service configuration, immutable after construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceConfig {
    pub features: FeatureConfig,
    /// Map the smoothed RSSI onto the indicator output.
    pub rssi_indicator: bool,
    /// Tick frequency (Hz).
    pub update_frequency_hz: u32,
}

impl ServiceConfig {
    pub const fn new(features: FeatureConfig) -> Self {
        Self {
            features,
            rssi_indicator: false,
            update_frequency_hz: LOCALIZATION_SERVICE_UPDATE_FREQUENCY,
        }
    }

    pub const fn with_rssi_indicator(mut self, enabled: bool) -> Self {
        self.rssi_indicator = enabled;
        self
    }

    pub const fn from_build() -> Self {
        Self::new(FeatureConfig::from_build()).with_rssi_indicator(cfg!(feature = "pwm-on-rssi"))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Full 128-bit identity of a characteristic inside the service namespace.
pub const fn namespaced_uuid(alias: u16) -> [u8; 16] {
    let mut uuid = SERVICE_BASE_UUID;
    let le = alias.to_le_bytes();
    uuid[12] = le[0];
    uuid[13] = le[1];
    uuid
}
