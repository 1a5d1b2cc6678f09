//! Library interface for indoorloc.
//!
//! Holds the indoor localization service core - characteristic registry,
//! RSSI filter, write router, event bridge and tick scheduler - as pure
//! logic that can be tested on the host (no embedded hardware required).
//!
//! Usage: `cargo test --lib` or `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and wires this core to the SoftDevice, the event bus and the PWM
//! indicator.

#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible everywhere.
mod fmt;

pub mod config;
pub mod devices;
pub mod error;
pub mod service;

pub use config::{FeatureConfig, ServiceConfig};
pub use error::{Error, Result, TransportError};
pub use service::IndoorLocalizationService;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::service::testing::*;
    use super::service::*;
    use super::*;

    // ════════════════════════════════════════════════════════════════════════
    // Feature gating
    // ════════════════════════════════════════════════════════════════════════

    fn single(flag: usize) -> FeatureConfig {
        FeatureConfig {
            signal_strength: flag == 0,
            scan_control: flag == 1,
            peripheral_list: flag == 2,
            tracked_devices: flag == 3,
        }
    }

    #[test]
    fn each_flag_alone_exposes_only_its_characteristics() {
        let expected: [&[CharacteristicId]; 4] = [
            &[CharacteristicId::SignalStrength],
            &[CharacteristicId::ScanControl],
            &[CharacteristicId::PeripheralList],
            &[
                CharacteristicId::TrackedDeviceList,
                CharacteristicId::TrackedDeviceCommand,
            ],
        ];
        for (flag, ids) in expected.iter().enumerate() {
            let scratch = ScratchBuffer::new();
            let svc = IndoorLocalizationService::new(
                ServiceConfig::new(single(flag)),
                &scratch,
                RecordingTransport::default(),
            );
            let present: Vec<CharacteristicId> = svc.registry().iter().map(|c| c.id()).collect();
            assert_eq!(present.as_slice(), *ids);
        }
    }

    #[test]
    fn disabled_features_never_see_traffic() {
        // Everything except the signal strength characteristic.
        let scratch = ScratchBuffer::new();
        let mut svc = IndoorLocalizationService::new(
            ServiceConfig::new(single(0)).with_rssi_indicator(true),
            &scratch,
            RecordingTransport::default(),
        );
        let mut commands = RecordingDispatcher::default();
        let mut tracker = RecordingTracker::default();

        svc.on_ble_event(BleEvent::Subscription {
            target: CharacteristicId::PeripheralList,
            enabled: true,
        });
        svc.handle_event(&DomainEvent::new(EventKind::ScannedDevicesChanged, &[1, 2]))
            .unwrap();
        svc.handle_event(&DomainEvent::new(EventKind::TrackedDevicesChanged, &[3]))
            .unwrap();
        svc.on_write(
            CharacteristicId::ScanControl,
            &[1],
            &mut WriteTargets::new(&mut commands, &mut tracker),
        )
        .unwrap();
        svc.on_write(
            CharacteristicId::TrackedDeviceCommand,
            &[1, 2, 3, 4, 5, 6, 0],
            &mut WriteTargets::new(&mut commands, &mut tracker),
        )
        .unwrap();

        assert!(svc.transport().calls.is_empty());
        assert!(commands.calls.is_empty());
        assert!(tracker.calls.is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Shared scratch buffer
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn list_characteristics_are_sized_by_scratch_buffer() {
        let scratch = ScratchBuffer::new();
        let svc = IndoorLocalizationService::new(
            ServiceConfig::new(FeatureConfig::all()),
            &scratch,
            RecordingTransport::default(),
        );
        for id in [
            CharacteristicId::PeripheralList,
            CharacteristicId::TrackedDeviceList,
            CharacteristicId::TrackedDeviceCommand,
        ] {
            assert_eq!(svc.registry().get(id).unwrap().max_len(), scratch.capacity());
        }
    }

    #[test]
    fn payload_staged_in_scratch_is_copied_out() {
        let scratch = ScratchBuffer::new();
        let mut svc = IndoorLocalizationService::new(
            ServiceConfig::new(FeatureConfig::all()),
            &scratch,
            RecordingTransport::default(),
        );
        {
            let mut lease = scratch.lease().unwrap();
            lease.push_slice(&[2, 0xAA, 0xBB]).unwrap();
            svc.handle_event(&DomainEvent::new(
                EventKind::ScannedDevicesChanged,
                lease.as_slice(),
            ))
            .unwrap();
        }
        // Reuse the scratch buffer for something else.
        {
            let mut lease = scratch.lease().unwrap();
            lease.push_slice(&[0xFF; 10]).unwrap();
        }
        assert_eq!(
            svc.registry()
                .get(CharacteristicId::PeripheralList)
                .unwrap()
                .value(),
            &[2, 0xAA, 0xBB]
        );
    }
}
