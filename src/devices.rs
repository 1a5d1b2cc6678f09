//! Device lists kept by the firmware collaborators.
//!
//! The scanner fills a [`ScannedDevices`] list during a scan window, the
//! tracker edits [`TrackedDevices`] from peer commands. Both serialize into
//! the shared scratch buffer before being published:
//!
//! ```text
//! scanned: [count] ([addr; 6] [rssi] [occurrences])*
//! tracked: [count] ([addr; 6] [rssi threshold])*
//! ```
//!
//! Addresses are in the SoftDevice byte order (little-endian).

use heapless::Vec;

use crate::config::{BLE_MAX_DISCOVERED, MAX_TRACKED_DEVICES};
use crate::error::{Error, Result};
use crate::service::ScratchLease;

pub type Address = [u8; 6];

/// Length of one tracked-device command: address plus RSSI threshold.
pub const TRACKED_COMMAND_LEN: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScannedDevice {
    pub address: Address,
    /// Most recent RSSI (dBm).
    pub rssi: i8,
    /// Advertisements seen during the window, saturating.
    pub occurrences: u8,
}

#[derive(Default)]
pub struct ScannedDevices {
    devices: Vec<ScannedDevice, BLE_MAX_DISCOVERED>,
}

impl ScannedDevices {
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Record one advertisement.
    ///
    /// Returns `false` when the address is new and the list is already full.
    pub fn record(&mut self, address: Address, rssi: i8) -> bool {
        if let Some(known) = self.devices.iter_mut().find(|d| d.address == address) {
            known.rssi = rssi;
            known.occurrences = known.occurrences.saturating_add(1);
            return true;
        }
        self.devices
            .push(ScannedDevice {
                address,
                rssi,
                occurrences: 1,
            })
            .is_ok()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn is_full(&self) -> bool {
        self.devices.is_full()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScannedDevice> {
        self.devices.iter()
    }

    pub fn encode(&self, out: &mut ScratchLease<'_>) -> Result<()> {
        out.push_slice(&[self.devices.len() as u8])?;
        for device in &self.devices {
            out.push_slice(&device.address)?;
            out.push_slice(&[device.rssi as u8, device.occurrences])?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackedDevice {
    pub address: Address,
    /// RSSI above which the device counts as present (dBm).
    pub rssi_threshold: i8,
}

impl TrackedDevice {
    /// Parse a tracked-device command.
    pub fn from_command(payload: &[u8]) -> Result<Self> {
        if payload.len() != TRACKED_COMMAND_LEN {
            return Err(Error::MalformedCommand { len: payload.len() });
        }
        let mut address = [0u8; 6];
        address.copy_from_slice(&payload[..6]);
        Ok(Self {
            address,
            rssi_threshold: payload[6] as i8,
        })
    }
}

/// Outcome of [`TrackedDevices::toggle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackerChange {
    Added,
    Removed,
}

#[derive(Default)]
pub struct TrackedDevices {
    devices: Vec<TrackedDevice, MAX_TRACKED_DEVICES>,
}

impl TrackedDevices {
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Add the device, or remove it when its address is already tracked.
    pub fn toggle(&mut self, device: TrackedDevice) -> Result<TrackerChange> {
        if let Some(pos) = self.devices.iter().position(|d| d.address == device.address) {
            self.devices.remove(pos);
            return Ok(TrackerChange::Removed);
        }
        self.devices.push(device).map_err(|_| Error::ListFull)?;
        Ok(TrackerChange::Added)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.devices.iter().any(|d| &d.address == address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn encode(&self, out: &mut ScratchLease<'_>) -> Result<()> {
        out.push_slice(&[self.devices.len() as u8])?;
        for device in &self.devices {
            out.push_slice(&device.address)?;
            out.push_slice(&[device.rssi_threshold as u8])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SCRATCH_BUFFER_SIZE;
    use crate::service::ScratchBuffer;

    const A: Address = [1, 2, 3, 4, 5, 6];
    const B: Address = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

    #[test]
    fn repeated_advertisements_update_one_entry() {
        let mut list = ScannedDevices::new();
        assert!(list.record(A, -60));
        assert!(list.record(B, -75));
        assert!(list.record(A, -58));
        assert_eq!(list.len(), 2);

        let a = list.iter().find(|d| d.address == A).unwrap();
        assert_eq!(a.rssi, -58);
        assert_eq!(a.occurrences, 2);
    }

    #[test]
    fn full_scan_list_still_updates_known_devices() {
        let mut list = ScannedDevices::new();
        for i in 0..BLE_MAX_DISCOVERED {
            assert!(list.record([i as u8, 0, 0, 0, 0, 0], -70));
        }
        assert!(list.is_full());
        assert!(!list.record(B, -40));
        assert!(list.record([0, 0, 0, 0, 0, 0], -41));
        assert_eq!(list.len(), BLE_MAX_DISCOVERED);
    }

    #[test]
    fn occurrences_saturate() {
        let mut list = ScannedDevices::new();
        for _ in 0..300 {
            list.record(A, -50);
        }
        assert_eq!(list.iter().next().unwrap().occurrences, u8::MAX);
    }

    #[test]
    fn scanned_list_layout() {
        let mut list = ScannedDevices::new();
        list.record(A, -60);
        let scratch = ScratchBuffer::new();
        let mut lease = scratch.lease().unwrap();
        list.encode(&mut lease).unwrap();
        assert_eq!(lease.as_slice(), &[1, 1, 2, 3, 4, 5, 6, (-60i8) as u8, 1]);
    }

    #[test]
    fn full_scan_list_fits_scratch() {
        let mut list = ScannedDevices::new();
        for i in 0..BLE_MAX_DISCOVERED {
            list.record([i as u8; 6], -70);
        }
        let scratch = ScratchBuffer::new();
        let mut lease = scratch.lease().unwrap();
        list.encode(&mut lease).unwrap();
        assert_eq!(lease.len(), 1 + BLE_MAX_DISCOVERED * 8);
        assert!(lease.len() <= SCRATCH_BUFFER_SIZE);
    }

    #[test]
    fn encode_overflow_is_reported() {
        let mut list = ScannedDevices::new();
        list.record(A, -60);
        let scratch = ScratchBuffer::new();
        let mut lease = scratch.lease().unwrap();
        lease.push_slice(&[0u8; SCRATCH_BUFFER_SIZE - 4]).unwrap();
        assert_eq!(list.encode(&mut lease), Err(Error::BufferOverflow));
    }

    #[test]
    fn tracked_command_must_be_seven_bytes() {
        assert_eq!(
            TrackedDevice::from_command(&[1, 2, 3]),
            Err(Error::MalformedCommand { len: 3 })
        );
        let device = TrackedDevice::from_command(&[1, 2, 3, 4, 5, 6, 0xB0]).unwrap();
        assert_eq!(device.address, A);
        assert_eq!(device.rssi_threshold, -80);
    }

    #[test]
    fn same_address_toggles_membership() {
        let mut tracked = TrackedDevices::new();
        let device = TrackedDevice {
            address: A,
            rssi_threshold: -70,
        };
        assert_eq!(tracked.toggle(device), Ok(TrackerChange::Added));
        assert!(tracked.contains(&A));

        // The threshold is not part of the identity.
        let again = TrackedDevice {
            rssi_threshold: -50,
            ..device
        };
        assert_eq!(tracked.toggle(again), Ok(TrackerChange::Removed));
        assert!(tracked.is_empty());
    }

    #[test]
    fn tracked_list_capacity() {
        let mut tracked = TrackedDevices::new();
        for i in 0..MAX_TRACKED_DEVICES {
            let device = TrackedDevice {
                address: [i as u8; 6],
                rssi_threshold: -70,
            };
            assert_eq!(tracked.toggle(device), Ok(TrackerChange::Added));
        }
        let extra = TrackedDevice {
            address: B,
            rssi_threshold: -70,
        };
        assert_eq!(tracked.toggle(extra), Err(Error::ListFull));
        assert_eq!(tracked.len(), MAX_TRACKED_DEVICES);
    }

    #[test]
    fn tracked_list_layout() {
        let mut tracked = TrackedDevices::new();
        let scratch = ScratchBuffer::new();
        {
            let mut lease = scratch.lease().unwrap();
            tracked.encode(&mut lease).unwrap();
            assert_eq!(lease.as_slice(), &[0]);
        }
        tracked
            .toggle(TrackedDevice {
                address: B,
                rssi_threshold: -65,
            })
            .unwrap();
        let mut lease = scratch.lease().unwrap();
        tracked.encode(&mut lease).unwrap();
        assert_eq!(
            lease.as_slice(),
            &[1, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, (-65i8) as u8]
        );
    }
}
