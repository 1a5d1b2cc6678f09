//! Tracked-device collaborator.
//!
//! Peer writes on the tracked-device characteristic toggle a device in or
//! out of the list; every change republishes the whole list.

use crate::ble::bus::{publish_with_scratch, EventPublisher};
use defmt::{info, warn};
use indoorloc::devices::{TrackedDevice, TrackedDevices};
use indoorloc::service::{DeviceTracker, EventKind};

pub struct Tracker {
    devices: TrackedDevices,
    publisher: EventPublisher,
}

impl Tracker {
    pub fn new(publisher: EventPublisher) -> Self {
        Self {
            devices: TrackedDevices::new(),
            publisher,
        }
    }

    /// Publish the current list, e.g. the empty one at startup.
    pub fn publish(&self) {
        let _ = publish_with_scratch(&self.publisher, EventKind::TrackedDevicesChanged, |out| {
            self.devices.encode(out)
        });
    }
}

impl DeviceTracker for Tracker {
    fn handle_tracked_device_command(&mut self, payload: &[u8]) {
        let device = match TrackedDevice::from_command(payload) {
            Ok(device) => device,
            Err(e) => {
                warn!("tracked device command rejected: {}", e);
                return;
            }
        };
        match self.devices.toggle(device) {
            Ok(change) => {
                info!(
                    "tracked {:02x}: {} ({} total)",
                    device.address,
                    change,
                    self.devices.len()
                );
                self.publish();
            }
            Err(e) => warn!("tracked device not added: {}", e),
        }
    }
}
