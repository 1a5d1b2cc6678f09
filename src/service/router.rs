//! Write router - turns an inbound write into exactly one external action.
//!
//! Handlers are plain `fn` values bound per characteristic at
//! construction. They run synchronously inside the write callback and
//! only ever see the characteristic's own stored value, never the
//! transport's transient write buffer.

use crate::config::CMD_SCAN_DEVICES;
use crate::service::characteristic::Characteristic;

/// Executes domain commands (e.g. "scan for devices").
pub trait CommandDispatcher {
    /// Opcode interpretation is entirely up to the dispatcher.
    fn handle_command(&mut self, opcode: u8, payload: &[u8]);
}

/// Owns the list of tracked devices.
pub trait DeviceTracker {
    fn handle_tracked_device_command(&mut self, payload: &[u8]);
}

/// Collaborators reachable from a write handler.
///
/// The borrowed payloads are only valid for the duration of the call;
/// implementations copy what they need to keep.
pub struct WriteTargets<'a> {
    pub commands: &'a mut dyn CommandDispatcher,
    pub tracker: &'a mut dyn DeviceTracker,
}

impl<'a> WriteTargets<'a> {
    pub fn new(commands: &'a mut dyn CommandDispatcher, tracker: &'a mut dyn DeviceTracker) -> Self {
        Self { commands, tracker }
    }
}

/// Handler bound to a writable characteristic.
pub type WriteHandler = fn(&Characteristic, &mut WriteTargets<'_>);

/// Scan control: forward the single written byte as a scan command.
pub fn forward_scan_command(characteristic: &Characteristic, targets: &mut WriteTargets<'_>) {
    let value = characteristic.value();
    let Some(byte) = value.first() else {
        return;
    };
    debug!("scan control write: {}", byte);
    targets
        .commands
        .handle_command(CMD_SCAN_DEVICES, core::slice::from_ref(byte));
}

/// Tracked device command: hand the stored buffer to the tracker.
pub fn forward_tracker_command(characteristic: &Characteristic, targets: &mut WriteTargets<'_>) {
    debug!("tracked device write: {} bytes", characteristic.len());
    targets
        .tracker
        .handle_tracked_device_command(characteristic.value());
}
