//! Recording fakes for the service collaborators (host tests only).

use crate::error::TransportError;
use crate::service::characteristic::CharacteristicId;
use crate::service::events::ConnHandle;
use crate::service::router::{CommandDispatcher, DeviceTracker};
use crate::service::rssi::Actuator;
use crate::service::tick::TickTimer;
use crate::service::transport::GattTransport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportCall {
    SetValue(CharacteristicId, Vec<u8>),
    Notify(CharacteristicId, Vec<u8>),
    StartRssi(ConnHandle),
    StopRssi(ConnHandle),
}

#[derive(Default)]
pub struct RecordingTransport {
    pub calls: Vec<TransportCall>,
    pub fail_notify: bool,
}

impl RecordingTransport {
    pub fn notify_count(&self, target: CharacteristicId) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, TransportCall::Notify(id, _) if *id == target))
            .count()
    }
}

impl GattTransport for RecordingTransport {
    fn set_value(&mut self, target: CharacteristicId, value: &[u8]) -> Result<(), TransportError> {
        self.calls.push(TransportCall::SetValue(target, value.to_vec()));
        Ok(())
    }

    fn notify(&mut self, target: CharacteristicId, value: &[u8]) -> Result<(), TransportError> {
        if self.fail_notify {
            return Err(TransportError::NotifyFailed);
        }
        self.calls.push(TransportCall::Notify(target, value.to_vec()));
        Ok(())
    }

    fn start_rssi(&mut self, conn: ConnHandle) {
        self.calls.push(TransportCall::StartRssi(conn));
    }

    fn stop_rssi(&mut self, conn: ConnHandle) {
        self.calls.push(TransportCall::StopRssi(conn));
    }
}

#[derive(Default)]
pub struct RecordingDispatcher {
    pub calls: Vec<(u8, Vec<u8>)>,
}

impl CommandDispatcher for RecordingDispatcher {
    fn handle_command(&mut self, opcode: u8, payload: &[u8]) {
        self.calls.push((opcode, payload.to_vec()));
    }
}

#[derive(Default)]
pub struct RecordingTracker {
    pub calls: Vec<Vec<u8>>,
}

impl DeviceTracker for RecordingTracker {
    fn handle_tracked_device_command(&mut self, payload: &[u8]) {
        self.calls.push(payload.to_vec());
    }
}

#[derive(Default)]
pub struct RecordingActuator {
    pub level: u8,
    pub changes: usize,
}

impl Actuator for RecordingActuator {
    fn level(&self) -> u8 {
        self.level
    }

    fn set_level(&mut self, level: u8) {
        self.level = level;
        self.changes += 1;
    }
}

#[derive(Default)]
pub struct RecordingTimer {
    pub starts: Vec<u32>,
}

impl TickTimer for RecordingTimer {
    fn start(&mut self, period_ms: u32) {
        self.starts.push(period_ms);
    }
}
