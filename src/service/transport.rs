//! Seam to the BLE stack that owns the GATT table.

use crate::error::TransportError;
use crate::service::characteristic::CharacteristicId;
use crate::service::events::ConnHandle;

/// Operations the service needs from the BLE stack.
///
/// All calls are fire-and-forget from the service's point of view: no
/// delivery confirmation is tracked.
pub trait GattTransport {
    /// Store `value` in the GATT table so reads by the peer see it.
    fn set_value(&mut self, target: CharacteristicId, value: &[u8]) -> Result<(), TransportError>;

    /// Push `value` to the subscribed peer.
    fn notify(&mut self, target: CharacteristicId, value: &[u8]) -> Result<(), TransportError>;

    /// Begin continuous RSSI sampling on `conn`.
    fn start_rssi(&mut self, conn: ConnHandle);

    /// Stop RSSI sampling on `conn`.
    fn stop_rssi(&mut self, conn: ConnHandle);
}

impl<T: GattTransport + ?Sized> GattTransport for &mut T {
    fn set_value(&mut self, target: CharacteristicId, value: &[u8]) -> Result<(), TransportError> {
        (**self).set_value(target, value)
    }

    fn notify(&mut self, target: CharacteristicId, value: &[u8]) -> Result<(), TransportError> {
        (**self).notify(target, value)
    }

    fn start_rssi(&mut self, conn: ConnHandle) {
        (**self).start_rssi(conn)
    }

    fn stop_rssi(&mut self, conn: ConnHandle) {
        (**self).stop_rssi(conn)
    }
}
