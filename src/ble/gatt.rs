//! GATT table for the localization service.
//!
//! The table is built at runtime with the SoftDevice `ServiceBuilder`
//! because which characteristics exist depends on the build features.
//! Only the characteristics present in the registry are registered.

use crate::ble::BleError;
use defmt::{debug, info, warn, Format};
use heapless::Vec;
use indoorloc::config::{SCRATCH_BUFFER_SIZE, SERVICE_BASE_UUID};
use indoorloc::service::{
    CharacteristicId, CharacteristicRegistry, ConnHandle, GattTransport, Properties,
};
use indoorloc::TransportError;
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{self, Attribute, Metadata};
use nrf_softdevice::ble::gatt_server::{self, CharacteristicHandles, WriteOp};
use nrf_softdevice::ble::{Connection, Uuid};
use nrf_softdevice::{raw, Softdevice};

/// Characteristic User Description descriptor.
const USER_DESCRIPTION_UUID: u16 = 0x2901;

/// CCCD bit enabling notifications.
const CCCD_NOTIFY: u8 = 0x01;

/// Writes coming out of the SoftDevice, already mapped to characteristics.
#[derive(Format)]
pub enum ServerEvent {
    Write {
        target: CharacteristicId,
        data: Vec<u8, SCRATCH_BUFFER_SIZE>,
    },
    Subscription {
        target: CharacteristicId,
        enabled: bool,
    },
}

pub struct LocalizationServer {
    handles: [Option<CharacteristicHandles>; CharacteristicId::COUNT],
}

impl LocalizationServer {
    /// Register the service and every characteristic in `registry`.
    ///
    /// Must run before the SoftDevice task starts.
    pub fn register(sd: &mut Softdevice, registry: &CharacteristicRegistry) -> Result<Self, BleError> {
        let mut handles: [Option<CharacteristicHandles>; CharacteristicId::COUNT] = Default::default();

        let mut service = ServiceBuilder::new(sd, Uuid::new_128(&SERVICE_BASE_UUID))
            .map_err(|_| BleError::RegisterFailed)?;

        for ch in registry.iter() {
            let mut attr = Attribute::new(ch.value());
            if !ch.is_fixed_len() {
                attr = attr.variable_len(ch.max_len() as u16);
            }
            let metadata = Metadata::new(softdevice_properties(ch.properties()));
            let mut builder = service
                .add_characteristic(Uuid::new_128(&ch.id().uuid()), attr, metadata)
                .map_err(|_| BleError::RegisterFailed)?;
            builder
                .add_descriptor(
                    Uuid::new_16(USER_DESCRIPTION_UUID),
                    Attribute::new(ch.name().as_bytes()),
                )
                .map_err(|_| BleError::RegisterFailed)?;
            let h = builder.build();
            debug!("{} value handle {}", ch.id(), h.value_handle);
            handles[ch.id().index()] = Some(h);
        }

        let _ = service.build();
        info!("GATT: {} characteristics registered", registry.len());
        Ok(Self { handles })
    }

    fn value_handle(&self, target: CharacteristicId) -> Option<u16> {
        self.handles[target.index()].as_ref().map(|h| h.value_handle)
    }

    fn lookup(&self, handle: u16) -> Option<(CharacteristicId, bool)> {
        CharacteristicId::ALL.iter().find_map(|&id| {
            let h = self.handles[id.index()].as_ref()?;
            if h.value_handle == handle {
                Some((id, false))
            } else if h.cccd_handle == handle {
                Some((id, true))
            } else {
                None
            }
        })
    }
}

fn softdevice_properties(p: Properties) -> characteristic::Properties {
    let mut props = characteristic::Properties::new();
    if p.read {
        props = props.read();
    }
    if p.write {
        props = props.write();
    }
    if p.notify {
        props = props.notify();
    }
    props
}

impl gatt_server::Server for LocalizationServer {
    type Event = ServerEvent;

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        let (target, is_cccd) = self.lookup(handle)?;
        if is_cccd {
            let enabled = data.first().is_some_and(|b| b & CCCD_NOTIFY != 0);
            return Some(ServerEvent::Subscription { target, enabled });
        }
        match Vec::from_slice(data) {
            Ok(data) => Some(ServerEvent::Write { target, data }),
            Err(()) => {
                warn!("{} write of {} bytes dropped", target, data.len());
                None
            }
        }
    }
}

/// [`GattTransport`] backed by the SoftDevice.
pub struct SoftdeviceTransport {
    sd: &'static Softdevice,
    server: &'static LocalizationServer,
    conn: Option<Connection>,
}

impl SoftdeviceTransport {
    pub fn new(sd: &'static Softdevice, server: &'static LocalizationServer) -> Self {
        Self {
            sd,
            server,
            conn: None,
        }
    }

    pub fn attach(&mut self, conn: Connection) {
        self.conn = Some(conn);
    }

    pub fn detach(&mut self) {
        self.conn = None;
    }
}

impl GattTransport for SoftdeviceTransport {
    fn set_value(&mut self, target: CharacteristicId, value: &[u8]) -> Result<(), TransportError> {
        let handle = self
            .server
            .value_handle(target)
            .ok_or(TransportError::SetValueFailed)?;
        gatt_server::set_value(self.sd, handle, value).map_err(|_| TransportError::SetValueFailed)
    }

    fn notify(&mut self, target: CharacteristicId, value: &[u8]) -> Result<(), TransportError> {
        let conn = self.conn.as_ref().ok_or(TransportError::NotConnected)?;
        let handle = self
            .server
            .value_handle(target)
            .ok_or(TransportError::NotifyFailed)?;
        gatt_server::notify_value(conn, handle, value).map_err(|_| TransportError::NotifyFailed)
    }

    fn start_rssi(&mut self, _conn: ConnHandle) {
        if let Some(conn) = &self.conn {
            conn.start_rssi();
        }
    }

    fn stop_rssi(&mut self, conn: ConnHandle) {
        // Fails harmlessly when the link is already gone.
        let ret = unsafe { raw::sd_ble_gap_rssi_stop(conn) };
        if ret != raw::NRF_SUCCESS {
            debug!("rssi stop on {}: {}", conn, ret);
        }
    }
}
