//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 mainly in **Peripheral**
//! role:
//!
//! 1. **GATT server** - registers the localization service with only the
//!    characteristics enabled at build time, and adapts the SoftDevice to
//!    the service core's transport seam.
//! 2. **Peripheral** - advertises, accepts a central, and pumps GATT
//!    writes, RSSI samples, bus events and the periodic tick into the
//!    service.
//! 3. **Scanner** - Central-role scan window started remotely through the
//!    scan-control characteristic.
//! 4. **Tracker** - list of tracked devices edited through the
//!    tracked-device characteristic.
//!
//! Scanner and tracker publish their lists on the event bus defined in
//! [`bus`].

pub mod bus;
pub mod commands;
pub mod gatt;
pub mod peripheral;
pub mod scanner;
pub mod tracker;

use core::mem;

use defmt::Format;
use indoorloc::config::DEVICE_NAME;
use nrf_softdevice::raw;

/// SoftDevice-level failures.
#[derive(Debug, Clone, Copy, Format)]
pub enum BleError {
    /// Service or characteristic registration failed.
    RegisterFailed,
    /// Scan was cancelled or could not start.
    ScanFailed,
}

/// SoftDevice configuration: one peripheral link plus one central role
/// for remote-triggered scans.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 2,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 247 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 1,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}
