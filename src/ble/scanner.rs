//! BLE GAP scanner - discovers nearby peripherals on request.
//!
//! Uses the SoftDevice Central-role scanning API while the peripheral link
//! stays up. A window is opened by a [`ScanCommand::Start`] and closes after
//! `BLE_SCAN_DURATION_SECS`, when the list is full, or on
//! [`ScanCommand::Stop`]. The result goes out on the event bus as
//! `ScannedDevicesChanged`.

use crate::ble::bus::{publish_with_scratch, EventPublisher};
use crate::ble::commands::ScanCommand;
use crate::ble::BleError;
use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Instant};
use indoorloc::config::BLE_SCAN_DURATION_SECS;
use indoorloc::devices::ScannedDevices;
use indoorloc::service::EventKind;
use nrf_softdevice::ble::central::{self, ScanError};
use nrf_softdevice::Softdevice;

type CommandReceiver = Receiver<'static, CriticalSectionRawMutex, ScanCommand, 2>;

/// Scanner loop: wait for a start command, scan, publish, repeat.
pub async fn run(sd: &'static Softdevice, commands: CommandReceiver, publisher: EventPublisher) -> ! {
    let mut found = ScannedDevices::new();
    loop {
        if commands.receive().await != ScanCommand::Start {
            continue;
        }
        found.clear();
        if let Err(e) = scan(sd, &commands, &mut found).await {
            warn!("BLE scan ended with error: {}", e);
        }
        info!("BLE scan complete - {} devices found", found.len());
        let _ = publish_with_scratch(&publisher, EventKind::ScannedDevicesChanged, |out| {
            found.encode(out)
        });
    }
}

async fn scan(
    sd: &Softdevice,
    commands: &CommandReceiver,
    found: &mut ScannedDevices,
) -> Result<(), BleError> {
    info!("BLE scan starting ({} s window)", BLE_SCAN_DURATION_SECS);

    let config = central::ScanConfig {
        // Timeout is in 10 ms units.
        timeout: (BLE_SCAN_DURATION_SECS * 100) as u16,
        ..Default::default()
    };

    let deadline = Instant::now() + Duration::from_secs(BLE_SCAN_DURATION_SECS);

    let window = central::scan(sd, &config, |params| {
        if Instant::now() > deadline {
            return Some(());
        }

        let address = params.peer_addr.addr;
        if !found.record(address, params.rssi) {
            // Buffer full - stop early
            return Some(());
        }
        None
    });

    match select(window, wait_for_stop(commands)).await {
        Either::First(Ok(())) => Ok(()),
        Either::First(Err(ScanError::Timeout)) => Ok(()),
        Either::First(Err(ScanError::Raw(_))) => Err(BleError::ScanFailed),
        Either::Second(()) => {
            info!("BLE scan stopped by peer");
            Ok(())
        }
    }
}

async fn wait_for_stop(commands: &CommandReceiver) {
    while commands.receive().await != ScanCommand::Stop {
        debug!("scan start ignored, window already open");
    }
}
