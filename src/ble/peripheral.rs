//! Peripheral role - advertising, the connection loop and the service pump.
//!
//! A single task owns the localization service. Three futures share it
//! through a `RefCell`; none of them holds a borrow across an `.await`,
//! so the service is never entered re-entrantly:
//!
//! - the connection loop (advertise, GATT writes, RSSI polling)
//! - the tick loop (indicator update at the service frequency)
//! - the bus loop (list-changed events from scanner and tracker)

use core::cell::RefCell;

use crate::ble::bus::EventSubscriber;
use crate::ble::commands::CommandHandler;
use crate::ble::gatt::{LocalizationServer, ServerEvent, SoftdeviceTransport};
use crate::ble::tracker::Tracker;
use defmt::{info, warn};
use embassy_futures::select::{select, select3, Either3};
use embassy_sync::pubsub::WaitResult;
use embassy_time::{Duration, Instant, Timer};
use indoorloc::config::{BLE_ADV_INTERVAL, DEVICE_NAME, RSSI_POLL_INTERVAL_MS, SERVICE_BASE_UUID};
use indoorloc::service::{Actuator, BleEvent, TickTimer, WriteTargets};
use indoorloc::IndoorLocalizationService;
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::Softdevice;

type Service = IndoorLocalizationService<SoftdeviceTransport>;

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_128(ServiceList::Complete, &[SERVICE_BASE_UUID])
    .build();

static SCAN_DATA: LegacyAdvertisementPayload =
    LegacyAdvertisementBuilder::new().full_name(DEVICE_NAME).build();

/// Everything the service reaches on behalf of the peer.
pub struct Collaborators {
    pub commands: CommandHandler,
    pub tracker: Tracker,
}

/// Run the localization service forever.
pub async fn run<A: Actuator>(
    sd: &'static Softdevice,
    server: &'static LocalizationServer,
    service: Service,
    collaborators: Collaborators,
    mut indicator: A,
    mut events: EventSubscriber,
) -> ! {
    let service = RefCell::new(service);
    let collaborators = RefCell::new(collaborators);

    collaborators.borrow().tracker.publish();

    match select3(
        serve(sd, server, &service, &collaborators),
        tick(&service, &mut indicator),
        forward_events(&service, &mut events),
    )
    .await
    {
        Either3::First(never) | Either3::Second(never) | Either3::Third(never) => never,
    }
}

async fn serve(
    sd: &'static Softdevice,
    server: &'static LocalizationServer,
    service: &RefCell<Service>,
    collaborators: &RefCell<Collaborators>,
) -> ! {
    let config = peripheral::Config {
        interval: BLE_ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        info!("advertising as {}", DEVICE_NAME);
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("advertising failed: {}", e);
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };
        let Some(handle) = conn.handle() else {
            continue;
        };

        {
            let mut svc = service.borrow_mut();
            svc.transport_mut().attach(conn.clone());
            svc.on_ble_event(BleEvent::Connected(handle));
        }

        let gatt = gatt_server::run(&conn, server, |event| {
            on_server_event(service, collaborators, event)
        });
        let _ = select(gatt, poll_rssi(&conn, service)).await;

        let mut svc = service.borrow_mut();
        svc.on_ble_event(BleEvent::Disconnected(handle));
        svc.transport_mut().detach();
    }
}

fn on_server_event(
    service: &RefCell<Service>,
    collaborators: &RefCell<Collaborators>,
    event: ServerEvent,
) {
    let mut svc = service.borrow_mut();
    match event {
        ServerEvent::Write { target, data } => {
            let mut collaborators = collaborators.borrow_mut();
            let Collaborators { commands, tracker } = &mut *collaborators;
            let mut targets = WriteTargets::new(commands, tracker);
            if let Err(e) = svc.on_write(target, &data, &mut targets) {
                warn!("write on {} rejected: {}", target, e);
            }
        }
        ServerEvent::Subscription { target, enabled } => {
            svc.on_ble_event(BleEvent::Subscription { target, enabled });
        }
    }
}

/// The SoftDevice keeps the latest RSSI; forward it whenever it changes.
async fn poll_rssi(conn: &Connection, service: &RefCell<Service>) -> ! {
    let mut last = None;
    loop {
        Timer::after(Duration::from_millis(RSSI_POLL_INTERVAL_MS)).await;
        let rssi = conn.rssi();
        if rssi == last {
            continue;
        }
        last = rssi;
        if let Some(raw) = rssi {
            service
                .borrow_mut()
                .on_ble_event(BleEvent::SignalStrengthSample(raw));
        }
    }
}

/// Single-shot timer: remembers when the next tick is due.
struct NextTick {
    deadline: Instant,
}

impl TickTimer for NextTick {
    fn start(&mut self, period_ms: u32) {
        self.deadline = Instant::now() + Duration::from_millis(period_ms as u64);
    }
}

async fn tick<A: Actuator>(service: &RefCell<Service>, indicator: &mut A) -> ! {
    let mut timer = NextTick {
        deadline: Instant::now(),
    };
    service.borrow().start_ticking(&mut timer);
    loop {
        Timer::at(timer.deadline).await;
        service.borrow_mut().tick(indicator, &mut timer);
    }
}

async fn forward_events(service: &RefCell<Service>, events: &mut EventSubscriber) -> ! {
    loop {
        match events.next_message().await {
            WaitResult::Message(event) => {
                if let Err(e) = service.borrow_mut().handle_event(&event.as_domain_event()) {
                    warn!("event {} not published: {}", event.code, e);
                }
            }
            WaitResult::Lagged(missed) => warn!("event bus lagged, {} events lost", missed),
        }
    }
}
