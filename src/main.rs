//! indoorloc - indoor localization BLE peripheral for the nRF52840.
//!
//! Architecture (Embassy async tasks):
//!
//! ```text
//!  ┌─────────────────────┐   ScanCommand    ┌───────────────┐
//!  │  localization_task  │ ───────────────► │ scanner_task  │
//!  │  (GATT + service)   │                  │ (BLE central) │
//!  └─────────────────────┘                  └───────────────┘
//!        ▲        │ tracker                        │
//!        │        ▼                                │
//!        └──────── EVENT_BUS (list-changed) ◄──────┘
//! ```
//!
//! The SoftDevice runs in its own task. The localization task owns the
//! service and the PWM indicator.

#![no_std]
#![no_main]

mod ble;
mod indicator;

use ble::bus::{EventBus, EventPublisher, EventSubscriber, SCRATCH};
use ble::commands::{CommandHandler, ScanCommand, ScanCommandChannel};
use ble::gatt::{LocalizationServer, SoftdeviceTransport};
use ble::peripheral::Collaborators;
use ble::tracker::Tracker;
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::Priority;
use embassy_nrf::peripherals::PWM0;
use embassy_nrf::pwm::SimplePwm;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use embassy_sync::pubsub::PubSubChannel;
use indicator::PwmIndicator;
use indoorloc::service::CharacteristicRegistry;
use indoorloc::{IndoorLocalizationService, ServiceConfig};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

static EVENT_BUS: EventBus = PubSubChannel::new();
static SCAN_COMMANDS: ScanCommandChannel = Channel::new();
static SERVER: StaticCell<LocalizationServer> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn scanner_task(
    sd: &'static Softdevice,
    commands: Receiver<'static, CriticalSectionRawMutex, ScanCommand, 2>,
    publisher: EventPublisher,
) -> ! {
    ble::scanner::run(sd, commands, publisher).await
}

#[embassy_executor::task]
async fn localization_task(
    sd: &'static Softdevice,
    server: &'static LocalizationServer,
    service: IndoorLocalizationService<SoftdeviceTransport>,
    collaborators: Collaborators,
    indicator: PwmIndicator<'static, PWM0>,
    events: EventSubscriber,
) -> ! {
    ble::peripheral::run(sd, server, service, collaborators, indicator, events).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("indoorloc starting");

    // The SoftDevice reserves priorities 0, 1 and 4.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let sd = Softdevice::enable(&ble::softdevice_config());

    // GATT registration needs the SoftDevice exclusively, before it runs.
    let service_config = ServiceConfig::from_build();
    let registry = SCRATCH.lock(|scratch| {
        CharacteristicRegistry::initialize(&service_config.features, scratch)
    });
    let server: &'static LocalizationServer =
        SERVER.init(unwrap!(LocalizationServer::register(sd, &registry)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    let service = IndoorLocalizationService::with_registry(
        service_config,
        registry,
        SoftdeviceTransport::new(sd, server),
    );
    let collaborators = Collaborators {
        commands: CommandHandler::new(SCAN_COMMANDS.sender()),
        tracker: Tracker::new(unwrap!(EVENT_BUS.publisher())),
    };
    let indicator = PwmIndicator::new(SimplePwm::new_1ch(p.PWM0, p.P0_13));
    let events = unwrap!(EVENT_BUS.subscriber());

    unwrap!(spawner.spawn(scanner_task(
        sd,
        SCAN_COMMANDS.receiver(),
        unwrap!(EVENT_BUS.publisher()),
    )));
    unwrap!(spawner.spawn(localization_task(
        sd,
        server,
        service,
        collaborators,
        indicator,
        events,
    )));

    info!("all tasks spawned");
}
