//! Command dispatcher for opcodes issued by the localization service.

use defmt::{info, warn, Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use indoorloc::config::CMD_SCAN_DEVICES;
use indoorloc::service::CommandDispatcher;

/// Commands for the scanner task.
#[derive(Clone, Copy, PartialEq, Eq, Format)]
pub enum ScanCommand {
    /// Open a scan window.
    Start,
    /// Close the running window early and publish what was found.
    Stop,
}

pub type ScanCommandChannel = Channel<CriticalSectionRawMutex, ScanCommand, 2>;

pub struct CommandHandler {
    scan_tx: Sender<'static, CriticalSectionRawMutex, ScanCommand, 2>,
}

impl CommandHandler {
    pub fn new(scan_tx: Sender<'static, CriticalSectionRawMutex, ScanCommand, 2>) -> Self {
        Self { scan_tx }
    }
}

impl CommandDispatcher for CommandHandler {
    fn handle_command(&mut self, opcode: u8, payload: &[u8]) {
        match opcode {
            CMD_SCAN_DEVICES => {
                let Some(&flag) = payload.first() else {
                    warn!("scan command without payload");
                    return;
                };
                let cmd = if flag != 0 {
                    ScanCommand::Start
                } else {
                    ScanCommand::Stop
                };
                info!("scan command: {}", cmd);
                // try_send: we run inside the GATT callback and must not block.
                if self.scan_tx.try_send(cmd).is_err() {
                    warn!("scan command queue full - dropping {}", cmd);
                }
            }
            other => warn!("unhandled command opcode {}", other),
        }
    }
}
