//! Unified error type for the localization service core.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.

use crate::service::CharacteristicId;

/// Top-level error type used across the service core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A producer handed over more bytes than the characteristic can hold.
    PayloadTooLarge {
        target: CharacteristicId,
        len: usize,
        max: usize,
    },

    /// A write arrived for a characteristic that does not accept writes.
    NotWritable(CharacteristicId),

    /// The shared scratch buffer is already leased by another update.
    ScratchBusy,

    /// A producer's payload does not fit in the scratch buffer.
    BufferOverflow,

    /// A command payload has the wrong length.
    MalformedCommand { len: usize },

    /// A fixed-capacity device list is full.
    ListFull,
}

/// Failures reported by the GATT transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No central is connected.
    NotConnected,
    /// The value could not be stored in the GATT table.
    SetValueFailed,
    /// The notification was not queued.
    NotifyFailed,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
