//! Shared scratch buffer.
//!
//! Producers (scanner, tracker) assemble their list payloads here before
//! handing them to the event bus. Only one lease may be live at a time;
//! a second concurrent lease is refused with [`Error::ScratchBusy`].
//!
//! The buffer is not `Sync`. On target it sits inside an
//! `embassy_sync::blocking_mutex::Mutex` so that every access happens
//! within a critical section.

use core::cell::{RefCell, RefMut};
use core::ops::{Deref, DerefMut};

use heapless::Vec;

use crate::config::SCRATCH_BUFFER_SIZE;
use crate::error::{Error, Result};

pub struct ScratchBuffer {
    data: RefCell<Vec<u8, SCRATCH_BUFFER_SIZE>>,
}

impl ScratchBuffer {
    pub const fn new() -> Self {
        Self {
            data: RefCell::new(Vec::new()),
        }
    }

    /// Maximum number of bytes a lease can hold.
    pub const fn capacity(&self) -> usize {
        SCRATCH_BUFFER_SIZE
    }

    /// Borrow the buffer exclusively. The contents are cleared.
    pub fn lease(&self) -> Result<ScratchLease<'_>> {
        let mut data = self.data.try_borrow_mut().map_err(|_| Error::ScratchBusy)?;
        data.clear();
        Ok(ScratchLease { data })
    }

    pub fn is_leased(&self) -> bool {
        self.data.try_borrow_mut().is_err()
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to the scratch buffer, released on drop.
pub struct ScratchLease<'a> {
    data: RefMut<'a, Vec<u8, SCRATCH_BUFFER_SIZE>>,
}

impl ScratchLease<'_> {
    /// Append bytes, failing without partial writes when they do not fit.
    pub fn push_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.data
            .extend_from_slice(bytes)
            .map_err(|_| Error::BufferOverflow)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Deref for ScratchLease<'_> {
    type Target = Vec<u8, SCRATCH_BUFFER_SIZE>;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for ScratchLease<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
