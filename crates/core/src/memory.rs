//! Simulated memory cursor.
//!
//! A single logical `(blockCount, lastAddress)` pair per run, shared by every
//! `M{allocate}` instruction across every process. Addresses wrap at the configured
//! system memory size and are reported as 8-hex-digit zero-padded strings.

use std::sync::Mutex;

/// Thread-safe allocator returning fabricated addresses on a ring of `system_memory`
/// bytes, advancing by `block_size` bytes on each allocation.
#[derive(Debug)]
pub struct MemoryCursor {
    system_memory_kbytes: u64,
    block_size_kbytes: u64,
    state: Mutex<CursorState>,
}

#[derive(Debug, Default)]
struct CursorState {
    block_count: u64,
    last_address: u64,
}

impl MemoryCursor {
    /// Creates a cursor starting at address zero.
    #[must_use]
    pub fn new(system_memory_kbytes: u64, block_size_kbytes: u64) -> Self {
        Self {
            system_memory_kbytes,
            block_size_kbytes,
            state: Mutex::new(CursorState::default()),
        }
    }

    /// Returns the next address and advances the cursor by one block, wrapping at
    /// `system_memory_kbytes`.
    pub fn allocate(&self) -> u64 {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let address = state.last_address;
        state.block_count += 1;
        state.last_address = if self.system_memory_kbytes == 0 {
            0
        } else {
            (state.last_address + self.block_size_kbytes) % self.system_memory_kbytes
        };
        address
    }

    /// Resets the cursor to address zero, as `S{finish}` does at the end of a run.
    pub fn reset(&self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.block_count = 0;
        state.last_address = 0;
    }
}

/// Formats an address as the `0x<8-hex-digit-lowercase>` form the logger expects.
#[must_use]
pub fn format_address(address: u64) -> String {
    format!("0x{:08x}", address & 0xFFFF_FFFF)
}
