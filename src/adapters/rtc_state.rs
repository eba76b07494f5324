//! Cycle state in RTC slow memory.
//!
//! A fixed-size record survives deep sleep in `.rtc.data`. It carries a
//! magic word and a length prefix ahead of the postcard-encoded
//! [`PersistedCycleState`], so memory left over from a different firmware or
//! a partially written record decodes as "no state" instead of garbage.
//!
//! A power-on or brown-out wake ignores the record entirely: RTC memory did
//! not survive, and the cold default applies (this is also what clears the
//! auto-fill lockout on a power cycle).

use log::{debug, info, warn};

use crate::app::ports::{CycleStateStore, StorageError};
use crate::cycle_state::PersistedCycleState;
use crate::power::WakeReason;

const RECORD_MAGIC: u32 = 0x544C_4B31; // "TLK1"
const RECORD_CAPACITY: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct RtcRecord {
    magic: u32,
    len: u8,
    bytes: [u8; RECORD_CAPACITY],
}

impl RtcRecord {
    pub const EMPTY: Self = Self {
        magic: 0,
        len: 0,
        bytes: [0; RECORD_CAPACITY],
    };

    pub fn encode(state: &PersistedCycleState) -> Result<Self, StorageError> {
        let mut bytes = [0u8; RECORD_CAPACITY];
        let used = postcard::to_slice(state, &mut bytes)
            .map_err(|e| match e {
                postcard::Error::SerializeBufferFull => StorageError::Full,
                _ => StorageError::Encode,
            })?
            .len();
        Ok(Self {
            magic: RECORD_MAGIC,
            len: used as u8,
            bytes,
        })
    }

    pub fn decode(&self) -> Option<PersistedCycleState> {
        if self.magic != RECORD_MAGIC || usize::from(self.len) > RECORD_CAPACITY {
            return None;
        }
        postcard::from_bytes(&self.bytes[..usize::from(self.len)]).ok()
    }
}

#[cfg(target_os = "espidf")]
#[unsafe(link_section = ".rtc.data")]
static mut RTC_RECORD: RtcRecord = RtcRecord::EMPTY;

pub struct RtcStateStore {
    #[cfg(not(target_os = "espidf"))]
    record: RtcRecord,
}

impl Default for RtcStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RtcStateStore {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            record: RtcRecord::EMPTY,
        }
    }

    /// Start from a record left by a previous "wake". Simulation only.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_record(record: RtcRecord) -> Self {
        Self { record }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn record(&self) -> RtcRecord {
        self.record
    }

    #[cfg(target_os = "espidf")]
    fn read_record(&self) -> RtcRecord {
        // SAFETY: only the single cycle thread touches RTC_RECORD, and never
        // while a reference to it is live.
        unsafe { (&raw const RTC_RECORD).read() }
    }

    #[cfg(target_os = "espidf")]
    fn write_record(&mut self, record: RtcRecord) {
        // SAFETY: see read_record().
        unsafe { (&raw mut RTC_RECORD).write(record) }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_record(&self) -> RtcRecord {
        self.record
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_record(&mut self, record: RtcRecord) {
        self.record = record;
    }
}

impl CycleStateStore for RtcStateStore {
    fn load(&mut self, wake: WakeReason) -> PersistedCycleState {
        if wake.is_cold() {
            info!("RTC state: cold start, using defaults");
            return PersistedCycleState::default();
        }
        match self.read_record().decode() {
            Some(state) => {
                debug!("RTC state: restored {:?}", state);
                state
            }
            None => {
                warn!("RTC state: no valid record after {:?} wake, using defaults", wake);
                PersistedCycleState::default()
            }
        }
    }

    fn store(&mut self, state: &PersistedCycleState) -> Result<(), StorageError> {
        let record = RtcRecord::encode(state)?;
        self.write_record(record);
        Ok(())
    }
}
