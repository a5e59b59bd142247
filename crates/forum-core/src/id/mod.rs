//! Snowflake ID generation
//!
//! An ID packs three fields into a non-negative `i64`, high to low:
//!
//! | field     | bits | meaning                                   |
//! |-----------|------|-------------------------------------------|
//! | timestamp | 43   | seconds since the configured start time   |
//! | sequence  | 13   | counter within one second                 |
//! | instance  | 7    | operator-chosen generator instance        |
//!
//! That allows 8192 IDs per second per instance and 128 instances.

pub mod base58;

use crate::config::SnowflakeConfig;
use crate::error::{CoreError, CoreResult};
use std::sync::Mutex;
use std::time::Duration;

pub use base58::{decode, encode};

/// Width of the per-second sequence field
pub const COUNTER_BITS: u32 = 13;

/// Width of the instance field
pub const INSTANCE_BITS: u32 = 7;

/// Exclusive upper bound of instance ids
pub const MAX_INSTANCES: i64 = 1 << INSTANCE_BITS;

const COUNTER_MASK: i64 = (1 << COUNTER_BITS) - 1;
const TIMESTAMP_SHIFT: u32 = COUNTER_BITS + INSTANCE_BITS;
const WAIT_STEP: Duration = Duration::from_millis(5);

/// Source of wall-clock seconds
pub trait Clock: Send + Sync {
    /// Current Unix time in whole seconds
    fn now_secs(&self) -> i64;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// The fields of an ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdParts {
    /// Seconds since the generator's start time
    pub seconds: i64,
    pub sequence: i64,
    pub instance: i64,
}

impl IdParts {
    /// Split an ID into its fields
    pub fn of(id: i64) -> Self {
        Self {
            seconds: id >> TIMESTAMP_SHIFT,
            sequence: (id >> INSTANCE_BITS) & COUNTER_MASK,
            instance: id & (MAX_INSTANCES - 1),
        }
    }
}

#[derive(Debug)]
struct SequenceState {
    last_secs: i64,
    sequence: i64,
}

/// Monotonic ID generator.
///
/// IDs from one generator are strictly increasing. `next` holds a lock for
/// its whole duration, including any wait for the clock to advance.
pub struct Snowflake {
    start_time: i64,
    instance_id: i64,
    clock: Box<dyn Clock>,
    state: Mutex<SequenceState>,
}

impl std::fmt::Debug for Snowflake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snowflake")
            .field("start_time", &self.start_time)
            .field("instance_id", &self.instance_id)
            .finish_non_exhaustive()
    }
}

impl Snowflake {
    /// Create a generator on the system clock
    pub fn new(start_time: i64, instance_id: i64) -> CoreResult<Self> {
        Self::with_clock(start_time, instance_id, SystemClock)
    }

    /// Create a generator from the `snowflake` config section
    pub fn from_config(config: &SnowflakeConfig) -> CoreResult<Self> {
        Self::new(config.start_time, config.instance_id)
    }

    /// Create a generator on a caller-supplied clock
    pub fn with_clock(
        start_time: i64,
        instance_id: i64,
        clock: impl Clock + 'static,
    ) -> CoreResult<Self> {
        if !(0..MAX_INSTANCES).contains(&instance_id) {
            return Err(CoreError::InvalidInstance {
                instance_id,
                max: MAX_INSTANCES,
            });
        }
        let now = clock.now_secs();
        if start_time > now {
            return Err(CoreError::FutureStartTime { start_time, now });
        }
        Ok(Self {
            start_time,
            instance_id,
            clock: Box::new(clock),
            state: Mutex::new(SequenceState {
                last_secs: i64::MIN,
                sequence: 0,
            }),
        })
    }

    pub fn instance_id(&self) -> i64 {
        self.instance_id
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Block until the clock reads later than `secs`, returning the new reading
    fn wait_past(&self, secs: i64) -> i64 {
        let mut now = self.clock.now_secs();
        while now <= secs {
            std::thread::sleep(WAIT_STEP);
            now = self.clock.now_secs();
        }
        now
    }

    /// Produce the next ID
    pub fn next(&self) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());

        let mut now = self.clock.now_secs();
        if now < state.last_secs {
            // Clock stepped backwards: hold until it catches up again.
            now = self.wait_past(state.last_secs - 1);
        }

        if now == state.last_secs {
            state.sequence = (state.sequence + 1) & COUNTER_MASK;
            if state.sequence == 0 {
                log::debug!("Snowflake sequence exhausted at {}, waiting", now);
                now = self.wait_past(now);
            }
        } else {
            state.sequence = 0;
        }
        state.last_secs = now;

        ((now - self.start_time) << TIMESTAMP_SHIFT)
            | (state.sequence << INSTANCE_BITS)
            | self.instance_id
    }
}

#[cfg(test)]
#[path = "id_test.rs"]
mod tests;
