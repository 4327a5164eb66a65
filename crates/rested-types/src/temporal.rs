use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Last-modified marker for a collection.
///
/// Combines a wall-clock component with a logical counter so that two commits
/// inside the same millisecond still produce strictly increasing values.
///
/// Ordering: `physical_ms` → `logical` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Wall-clock milliseconds since UNIX epoch.
    pub physical_ms: u64,
    /// Logical counter for commits at the same physical time.
    pub logical: u32,
}

impl Timestamp {
    pub fn new(physical_ms: u64, logical: u32) -> Self {
        Self {
            physical_ms,
            logical,
        }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self {
            physical_ms: now_ms(),
            logical: 0,
        }
    }

    /// The zero timestamp, older than any commit.
    pub const fn zero() -> Self {
        Self {
            physical_ms: 0,
            logical: 0,
        }
    }

    /// The latest instant inside the given millisecond.
    ///
    /// Wall-clock instants supplied by clients (e.g. `If-Modified-Since`)
    /// cover every logical tick of their millisecond.
    pub fn end_of_ms(physical_ms: u64) -> Self {
        Self {
            physical_ms,
            logical: u32::MAX,
        }
    }

    /// The latest instant inside the second containing `value`.
    ///
    /// HTTP dates (`If-Modified-Since`, `Last-Modified`) carry whole seconds,
    /// so a client echoing one must cover every commit made in that second.
    pub fn from_http_date(value: DateTime<Utc>) -> Result<Self, TypeError> {
        let secs = value.timestamp();
        let physical_ms = u64::try_from(secs)
            .ok()
            .and_then(|s| s.checked_mul(1000))
            .and_then(|ms| ms.checked_add(999))
            .ok_or(TypeError::TimestampOutOfRange(value.timestamp_millis()))?;
        Ok(Self::end_of_ms(physical_ms))
    }

    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// A timestamp strictly after `self`, tracking the wall clock when it has
    /// moved on.
    pub fn tick(&self) -> Self {
        let now = now_ms();
        if now > self.physical_ms {
            Self {
                physical_ms: now,
                logical: 0,
            }
        } else if self.logical == u32::MAX {
            Self {
                physical_ms: self.physical_ms + 1,
                logical: 0,
            }
        } else {
            Self {
                physical_ms: self.physical_ms,
                logical: self.logical + 1,
            }
        }
    }

    /// Wall-clock view, truncated to the millisecond.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(i64::try_from(self.physical_ms).ok()?)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Millisecond-precision instants. Use [`Timestamp::from_http_date`] for
/// header values.
impl TryFrom<DateTime<Utc>> for Timestamp {
    type Error = TypeError;

    fn try_from(value: DateTime<Utc>) -> Result<Self, Self::Error> {
        let ms = value.timestamp_millis();
        let physical_ms = u64::try_from(ms).map_err(|_| TypeError::TimestampOutOfRange(ms))?;
        Ok(Self::end_of_ms(physical_ms))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.physical_ms
            .cmp(&other.physical_ms)
            .then(self.logical.cmp(&other.logical))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms.{})", self.physical_ms, self.logical)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.physical_ms, self.logical)
    }
}
