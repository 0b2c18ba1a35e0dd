//! Entry ID and timestamp helpers.

use chrono::{DateTime, Utc};

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// FILETIME ticks per second (100 ns resolution).
const TICKS_PER_SEC: i64 = 10_000_000;

/// Converts the low 48 bits of `value` into a 6-byte global counter.
pub fn value_to_gc(value: u64) -> [u8; 6] {
    let bytes = value.to_le_bytes();
    let mut gc = [0u8; 6];
    gc.copy_from_slice(&bytes[..6]);
    gc
}

/// Combines a replica ID and a global counter into an entry ID.
pub fn make_eid(replid: u16, gc: [u8; 6]) -> u64 {
    let mut raw = [0u8; 8];
    raw[2..].copy_from_slice(&gc);
    u64::from(replid) | (u64::from_be_bytes(raw) << 16)
}

/// Builds an entry ID from a replica ID and a counter value.
pub fn make_eid_ex(replid: u16, value: u64) -> u64 {
    make_eid(replid, value_to_gc(value))
}

/// Extracts the counter value from an entry ID.
pub fn eid_to_value(eid: u64) -> u64 {
    let gc = (eid >> 16).to_be_bytes();
    let mut raw = [0u8; 8];
    raw[..6].copy_from_slice(&gc[2..]);
    u64::from_le_bytes(raw)
}

/// Extracts the replica ID from an entry ID.
pub fn eid_replid(eid: u64) -> u16 {
    (eid & 0xFFFF) as u16
}

/// Converts a UNIX timestamp (seconds) to a FILETIME.
///
/// Times before 1601 clamp to 0; times past the representable range saturate.
pub fn nt_time(unix_secs: i64) -> u64 {
    unix_secs
        .saturating_add(EPOCH_OFFSET_SECS)
        .saturating_mul(TICKS_PER_SEC)
        .max(0) as u64
}

/// Converts a FILETIME to a UNIX timestamp (seconds).
pub fn nx_time(filetime: u64) -> i64 {
    (filetime / TICKS_PER_SEC as u64) as i64 - EPOCH_OFFSET_SECS
}

/// Converts a FILETIME to a UTC date, keeping sub-second precision.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    let secs = nx_time(filetime);
    let nanos = (filetime % TICKS_PER_SEC as u64) as u32 * 100;
    DateTime::from_timestamp(secs, nanos)
}

/// Converts a UTC date to a FILETIME.
pub fn datetime_to_filetime(time: DateTime<Utc>) -> u64 {
    nt_time(time.timestamp()).saturating_add(u64::from(time.timestamp_subsec_nanos() / 100))
}
