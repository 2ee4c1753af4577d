//! Stream flag bits and hardware-tick conversions.
//!
//! The emulator ignores every flag, but control code builds flag words and
//! timestamps with these before handing them to a stream call.

/// Last packet of a burst.
pub const END_BURST: i32 = 1 << 1;

/// The accompanying `time_ns` is valid.
pub const HAS_TIME: i32 = 1 << 2;

/// A burst ended with an underflow or overflow.
pub const END_ABRUPT: i32 = 1 << 3;

/// Transfer at most one packet.
pub const ONE_PACKET: i32 = 1 << 4;

/// More fragments of the same packet follow.
pub const MORE_FRAGMENTS: i32 = 1 << 5;

/// Hold the transfer until an external trigger.
pub const WAIT_TRIGGER: i32 = 1 << 6;

/// Converts a tick count at `rate` Hz to nanoseconds.
///
/// A zero rate gives a non-finite intermediate, which saturates.
pub fn ticks_to_time_ns(ticks: i64, rate: f64) -> i64 {
    (ticks as f64 * 1e9 / rate).round() as i64
}

/// Converts nanoseconds to a tick count at `rate` Hz.
pub fn time_ns_to_ticks(time_ns: i64, rate: f64) -> i64 {
    (time_ns as f64 * rate / 1e9).round() as i64
}
