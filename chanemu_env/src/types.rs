//! Common types for the chanemu emulator.

use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One complex baseband sample (I + jQ), 32-bit float per component.
pub type Sample = Complex32;

/// Identifier of one antenna port registered with the shared medium.
///
/// Ports are handed out densely from 0 in registration order and are
/// never retired, so the inner index doubles as the arena coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortId(pub usize);

impl PortId {
    /// Returns the dense index of this port.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stream / gain direction, numbered like the hardware abstraction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Transmit path
    Tx = 0,
    /// Receive path
    Rx = 1,
}

impl Direction {
    /// Returns both directions.
    pub fn both() -> [Direction; 2] {
        [Direction::Tx, Direction::Rx]
    }
}

/// Wire formats a stream may be opened with.
///
/// The emulator always moves `CF32` internally; the format is recorded on
/// the handle and otherwise ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamFormat {
    CF64,
    CF32,
    CS32,
    CU32,
    CS16,
    CU16,
    CS12,
    CU12,
    CS8,
    CU8,
    CS4,
    CU4,
    F64,
    F32,
    S32,
    U32,
    S16,
    U16,
    S8,
    U8,
}

impl StreamFormat {
    /// Returns the canonical format string (e.g. `"CF32"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamFormat::CF64 => "CF64",
            StreamFormat::CF32 => "CF32",
            StreamFormat::CS32 => "CS32",
            StreamFormat::CU32 => "CU32",
            StreamFormat::CS16 => "CS16",
            StreamFormat::CU16 => "CU16",
            StreamFormat::CS12 => "CS12",
            StreamFormat::CU12 => "CU12",
            StreamFormat::CS8 => "CS8",
            StreamFormat::CU8 => "CU8",
            StreamFormat::CS4 => "CS4",
            StreamFormat::CU4 => "CU4",
            StreamFormat::F64 => "F64",
            StreamFormat::F32 => "F32",
            StreamFormat::S32 => "S32",
            StreamFormat::U32 => "U32",
            StreamFormat::S16 => "S16",
            StreamFormat::U16 => "U16",
            StreamFormat::S8 => "S8",
            StreamFormat::U8 => "U8",
        }
    }
    
    /// Returns true for complex (I/Q) formats.
    pub fn is_complex(&self) -> bool {
        self.as_str().starts_with('C')
    }
}

impl FromStr for StreamFormat {
    type Err = String;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.to_ascii_uppercase().as_str() {
            "CF64" => StreamFormat::CF64,
            "CF32" => StreamFormat::CF32,
            "CS32" => StreamFormat::CS32,
            "CU32" => StreamFormat::CU32,
            "CS16" => StreamFormat::CS16,
            "CU16" => StreamFormat::CU16,
            "CS12" => StreamFormat::CS12,
            "CU12" => StreamFormat::CU12,
            "CS8" => StreamFormat::CS8,
            "CU8" => StreamFormat::CU8,
            "CS4" => StreamFormat::CS4,
            "CU4" => StreamFormat::CU4,
            "F64" => StreamFormat::F64,
            "F32" => StreamFormat::F32,
            "S32" => StreamFormat::S32,
            "U32" => StreamFormat::U32,
            "S16" => StreamFormat::S16,
            "U16" => StreamFormat::U16,
            "S8" => StreamFormat::S8,
            "U8" => StreamFormat::U8,
            _ => return Err(format!("Unknown stream format: {}", s)),
        };
        Ok(format)
    }
}

impl std::fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status returned by stream read/write calls.
///
/// `ret` always equals the requested element count: emulated I/O never
/// short-transfers, unlike physical hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamResult {
    /// Number of elements transferred per channel
    pub ret: usize,
    
    /// Flags echoed back to the caller (always 0)
    pub flags: i32,
    
    /// Timestamp of the first element (always 0, no notion of time)
    pub time_ns: i64,
}

impl StreamResult {
    /// Creates a result reporting a full transfer of `ret` elements.
    pub fn transferred(ret: usize) -> Self {
        Self {
            ret,
            flags: 0,
            time_ns: 0,
        }
    }
}

/// Static hardware identity record of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub driver: String,
    pub firmware: String,
    pub fpga: String,
    pub frontend: String,
    pub revision: String,
    pub serial: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_stream_format_parse() {
        assert_eq!("CF32".parse::<StreamFormat>(), Ok(StreamFormat::CF32));
        assert_eq!("cs16".parse::<StreamFormat>(), Ok(StreamFormat::CS16));
        assert!("CF128".parse::<StreamFormat>().is_err());
    }
    
    #[test]
    fn test_stream_format_complex() {
        assert!(StreamFormat::CS12.is_complex());
        assert!(!StreamFormat::F32.is_complex());
    }
    
    #[test]
    fn test_direction_numbering() {
        assert_eq!(Direction::Tx as i32, 0);
        assert_eq!(Direction::Rx as i32, 1);
    }
    
    #[test]
    fn test_stream_result_full_transfer() {
        let result = StreamResult::transferred(512);
        assert_eq!(result.ret, 512);
        assert_eq!(result.flags, 0);
    }
}
