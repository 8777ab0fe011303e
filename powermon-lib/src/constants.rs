// Protocol constants for PZEM-004T style power monitors

use std::time::Duration;

/// Size of every frame on the wire, in both directions (7 bytes)
pub const PACKET_SIZE: usize = 7;

/// Number of leading bytes covered by the checksum
pub const CHECKSUM_SPAN: usize = 6;

/// Number of payload bytes between the type byte and the checksum
pub const PAYLOAD_SIZE: usize = 5;

/// Address carried in bytes 1..=4 of every request
pub const DEFAULT_ADDRESS: [u8; 4] = [0xC0, 0xA8, 0x01, 0x01];

/// Line speed expected by the device
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Bound on waiting for the first byte of a response
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Bound on waiting for each further chunk of a response (termios VTIME = 1)
pub const DEFAULT_INTER_BYTE_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound on bytes discarded while resynchronising after a failed exchange
pub const MAX_DRAIN_BYTES: usize = 64;
