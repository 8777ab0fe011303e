//! Common test utilities and shared imports

// Not every test file uses every helper
#[allow(unused_imports)]
pub use powermon_lib::constants::PACKET_SIZE;
#[allow(unused_imports)]
pub use powermon_lib::packet::checksum;
#[allow(unused_imports)]
pub use powermon_lib::{Packet, PowermonError, ProtocolError, Sensor, Session, SessionConfig};

/// Decode a hex string into a 7-byte frame
#[allow(dead_code)]
pub fn frame_from_hex(hex_data: &str) -> [u8; PACKET_SIZE] {
    let bytes = hex::decode(hex_data).expect("Failed to decode hex");
    bytes.try_into().expect("Frame must be 7 bytes")
}

/// Recompute byte 6 after editing a frame by hand
#[allow(dead_code)]
pub fn reseal(frame: &mut [u8; PACKET_SIZE]) {
    frame[6] = checksum(frame);
}

/// A payload that satisfies `sensor`'s required-zero bytes, with its expected value
#[allow(dead_code)]
pub fn sample_payload(sensor: Sensor) -> ([u8; 5], f64) {
    match sensor {
        Sensor::Voltage => ([0x00, 0xE6, 0x05, 0, 0], 230.5),
        Sensor::Current => ([0x00, 0x04, 0x19, 0, 0], 4.25),
        Sensor::Power => ([0x08, 0x98, 0, 0, 0], 2200.0),
        Sensor::Energy => ([0x01, 0x86, 0xA0, 0, 0], 100_000.0),
        Sensor::Test => ([0, 0, 0, 0, 0], 0.0),
    }
}

/// Send test logs to the test harness output; `RUST_LOG` selects the level
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
