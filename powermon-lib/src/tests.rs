use crate::error::ProtocolError;
use crate::packet::{Packet, checksum, decode_response, encode_request};
use crate::sensor::Sensor;

fn frame_from_hex(hex_data: &str) -> [u8; 7] {
    let bytes = hex::decode(hex_data).expect("Failed to decode hex");
    bytes.try_into().expect("Frame must be 7 bytes")
}

#[test]
fn test_decode_voltage() {
    // 256*0 + 230 + 5/10
    let frame = frame_from_hex("a000e60500008b");
    assert_eq!(decode_response(&frame, Sensor::Voltage), Ok(230.5));
}

#[test]
fn test_decode_current() {
    // 256*0 + 4 + 25/100
    let frame = frame_from_hex("a10004190000be");
    assert_eq!(decode_response(&frame, Sensor::Current), Ok(4.25));
}

#[test]
fn test_decode_power() {
    let frame = frame_from_hex("a2089800000042");
    assert_eq!(decode_response(&frame, Sensor::Power), Ok(2200.0));
}

#[test]
fn test_decode_energy() {
    // 65536*0 + 256*1 + 44
    let frame = frame_from_hex("a300012c0000d0");
    assert_eq!(decode_response(&frame, Sensor::Energy), Ok(300.0));
}

#[test]
fn test_decode_energy_uses_all_three_bytes() {
    let frame = Packet::response(Sensor::Energy, [0x01, 0x02, 0x03, 0, 0]).to_bytes();
    assert_eq!(decode_response(&frame, Sensor::Energy), Ok(65536.0 + 512.0 + 3.0));
}

#[test]
fn test_decode_test_ack() {
    let frame = frame_from_hex("a40000000000a4");
    assert_eq!(decode_response(&frame, Sensor::Test), Ok(0.0));
}

#[test]
fn test_power_rejects_nonzero_b3() {
    let mut frame = Packet::response(Sensor::Power, [0x00, 0x64, 0, 0, 0]).to_bytes();
    frame[3] = 1;
    frame[6] = checksum(&frame);

    assert_eq!(
        decode_response(&frame, Sensor::Power),
        Err(ProtocolError::MalformedField {
            sensor: Sensor::Power,
            index: 3,
            value: 1
        })
    );
}

#[test]
fn test_malformed_field_message_names_sensor_and_byte() {
    let err = ProtocolError::MalformedField {
        sensor: Sensor::Voltage,
        index: 4,
        value: 0x7F,
    };
    assert_eq!(err.to_string(), "voltage: byte 4 must be zero, got 0x7f");
}

#[test]
fn test_request_is_not_a_valid_response() {
    // A looped-back request has the request direction nibble and must be rejected
    let frame = encode_request(Sensor::Test);
    assert_eq!(
        decode_response(&frame, Sensor::Test),
        Err(ProtocolError::UnexpectedResponseType {
            expected: 0xA4,
            actual: 0xB4
        })
    );
}

#[test]
fn test_type_checked_before_checksum() {
    let mut frame = frame_from_hex("a000e60500008b");
    frame[0] = 0xA1;
    // Checksum is now wrong too, but the type byte is reported first
    assert!(matches!(
        decode_response(&frame, Sensor::Voltage),
        Err(ProtocolError::UnexpectedResponseType { .. })
    ));
}

#[test]
fn test_checksum_checked_before_fields() {
    let mut frame = frame_from_hex("a40000000000a4");
    frame[5] = 0x01;
    assert_eq!(
        decode_response(&frame, Sensor::Test),
        Err(ProtocolError::ChecksumMismatch {
            expected: 0xA5,
            actual: 0xA4
        })
    );
}
