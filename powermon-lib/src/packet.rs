use crate::constants::{CHECKSUM_SPAN, DEFAULT_ADDRESS, PACKET_SIZE, PAYLOAD_SIZE};
use crate::error::ProtocolError;
use crate::sensor::Sensor;
use modular_bitfield::prelude::*;
use num_enum::{FromPrimitive, IntoPrimitive};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Byte 0 of every frame: sensor code in the low nibble, direction in the high one.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeByte {
    pub code: B4,
    pub direction: B4,
}

impl TypeByte {
    pub fn for_sensor(direction: Direction, sensor: Sensor) -> Self {
        TypeByte::new()
            .with_code(sensor.code())
            .with_direction(direction.into())
    }

    pub fn as_u8(self) -> u8 {
        self.into_bytes()[0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Direction {
    Response = 0xA,
    Request = 0xB,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// The fixed 7-byte frame exchanged in both directions.
///
/// Layout: `[type, b1, b2, b3, b4, b5, checksum]`, where the checksum is the
/// low 8 bits of the sum of the first six bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Packet {
    pub kind: u8,
    pub payload: [u8; PAYLOAD_SIZE],
    pub checksum: u8,
}

/// Unsigned 8-bit sum of the first six bytes of `frame`; byte 6 is ignored
pub fn checksum(frame: &[u8; PACKET_SIZE]) -> u8 {
    frame[..CHECKSUM_SPAN]
        .iter()
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte))
}

impl Packet {
    /// Build a request for `sensor` addressed to `address`
    pub fn request(sensor: Sensor, address: [u8; 4]) -> Self {
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[..4].copy_from_slice(&address);
        Self::sealed(TypeByte::for_sensor(Direction::Request, sensor), payload)
    }

    /// Build a response frame as the device would send it
    pub fn response(sensor: Sensor, payload: [u8; PAYLOAD_SIZE]) -> Self {
        Self::sealed(TypeByte::for_sensor(Direction::Response, sensor), payload)
    }

    fn sealed(kind: TypeByte, payload: [u8; PAYLOAD_SIZE]) -> Self {
        let mut packet = Packet {
            kind: kind.as_u8(),
            payload,
            checksum: 0,
        };
        packet.checksum = packet.expected_checksum();
        packet
    }

    pub fn type_byte(&self) -> TypeByte {
        TypeByte::from_bytes([self.kind])
    }

    pub fn direction(&self) -> Direction {
        Direction::from_primitive(self.type_byte().direction())
    }

    /// Checksum recomputed over bytes 0..=5
    pub fn expected_checksum(&self) -> u8 {
        checksum(&self.to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut out = [0u8; PACKET_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// Validate this frame as the response to a `sensor` request and decode its value.
    ///
    /// Checks run in order: type byte, checksum, then the sensor's required-zero bytes.
    pub fn decode(&self, sensor: Sensor) -> Result<f64, ProtocolError> {
        let expected = TypeByte::for_sensor(Direction::Response, sensor).as_u8();
        if self.kind != expected {
            return Err(ProtocolError::UnexpectedResponseType {
                expected,
                actual: self.kind,
            });
        }

        let expected = self.expected_checksum();
        if self.checksum != expected {
            return Err(ProtocolError::ChecksumMismatch {
                expected,
                actual: self.checksum,
            });
        }

        let body = self.as_bytes();
        for &index in sensor.zero_fields() {
            if body[index] != 0 {
                return Err(ProtocolError::MalformedField {
                    sensor,
                    index,
                    value: body[index],
                });
            }
        }

        Ok(sensor.value(body))
    }
}

impl From<[u8; PACKET_SIZE]> for Packet {
    fn from(bytes: [u8; PACKET_SIZE]) -> Self {
        zerocopy::transmute!(bytes)
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Packet::read_from_bytes(bytes).map_err(|_| ProtocolError::InvalidLength {
            expected: PACKET_SIZE,
            actual: bytes.len(),
        })
    }
}

/// Encode a request for `sensor` to the default address
pub fn encode_request(sensor: Sensor) -> [u8; PACKET_SIZE] {
    Packet::request(sensor, DEFAULT_ADDRESS).to_bytes()
}

/// Decode a raw response frame received for a `sensor` request
pub fn decode_response(bytes: &[u8; PACKET_SIZE], sensor: Sensor) -> Result<f64, ProtocolError> {
    Packet::from(*bytes).decode(sensor)
}
