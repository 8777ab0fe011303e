use crate::error::{PowermonError, ProtocolError};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::Display;

/// Quantity requested from the meter.
///
/// The discriminant is the code carried in the low nibble of the type byte,
/// for requests and responses alike.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize,
)]
#[num_enum(error_type(name = ProtocolError, constructor = ProtocolError::UnknownSensor))]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Sensor {
    Voltage = 0,
    Current = 1,
    Power = 2,
    Energy = 3,
    Test = 4,
}

impl Sensor {
    pub const ALL: [Sensor; 5] = [
        Sensor::Voltage,
        Sensor::Current,
        Sensor::Power,
        Sensor::Energy,
        Sensor::Test,
    ];

    pub fn code(self) -> u8 {
        self.into()
    }

    /// Unit of the decoded value
    pub fn unit(self) -> &'static str {
        match self {
            Sensor::Voltage => "V",
            Sensor::Current => "A",
            Sensor::Power => "W",
            Sensor::Energy => "Wh",
            Sensor::Test => "",
        }
    }

    /// Frame indices (1..=5) that must be zero in a response for this sensor
    pub fn zero_fields(self) -> &'static [usize] {
        match self {
            Sensor::Voltage | Sensor::Current | Sensor::Energy => &[4, 5],
            Sensor::Power => &[3, 4, 5],
            Sensor::Test => &[1, 2, 3, 4, 5],
        }
    }

    /// Convert a validated response body into a reading.
    ///
    /// `body` is the full frame; only bytes 1..=3 contribute to the value.
    pub(crate) fn value(self, body: &[u8]) -> f64 {
        let (b1, b2, b3) = (f64::from(body[1]), f64::from(body[2]), f64::from(body[3]));
        match self {
            Sensor::Voltage => 256.0 * b1 + b2 + b3 / 10.0,
            Sensor::Current => 256.0 * b1 + b2 + b3 / 100.0,
            Sensor::Power => 256.0 * b1 + b2,
            Sensor::Energy => 65536.0 * b1 + 256.0 * b2 + b3,
            Sensor::Test => 0.0,
        }
    }
}

impl FromStr for Sensor {
    type Err = PowermonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sensor::ALL
            .into_iter()
            .find(|sensor| s.eq_ignore_ascii_case(&sensor.to_string()))
            .ok_or_else(|| PowermonError::UnknownMode(s.to_string()))
    }
}

/// A decoded measurement together with the sensor it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub sensor: Sensor,
    pub value: f64,
    pub unit: &'static str,
}

impl Reading {
    pub fn new(sensor: Sensor, value: f64) -> Self {
        Self {
            sensor,
            value,
            unit: sensor.unit(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sensor {
            Sensor::Test => write!(f, "Ok!"),
            _ => write!(f, "{}", self.value),
        }
    }
}
