pub mod constants;
pub mod error;
pub mod packet;
pub mod sensor;
pub mod session;

#[cfg(test)]
mod tests;

// Re-export the main types for easy access
pub use error::{PowermonError, ProtocolError};
pub use packet::{Packet, decode_response, encode_request};
pub use sensor::{Reading, Sensor};
pub use session::{Session, SessionConfig};
