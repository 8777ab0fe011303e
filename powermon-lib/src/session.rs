use crate::constants::{
    DEFAULT_ADDRESS, DEFAULT_BAUD_RATE, DEFAULT_INTER_BYTE_TIMEOUT, DEFAULT_TIMEOUT, MAX_DRAIN_BYTES, PACKET_SIZE,
};
use crate::error::PowermonError;
use crate::packet::Packet;
use crate::sensor::{Reading, Sensor};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, info, warn};
use zerocopy::IntoBytes;

/// Settings for one serial session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Bound on the wait for the first byte of a response
    pub timeout: Duration,
    /// Bound on each further wait once a response has started
    pub inter_byte_timeout: Duration,
    /// Address written into bytes 1..=4 of every request
    pub address: [u8; 4],
    pub baud_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            inter_byte_timeout: DEFAULT_INTER_BYTE_TIMEOUT,
            address: DEFAULT_ADDRESS,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl SessionConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_inter_byte_timeout(mut self, timeout: Duration) -> Self {
        self.inter_byte_timeout = timeout;
        self
    }

    pub fn with_address(mut self, address: [u8; 4]) -> Self {
        self.address = address;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// An open channel to a single power monitor.
///
/// The session exclusively owns its byte stream; dropping it closes the port.
/// Each [`query`](Session::query) performs exactly one request/response
/// exchange and never retries.
pub struct Session<S = SerialStream> {
    stream: S,
    config: SessionConfig,
}

impl Session<SerialStream> {
    /// Open `path` as a raw 8N1 serial line at the configured baud rate.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(path: &str, config: SessionConfig) -> Result<Self, PowermonError> {
        let stream = tokio_serial::new(path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()?;

        info!(path, baud = config.baud_rate, "Opened serial port");
        Ok(Self::new(stream, config))
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: SessionConfig) -> Self {
        Self { stream, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Request one measurement and decode the device's answer.
    ///
    /// On a timeout, short read or rejected frame the channel is drained
    /// before the error is returned, so the next query starts on a frame
    /// boundary. The drain adds at most one quiet `inter_byte_timeout` window,
    /// so a silent device fails after `timeout + inter_byte_timeout`.
    pub async fn query(&mut self, sensor: Sensor) -> Result<f64, PowermonError> {
        let request = Packet::request(sensor, self.config.address);
        self.send(&request).await?;

        let result = match self.receive().await {
            Ok(response) => response.decode(sensor).map_err(PowermonError::from),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            if matches!(
                e,
                PowermonError::Timeout(_) | PowermonError::ShortRead { .. } | PowermonError::Protocol(_)
            ) {
                self.resync().await;
            }
        }
        result
    }

    /// Like [`query`](Session::query), but keeps the sensor alongside the value
    pub async fn read(&mut self, sensor: Sensor) -> Result<Reading, PowermonError> {
        let value = self.query(sensor).await?;
        debug!(%sensor, value, unit = sensor.unit(), "Decoded reading");
        Ok(Reading::new(sensor, value))
    }

    /// Discard whatever is pending on the channel.
    ///
    /// Stops after one quiet `inter_byte_timeout` window, at end of stream, or
    /// once `MAX_DRAIN_BYTES` have been dropped. Returns the number discarded.
    pub async fn resync(&mut self) -> usize {
        let mut scratch = [0u8; MAX_DRAIN_BYTES];
        let mut discarded = 0;
        while discarded < MAX_DRAIN_BYTES {
            let window = self.config.inter_byte_timeout;
            match timeout(window, self.stream.read(&mut scratch[discarded..])).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => {
                    warn!(error = %e, "Failed to drain serial input");
                    break;
                }
            }
        }
        if discarded > 0 {
            warn!(
                discarded,
                bytes = hex::encode(&scratch[..discarded]),
                "Discarded stale bytes"
            );
        }
        discarded
    }

    async fn send(&mut self, packet: &Packet) -> Result<(), PowermonError> {
        let bytes = packet.as_bytes();
        debug!(bytes = hex::encode(bytes), "Serial write");

        let stream = &mut self.stream;
        let exchange = async move {
            let written = stream.write(bytes).await?;
            if written != PACKET_SIZE {
                return Err(PowermonError::ShortWrite {
                    expected: PACKET_SIZE,
                    actual: written,
                });
            }
            stream.flush().await?;
            Ok(())
        };
        timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| PowermonError::WriteTimeout(self.config.timeout))?
    }

    async fn receive(&mut self) -> Result<Packet, PowermonError> {
        let mut buf = [0u8; PACKET_SIZE];
        let mut filled = 0;
        while filled < PACKET_SIZE {
            let window = if filled == 0 {
                self.config.timeout
            } else {
                self.config.inter_byte_timeout
            };
            match timeout(window, self.stream.read(&mut buf[filled..])).await {
                Err(_) if filled == 0 => return Err(PowermonError::Timeout(window)),
                Err(_) | Ok(Ok(0)) => {
                    debug!(bytes = hex::encode(&buf[..filled]), "Serial read (incomplete)");
                    return Err(PowermonError::ShortRead {
                        expected: PACKET_SIZE,
                        actual: filled,
                    });
                }
                Ok(Ok(n)) => filled += n,
                Ok(Err(e)) => return Err(e.into()),
            }
        }
        debug!(bytes = hex::encode(buf), "Serial read");
        Ok(Packet::from(buf))
    }
}
