use std::io::{BufRead, BufReader, Read, Write};
use std::time::Duration;

use cnc_motion::{Transport, TransportError};
use serial2::SerialPort;

use crate::config::TransportConfig;

/// Newline-terminated text messages over a byte stream. Steps are fire and
/// forget; a query waits for a `1` (triggered) or `0` line.
pub struct LineTransport<P: Read + Write> {
    port: BufReader<P>,
    response: String,
}

impl<P: Read + Write> LineTransport<P> {
    pub fn new(port: P) -> Self {
        Self { port: BufReader::new(port), response: String::new() }
    }

    pub fn into_inner(self) -> P {
        self.port.into_inner()
    }

    fn write_line(&mut self, message: &str) -> Result<(), TransportError> {
        let port = self.port.get_mut();
        writeln!(port, "{}", message)
            .and_then(|_| port.flush())
            .map_err(|err| {
                tracing::error!("write of {} failed: {}", message, err);
                TransportError::Unreachable
            })
    }
}

impl LineTransport<SerialPort> {
    pub fn open(config: &TransportConfig) -> std::io::Result<Self> {
        let mut port = SerialPort::open(&config.port, config.baud)?;
        port.set_read_timeout(Duration::from_millis(config.response_timeout_ms))?;
        tracing::info!("opened {} at {} baud", config.port, config.baud);
        Ok(Self::new(port))
    }
}

impl<P: Read + Write> Transport for LineTransport<P> {
    fn send(&mut self, message: &str) -> Result<(), TransportError> {
        self.write_line(message)
    }

    fn query(&mut self, message: &str) -> Result<bool, TransportError> {
        self.write_line(message)?;
        self.response.clear();
        match self.port.read_line(&mut self.response) {
            Ok(0) => Err(TransportError::Unreachable),
            Ok(_) => match self.response.trim() {
                "1" => Ok(true),
                "0" => Ok(false),
                other => {
                    tracing::warn!("unexpected answer {:?} to {}", other, message);
                    Err(TransportError::BadResponse)
                },
            },
            Err(err) => {
                tracing::error!("no answer to {}: {}", message, err);
                Err(TransportError::Unreachable)
            },
        }
    }
}

/// Dry-run link: prints every message and reports limit sensors as clear.
pub struct EchoTransport<W: Write> {
    out: W,
    messages: u64,
}

impl<W: Write> EchoTransport<W> {
    pub fn new(out: W) -> Self {
        Self { out, messages: 0 }
    }

    pub fn messages(&self) -> u64 {
        self.messages
    }
}

impl<W: Write> Transport for EchoTransport<W> {
    fn send(&mut self, message: &str) -> Result<(), TransportError> {
        writeln!(self.out, "{}", message).map_err(|_| TransportError::Unreachable)?;
        self.messages += 1;
        Ok(())
    }

    fn query(&mut self, message: &str) -> Result<bool, TransportError> {
        self.send(message)?;
        Ok(false)
    }
}
