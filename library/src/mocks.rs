use embedded_hal::delay::DelayNs;

use crate::{Spindle, Transport, TransportError, XYZId};

/// Records every message. Can trip one axis' limit sensor once that axis has
/// received a number of step messages, or go unreachable after some sends.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<String>,
    pub queries: Vec<String>,
    pub unreachable: bool,
    pub fail_after: Option<usize>,
    pub limit: Option<(XYZId, usize)>,
}

impl RecordingTransport {
    pub fn trip_limit(&mut self, axis: XYZId, after_steps: usize) {
        self.limit = Some((axis, after_steps));
    }

    fn steps_on(&self, axis: XYZId) -> usize {
        self.sent.iter().filter(|m| m.starts_with(axis.name())).count()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, message: &str) -> Result<(), TransportError> {
        if self.unreachable || self.fail_after.is_some_and(|n| self.sent.len() >= n) {
            return Err(TransportError::Unreachable);
        }
        self.sent.push(message.to_string());
        Ok(())
    }

    fn query(&mut self, message: &str) -> Result<bool, TransportError> {
        if self.unreachable {
            return Err(TransportError::Unreachable);
        }
        self.queries.push(message.to_string());
        Ok(match self.limit {
            Some((axis, after)) => message.starts_with(axis.name()) && self.steps_on(axis) >= after,
            None => false,
        })
    }
}

/// Sums requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

#[derive(Debug, Default)]
pub struct RecordingSpindle {
    pub signals: Vec<bool>,
}

impl Spindle for RecordingSpindle {
    fn enable(&mut self) -> Result<(), TransportError> {
        self.signals.push(true);
        Ok(())
    }

    fn disable(&mut self) -> Result<(), TransportError> {
        self.signals.push(false);
        Ok(())
    }
}
