use core::fmt::Write;
use arrayvec::ArrayString;

use crate::{TransportError, Vector3, XYZData, XYZId, XYZ_ID_LIST};

const MESSAGE_CAPACITY: usize = 8;
const LIMIT_SUFFIX: char = 'L';

/// Link to the driver boards. Steps go out as `<axis><sign>` (`X1`, `Y-1`),
/// limit queries as `<axis>L`.
pub trait Transport {
    fn send(&mut self, message: &str) -> Result<(), TransportError>;
    /// Sends a query and reports whether the sensor answered as triggered.
    fn query(&mut self, message: &str) -> Result<bool, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, message: &str) -> Result<(), TransportError> { (**self).send(message) }
    fn query(&mut self, message: &str) -> Result<bool, TransportError> { (**self).query(message) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    /// Positive deltas step positive on every axis. No delta, no direction.
    pub fn of(delta: f32) -> Option<Self> {
        if delta > 0.0 { Some(Direction::Positive) }
        else if delta < 0.0 { Some(Direction::Negative) }
        else { None }
    }

    pub fn sign(&self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }
}

/// One axis motor. `position` counts issued pulses and only changes in [`Stepper::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct Stepper {
    axis: XYZId,
    position: i32,
    limit_triggered: bool,
    inverted: bool,
}

impl Stepper {
    pub fn new(axis: XYZId, inverted: bool) -> Self {
        Self { axis, position: 0, limit_triggered: false, inverted }
    }

    pub fn axis(&self) -> XYZId { self.axis }
    pub fn get_position(&self) -> i32 { self.position }
    pub fn limit_triggered(&self) -> bool { self.limit_triggered }

    /// Forgets the last limit reading. The next poll samples the sensor again.
    pub fn clear_limit(&mut self) {
        self.limit_triggered = false;
    }

    #[cfg(test)]
    pub(crate) fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    fn message(&self, args: core::fmt::Arguments) -> Result<ArrayString<MESSAGE_CAPACITY>, TransportError> {
        let mut message = ArrayString::new();
        message.write_fmt(args).map_err(|_| TransportError::MessageTooLong)?;
        Ok(message)
    }

    /// Issues one pulse. The position is only counted once the transport accepted it.
    pub fn step(&mut self, direction: Direction, transport: &mut impl Transport) -> Result<(), TransportError> {
        let wire = if self.inverted { direction.reversed() } else { direction };
        let message = self.message(format_args!("{}{}", self.axis, wire.sign()))?;
        transport.send(&message)?;
        self.position += direction.sign();
        Ok(())
    }

    pub fn query_limit(&mut self, transport: &mut impl Transport) -> Result<bool, TransportError> {
        let message = self.message(format_args!("{}{}", self.axis, LIMIT_SUFFIX))?;
        self.limit_triggered = transport.query(&message)?;
        if self.limit_triggered {
            tracing::warn!("limit sensor triggered on {} axis at step {}", self.axis, self.position);
        }
        Ok(self.limit_triggered)
    }
}

/// The three axis motors, owned by the controller and lent to the planner per move.
pub type Steppers = XYZData<Stepper>;

impl XYZData<Stepper> {
    pub fn with_inversion(inverted: &XYZData<bool>) -> Self {
        let [x, y, z] = XYZ_ID_LIST;
        XYZData {
            x: Stepper::new(x, inverted.x),
            y: Stepper::new(y, inverted.y),
            z: Stepper::new(z, inverted.z),
        }
    }

    pub fn positions(&self) -> XYZData<i32> {
        self.map(|s| s.get_position())
    }

    /// Current position in machine units.
    pub fn position_units(&self, steps_per_unit: f32) -> Vector3 {
        self.map(|s| s.get_position() as f32 / steps_per_unit)
    }
}
