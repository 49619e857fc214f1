use thiserror::Error;

use crate::{CommandId, CommandMnumonics, XYZData, XYZId};

/// A command line that could not be turned into a [`crate::GcodeCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command line")]
    Empty,
    #[error("more than {max} tokens on one line")]
    TooManyTokens { max: usize },
    #[error("token {index} is not a letter followed by a number")]
    MalformedToken { index: usize },
    #[error("unknown command family '{0}'")]
    UnknownFamily(char),
    #[error("{0} needs a non-negative integer code")]
    InvalidCode(CommandMnumonics),
    #[error("unknown parameter '{0}'")]
    UnknownWord(char),
    #[error("parameter '{0}' is not a finite number")]
    InvalidNumber(char),
    #[error("missing parameter '{0}'")]
    MissingParameter(char),
    #[error("dwell duration must be a non-negative number of milliseconds")]
    InvalidDwell,
}

/// A segment that cannot be executed. No pulse has been issued when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("segment has no length at step resolution")]
    Degenerate,
    #[error("feedrate must be a positive finite number")]
    InvalidFeedrate,
    #[error("segment coordinates are not finite")]
    NonFinite,
    #[error("derived step interval is not a positive finite duration")]
    InvalidTiming,
    #[error("move does not fit the step counter range")]
    OutOfRange,
}

/// The actuator link could not carry a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("actuator unreachable")]
    Unreachable,
    #[error("unexpected response from actuator")]
    BadResponse,
    #[error("actuator message does not fit the send buffer")]
    MessageTooLong,
}

/// A limit sensor tripped while a move was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitFault {
    pub axis: XYZId,
    /// Pulses issued per axis before the move stopped.
    pub steps: XYZData<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("limit switch triggered on {} axis", .0.axis)]
    Limit(LimitFault),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("unsupported command {0}")]
    Unsupported(CommandId),
    #[error("planning error: {0}")]
    Plan(#[from] PlanError),
    #[error("limit switch triggered on {} axis, move aborted", .0.axis)]
    LimitFault(LimitFault),
    #[error("motion refused until the limit fault on {0} axis is cleared")]
    Faulted(XYZId),
    #[error("transport fault: {0}")]
    Transport(#[from] TransportError),
}

impl DispatchError {
    /// Transport faults end the job. Everything else only skips the command.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DispatchError::Transport(_))
    }
}

impl From<MoveError> for DispatchError {
    fn from(value: MoveError) -> Self {
        match value {
            MoveError::Limit(fault) => DispatchError::LimitFault(fault),
            MoveError::Plan(err) => DispatchError::Plan(err),
            MoveError::Transport(err) => DispatchError::Transport(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be a positive finite number")]
    NotPositive(&'static str),
    #[error("min_feedrate must not exceed max_feedrate")]
    FeedrateRange,
    #[error("default_feedrate lies outside the feedrate range")]
    DefaultFeedrate,
}
