use core::fmt;
use arrayvec::ArrayVec;

use crate::{lexer::MAX_TOKENS, ParseError, XYZData, XYZId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommandMnumonics {
    #[default]
    G,
    M,
}

impl TryFrom<u8> for CommandMnumonics {
    type Error = ParseError;
    fn try_from(letter: u8) -> Result<Self, Self::Error> {
        match letter {
            b'G' => Ok(CommandMnumonics::G),
            b'M' => Ok(CommandMnumonics::M),
            _ => Err(ParseError::UnknownFamily(letter as char)),
        }
    }
}

impl fmt::Display for CommandMnumonics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandMnumonics::G => f.write_str("G"),
            CommandMnumonics::M => f.write_str("M"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArgumentMnumonic {
    #[default]
    X,
    Y,
    Z,
    F,
    P,
    S,
}

impl TryFrom<u8> for ArgumentMnumonic {
    type Error = ParseError;
    fn try_from(letter: u8) -> Result<Self, Self::Error> {
        match letter {
            b'X' => Ok(ArgumentMnumonic::X),
            b'Y' => Ok(ArgumentMnumonic::Y),
            b'Z' => Ok(ArgumentMnumonic::Z),
            b'F' => Ok(ArgumentMnumonic::F),
            b'P' => Ok(ArgumentMnumonic::P),
            b'S' => Ok(ArgumentMnumonic::S),
            _ => Err(ParseError::UnknownWord(letter as char)),
        }
    }
}

impl From<ArgumentMnumonic> for char {
    fn from(value: ArgumentMnumonic) -> Self {
        match value {
            ArgumentMnumonic::X => 'X',
            ArgumentMnumonic::Y => 'Y',
            ArgumentMnumonic::Z => 'Z',
            ArgumentMnumonic::F => 'F',
            ArgumentMnumonic::P => 'P',
            ArgumentMnumonic::S => 'S',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandId {
    pub mnumonic: CommandMnumonics,
    pub code: u16,
}

impl CommandId {
    pub const fn g(code: u16) -> Self {
        Self { mnumonic: CommandMnumonics::G, code }
    }
    pub const fn m(code: u16) -> Self {
        Self { mnumonic: CommandMnumonics::M, code }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mnumonic, self.code)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CommandArgument {
    pub mnumonic: ArgumentMnumonic,
    pub value: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GcodeCommand {
    pub command_id: CommandId,
    pub arguments: ArrayVec<CommandArgument, { MAX_TOKENS - 1 }>,
}

impl GcodeCommand {
    pub fn new(command_id: CommandId) -> Self {
        Self { command_id, arguments: Default::default() }
    }

    /// Value of the first argument with this letter.
    pub fn argument(&self, mnumonic: ArgumentMnumonic) -> Option<f32> {
        self.arguments.iter().find(|a| a.mnumonic == mnumonic).map(|a| a.value)
    }

    /// Axis words of the command. Axes without a word stay `None`.
    pub fn target(&self) -> XYZData<Option<f32>> {
        let mut target = XYZData::<Option<f32>>::default();
        for arg in self.arguments.iter() {
            if let Some(id) = XYZId::from_arg(arg.mnumonic) {
                let slot = target.match_id_mut(id);
                if slot.is_none() {
                    *slot = Some(arg.value);
                }
            }
        }
        target
    }
}
