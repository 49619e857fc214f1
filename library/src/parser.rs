use core::str::FromStr;

use crate::{lexer::tokenize, ArgumentMnumonic, CommandArgument, CommandId, CommandMnumonics, GcodeCommand, ParseError};

/// Tokenizes a line and classifies it by the leading letter of its first word.
///
/// The code after the letter must be a non-negative integer (`G1`, `G01`, `M3`).
/// Every following word becomes an argument; a number that does not parse or
/// is not finite rejects the whole line.
pub fn parse(line: &str) -> Result<GcodeCommand, ParseError> {
    let words = tokenize(line)?;
    let (head, params) = words.split_first().ok_or(ParseError::Empty)?;

    let mnumonic = CommandMnumonics::try_from(head.letter)?;
    let code = u16::from_str(head.number).map_err(|_| ParseError::InvalidCode(mnumonic))?;
    let mut command = GcodeCommand::new(CommandId { mnumonic, code });

    for word in params {
        let mnumonic = ArgumentMnumonic::try_from(word.letter)?;
        let value = f32::from_str(word.number)
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(ParseError::InvalidNumber(mnumonic.into()))?;
        command.arguments
            .try_push(CommandArgument { mnumonic, value })
            .map_err(|_| ParseError::TooManyTokens { max: crate::lexer::MAX_TOKENS })?;
    }
    Ok(command)
}
