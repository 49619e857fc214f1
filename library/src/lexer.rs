use core::str::from_utf8;
use arrayvec::ArrayVec;

use crate::ParseError;

/// Most tokens a single command line may carry, command word included.
pub const MAX_TOKENS: usize = 16;

/// One whitespace-separated word: a letter and the text of the number after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Word<'a> {
    pub letter: u8,
    pub number: &'a str,
    pub index: usize,
}

/// Drops a trailing `;` comment and surrounding whitespace.
pub fn strip_comment(line: &str) -> &str {
    line.split(';').next().unwrap_or_default().trim()
}

fn lex_word(token: &str, index: usize) -> Result<Word<'_>, ParseError> {
    let word = safe_regex::regex!(br"([A-Z])(-?[0-9]*\.?[0-9]*)");
    let (letter, number) = word.match_slices(token.as_bytes())
        .ok_or(ParseError::MalformedToken { index })?;
    let number = from_utf8(number).map_err(|_| ParseError::MalformedToken { index })?;
    Ok(Word { letter: letter[0], number, index })
}

/// Splits a command line into words. Runs of whitespace count as one separator.
pub fn tokenize(line: &str) -> Result<ArrayVec<Word<'_>, MAX_TOKENS>, ParseError> {
    let mut words = ArrayVec::<Word, MAX_TOKENS>::new();
    for (index, token) in strip_comment(line).split_whitespace().enumerate() {
        let word = lex_word(token, index)?;
        words.try_push(word).map_err(|_| ParseError::TooManyTokens { max: MAX_TOKENS })?;
    }
    if words.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_spaces() {
        let words = tokenize("G1 F100 X10 Y0 Z0").unwrap();
        assert_eq!(words.len(), 5);
        assert_eq!(words[0].letter, b'G');
        assert_eq!(words[0].number, "1");
        assert_eq!(words[1].letter, b'F');
        assert_eq!(words[1].number, "100");
        assert_eq!(words[4].letter, b'Z');
        assert_eq!(words[4].index, 4);
    }

    #[test]
    fn negative_and_fractional_numbers() {
        let words = tokenize("G0 X-1.25 Y.5").unwrap();
        assert_eq!(words[1].number, "-1.25");
        assert_eq!(words[2].number, ".5");
    }

    #[test]
    fn repeated_spaces_and_line_endings_are_ignored() {
        let words = tokenize("  M3   \r\n").unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].letter, b'M');
        assert_eq!(words[0].number, "3");
    }

    #[test]
    fn comment_is_stripped() {
        let words = tokenize("G4 P10 ; wait for the spindle").unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(tokenize("; only a comment"), Err(ParseError::Empty));
        assert_eq!(tokenize(""), Err(ParseError::Empty));
    }

    #[test]
    fn lowercase_and_garbage_tokens_are_malformed() {
        assert_eq!(tokenize("g1 X1"), Err(ParseError::MalformedToken { index: 0 }));
        assert_eq!(tokenize("G1 X1a"), Err(ParseError::MalformedToken { index: 1 }));
    }

    #[test]
    fn too_many_tokens() {
        let line = "G1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1";
        assert_eq!(tokenize(line), Err(ParseError::TooManyTokens { max: MAX_TOKENS }));
        let line = "G1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1 X1";
        assert_eq!(tokenize(line).map(|w| w.len()), Ok(MAX_TOKENS));
    }
}
