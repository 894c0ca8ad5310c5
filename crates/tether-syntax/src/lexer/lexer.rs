use super::token::*;
use crate::error::SyntaxErrorKind;
use miette::SourceSpan;
use logos::Logos;

/// Lexes the input string into tokens.
///
/// Unrecognized input does not stop lexing; each bad token is reported and
/// skipped so the parser still sees the rest of the file.
pub fn lex(input: &str) -> (Vec<Token<'_>>, Vec<(SyntaxErrorKind, SourceSpan)>) {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while let Some(kind) = lexer.next() {
        let range = lexer.span();
        let lexeme = &input[range.clone()];
        let span = SourceSpan::new(range.start.into(), range.len());

        match kind {
            TokenKind::Error => {
                errors.push((SyntaxErrorKind::UnrecognizedToken(lexeme.to_string()), span));
            }
            _ => tokens.push(Token { kind, lexeme, span }),
        }
    }

    (tokens, errors)
}
