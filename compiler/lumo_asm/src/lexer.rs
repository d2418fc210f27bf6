//! Line lexer for assembly source.
//!
//! Lines are lexed one at a time: the format is line-oriented, and lexing
//! per line gives every token its column without tracking line starts.

use logos::Logos;

/// Raw token from logos (before unescaping).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip horizontal whitespace
enum RawToken {
    #[regex(r";[^\n]*", logos::skip)]
    Comment,

    #[regex(r"\.[a-z]+")]
    Directive,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*:")]
    Label,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// `.func`, `.end`, `.params`, without the dot.
    Directive(String),
    /// `name:`, without the colon.
    Label(String),
    Ident(String),
    Int(i64),
    Float(f64),
    /// String literal with escapes already resolved.
    Str(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based byte column.
    pub column: u32,
}

/// Lexing failure on a single line.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected `{text}`")]
    Unexpected { text: String, column: u32 },
    #[error("invalid number literal `{text}`")]
    InvalidNumber { text: String, column: u32 },
    #[error("unterminated string literal")]
    UnterminatedString { column: u32 },
    #[error("unknown escape `\\{escape}`")]
    UnknownEscape { escape: char, column: u32 },
}

impl LexError {
    pub fn column(&self) -> u32 {
        match self {
            LexError::Unexpected { column, .. }
            | LexError::InvalidNumber { column, .. }
            | LexError::UnterminatedString { column }
            | LexError::UnknownEscape { column, .. } => *column,
        }
    }
}

/// Tokenize one line of source.
pub fn lex_line(text: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(text);
    while let Some(result) = lexer.next() {
        let slice = lexer.slice();
        let column = column_of(lexer.span().start);
        let kind = match result {
            Ok(RawToken::Directive) => TokenKind::Directive(slice[1..].to_string()),
            Ok(RawToken::Label) => TokenKind::Label(slice[..slice.len() - 1].to_string()),
            Ok(RawToken::Ident) => TokenKind::Ident(slice.to_string()),
            Ok(RawToken::Int(n)) => TokenKind::Int(n),
            Ok(RawToken::Float(x)) => TokenKind::Float(x),
            Ok(RawToken::Str) => TokenKind::Str(unescape(&slice[1..slice.len() - 1], column)?),
            // Skipped by its callback.
            Ok(RawToken::Comment) => continue,
            Err(()) => return Err(classify_error(slice, column)),
        };
        tokens.push(Token { kind, column });
    }
    Ok(tokens)
}

fn column_of(offset: usize) -> u32 {
    u32::try_from(offset + 1).unwrap_or(u32::MAX)
}

#[cold]
fn classify_error(slice: &str, column: u32) -> LexError {
    let text = slice.to_string();
    match slice.chars().next() {
        Some('"') => LexError::UnterminatedString { column },
        Some(c) if c.is_ascii_digit() || c == '-' => LexError::InvalidNumber { text, column },
        _ => LexError::Unexpected { text, column },
    }
}

/// Resolve `\n`, `\t`, `\\` and `\"`.
fn unescape(body: &str, column: u32) -> Result<String, LexError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(escape) => return Err(LexError::UnknownEscape { escape, column }),
            None => return Err(LexError::UnterminatedString { column }),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        lex_line(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn instruction_with_comment() {
        assert_eq!(
            kinds("  load x ; read x"),
            vec![
                TokenKind::Ident("load".to_string()),
                TokenKind::Ident("x".to_string()),
            ]
        );
    }

    #[test]
    fn labels_and_directives() {
        assert_eq!(
            kinds("top: .func f a"),
            vec![
                TokenKind::Label("top".to_string()),
                TokenKind::Directive("func".to_string()),
                TokenKind::Ident("f".to_string()),
                TokenKind::Ident("a".to_string()),
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("const -12 2.5 1.0e3"),
            vec![
                TokenKind::Ident("const".to_string()),
                TokenKind::Int(-12),
                TokenKind::Float(2.5),
                TokenKind::Float(1000.0),
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#"const "a\tb\n\"q\" \\""#),
            vec![
                TokenKind::Ident("const".to_string()),
                TokenKind::Str("a\tb\n\"q\" \\".to_string()),
            ]
        );
    }

    #[test]
    fn columns_are_one_based() {
        let tokens = lex_line("  call 2").unwrap();
        assert_eq!(tokens[0].column, 3);
        assert_eq!(tokens[1].column, 8);
    }

    #[test]
    fn errors_carry_columns() {
        let err = lex_line("const \"open").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { column: 7 });

        let err = lex_line(r#"const "\q""#).unwrap_err();
        assert_eq!(err.to_string(), "unknown escape `\\q`");

        let err = lex_line("load @x").unwrap_err();
        assert_eq!(err.column(), 6);

        let err = lex_line("const 99999999999999999999").unwrap_err();
        assert!(matches!(err, LexError::InvalidNumber { .. }));
    }
}
