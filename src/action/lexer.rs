//! Tokenizer for the action call syntax.

use super::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or bare literal made of alphanumerics and `_`.
    Ident(String),
    /// Double-quoted string with escapes resolved.
    Str(String),
    LParen,
    RParen,
    Comma,
    Equals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token start in the action text.
    pub offset: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split action text into tokens, skipping whitespace.
pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            ',' => {
                chars.next();
                TokenKind::Comma
            }
            '=' => {
                chars.next();
                TokenKind::Equals
            }
            '"' => {
                chars.next();
                TokenKind::Str(read_string(&mut chars, offset)?)
            }
            c if is_ident_char(c) => {
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                }
                TokenKind::Ident(ident)
            }
            other => {
                return Err(SyntaxError::new(
                    offset,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Result<String, SyntaxError> {
    let mut value = String::new();
    while let Some((offset, c)) = chars.next() {
        match c {
            '"' => return Ok(value),
            '\\' => match chars.next() {
                Some((_, '"')) => value.push('"'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                // Unknown escapes are kept verbatim.
                Some((_, other)) => {
                    value.push('\\');
                    value.push(other);
                }
                None => {
                    return Err(SyntaxError::new(offset, "unterminated escape sequence"));
                }
            },
            c => value.push(c),
        }
    }
    Err(SyntaxError::new(start, "unterminated string literal"))
}
