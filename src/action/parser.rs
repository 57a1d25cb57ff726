//! Recursive-descent parser over [`lexer`](super::lexer) tokens.

use super::lexer::{tokenize, Token, TokenKind};
use super::{Action, ActionError, SyntaxError, ToolArgs, FINISH};

/// A call as written by the model: `name(key=value, ...)`.
#[derive(Debug)]
struct Call {
    name: String,
    /// Arguments in source order.
    args: Vec<Arg>,
    args_offset: usize,
}

/// One `key=value` argument.
#[derive(Debug)]
struct Arg {
    key: String,
    value: String,
    /// The value was a string literal rather than a bare token.
    quoted: bool,
    offset: usize,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn offset(&self) -> usize {
        self.peek().map(|t| t.offset).unwrap_or(self.end)
    }

    fn expect(&mut self, want: TokenKind, what: &str) -> Result<usize, SyntaxError> {
        match self.next() {
            Some(token) if token.kind == want => Ok(token.offset),
            Some(token) => Err(SyntaxError::new(token.offset, format!("expected {}", what))),
            None => Err(SyntaxError::new(self.end, format!("expected {}, found end of input", what))),
        }
    }

    fn ident(&mut self, what: &str) -> Result<(String, usize), SyntaxError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Ident(name),
                offset,
            }) => Ok((name, offset)),
            Some(token) => Err(SyntaxError::new(token.offset, format!("expected {}", what))),
            None => Err(SyntaxError::new(self.end, format!("expected {}, found end of input", what))),
        }
    }

    fn value(&mut self) -> Result<(String, bool), SyntaxError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Str(value),
                ..
            }) => Ok((value, true)),
            Some(Token {
                kind: TokenKind::Ident(value),
                ..
            }) => Ok((value, false)),
            Some(token) => Err(SyntaxError::new(token.offset, "expected quoted value")),
            None => Err(SyntaxError::new(self.end, "expected quoted value, found end of input")),
        }
    }

    fn pair(&mut self) -> Result<Arg, SyntaxError> {
        let (key, offset) = self.ident("argument name")?;
        self.expect(TokenKind::Equals, "'=' after argument name")?;
        let (value, quoted) = self.value()?;
        Ok(Arg {
            key,
            value,
            quoted,
            offset,
        })
    }

    fn call_arguments(&mut self, name: String) -> Result<Call, SyntaxError> {
        let args_offset = self.expect(TokenKind::LParen, "'(' after name")?;
        let mut args = Vec::new();

        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::RParen) => {
                    self.next();
                    break;
                }
                Some(TokenKind::Ident(_)) => {
                    args.push(self.pair()?);
                    match self.peek().map(|t| &t.kind) {
                        Some(TokenKind::Comma) => {
                            self.next();
                        }
                        Some(TokenKind::RParen) => {}
                        Some(_) => return Err(SyntaxError::new(self.offset(), "expected ',' or ')'")),
                        None => {
                            return Err(SyntaxError::new(self.end, "missing closing ')'"));
                        }
                    }
                }
                Some(_) => return Err(SyntaxError::new(self.offset(), "expected argument name or ')'")),
                None => return Err(SyntaxError::new(self.end, "missing closing ')'")),
            }
        }

        if let Some(token) = self.peek() {
            return Err(SyntaxError::new(
                token.offset,
                "unexpected input after closing ')'",
            ));
        }

        Ok(Call {
            name,
            args,
            args_offset,
        })
    }
}

/// Parse the text after `Action:` into an [`Action`].
///
/// A leading `finish` identifier commits the parser to the finish form, so any
/// later syntax problem is reported as [`ActionError::MalformedFinish`].
pub fn parse_action(text: &str) -> Result<Action, ActionError> {
    let is_finish = text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .is_some_and(|head| head == FINISH);

    let wrap = |e: SyntaxError| {
        if is_finish {
            ActionError::MalformedFinish(e)
        } else {
            ActionError::MalformedCall(e)
        }
    };

    let tokens = tokenize(text).map_err(wrap)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: text.len(),
    };

    let (name, _) = parser.ident("tool name").map_err(wrap)?;
    let call = parser.call_arguments(name).map_err(wrap)?;

    if is_finish {
        return finish_from_call(call).map_err(ActionError::MalformedFinish);
    }

    let mut arguments = ToolArgs::new();
    for Arg { key, value, .. } in call.args {
        if let Some(previous) = arguments.insert(key.clone(), value) {
            tracing::warn!(
                tool = %call.name,
                key = %key,
                dropped = %previous,
                "Duplicate argument in tool call, keeping the last value"
            );
        }
    }

    Ok(Action::Invoke {
        tool_name: call.name,
        arguments,
    })
}

fn finish_from_call(call: Call) -> Result<Action, SyntaxError> {
    let mut args = call.args.into_iter();
    match (args.next(), args.next()) {
        (Some(arg), None) if arg.key != "answer" => Err(SyntaxError::new(
            arg.offset,
            format!("expected argument 'answer', found '{}'", arg.key),
        )),
        (Some(arg), None) if !arg.quoted => Err(SyntaxError::new(
            arg.offset,
            "answer must be a double-quoted string",
        )),
        (Some(arg), None) => Ok(Action::Finish { answer: arg.value }),
        (None, _) => Err(SyntaxError::new(call.args_offset, "missing 'answer' argument")),
        (Some(_), Some(extra)) => Err(SyntaxError::new(
            extra.offset,
            "finish takes exactly one argument",
        )),
    }
}
