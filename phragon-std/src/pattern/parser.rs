//! Template tokenizer.
//!
//! ```text
//! template     := (literal | param)*
//! literal      := any character except '{' '}' ; '\' escapes the next character
//! param        := '{' name [':' modifierCall] ['?'] ['=' default] '}'
//! modifierCall := modifierName ['(' arg (',' arg)* ')']
//! ```
//!
//! Inside modifier arguments a backslash and the character after it are kept
//! verbatim and never act as delimiters, so `reg(\d+)` reaches the modifier
//! as `\d+`. Parentheses nest, so `reg((a|b)[0-9]{2})` is a single argument.

use phragon_core::PatternError;
use std::{iter::Peekable, str::CharIndices};

/// A modifier invocation inside a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierCall {
    /// Registered modifier name.
    pub name: String,
    /// Arguments, trimmed.
    pub args: Vec<String>,
}

/// A parameter placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamToken {
    /// Parameter name.
    pub name: String,
    /// Optional modifier invocation.
    pub modifier: Option<ModifierCall>,
    /// Whether the segment may be absent.
    pub optional: bool,
    /// Literal default used when the value is absent.
    pub default: Option<String>,
}

/// One piece of a template, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text (escapes already resolved).
    Literal(String),
    /// A parameter placeholder.
    Param(ParamToken),
}

/// Split a template into tokens.
pub fn tokenize(template: &str) -> Result<Vec<Token>, PatternError> {
    Tokenizer {
        template,
        chars: template.char_indices().peekable(),
    }
    .run()
}

struct Tokenizer<'a> {
    template: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl Tokenizer<'_> {
    fn run(mut self) -> Result<Vec<Token>, PatternError> {
        let mut tokens = Vec::new();
        let mut literal = String::new();

        while let Some((pos, c)) = self.chars.next() {
            match c {
                '\\' => {
                    let (_, escaped) = self.chars.next().ok_or(PatternError::UnterminatedEscape)?;
                    literal.push(escaped);
                }
                '{' => {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Param(self.param(pos)?));
                }
                '}' => return Err(self.error(pos, "unmatched `}`")),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        Ok(tokens)
    }

    fn param(&mut self, open: usize) -> Result<ParamToken, PatternError> {
        let name = self.ident();
        if name.is_empty() {
            return Err(self.error(open + 1, "expected parameter name"));
        }

        let modifier = if self.eat(':') {
            Some(self.modifier_call()?)
        } else {
            None
        };
        let optional = self.eat('?');
        let default = if self.eat('=') {
            Some(self.default_value(open)?)
        } else {
            None
        };

        match self.chars.next() {
            Some((_, '}')) => Ok(ParamToken {
                name,
                modifier,
                optional,
                default,
            }),
            Some((pos, c)) => Err(self.error(pos, format!("unexpected `{c}` in parameter"))),
            None => Err(self.error(open, "unclosed parameter")),
        }
    }

    fn modifier_call(&mut self) -> Result<ModifierCall, PatternError> {
        let start = self.position();
        let name = self.ident();
        if name.is_empty() {
            return Err(self.error(start, "expected modifier name"));
        }
        let args = if self.eat('(') {
            self.args(start)?
        } else {
            Vec::new()
        };
        Ok(ModifierCall { name, args })
    }

    fn args(&mut self, start: usize) -> Result<Vec<String>, PatternError> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut depth = 1usize;

        loop {
            let Some((_, c)) = self.chars.next() else {
                return Err(self.error(start, "unclosed modifier arguments"));
            };
            match c {
                '\\' => {
                    let (_, escaped) = self.chars.next().ok_or(PatternError::UnterminatedEscape)?;
                    current.push('\\');
                    current.push(escaped);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        args.push(current.trim().to_string());
                        break;
                    }
                    current.push(c);
                }
                ',' if depth == 1 => args.push(std::mem::take(&mut current).trim().to_string()),
                _ => current.push(c),
            }
        }

        // `name()` means no arguments at all.
        if args.len() == 1 && args[0].is_empty() {
            args.clear();
        }
        Ok(args)
    }

    fn default_value(&mut self, open: usize) -> Result<String, PatternError> {
        let mut value = String::new();
        loop {
            match self.chars.peek() {
                Some((_, '}')) => return Ok(value),
                Some((_, '\\')) => {
                    self.chars.next();
                    let (_, escaped) = self.chars.next().ok_or(PatternError::UnterminatedEscape)?;
                    value.push(escaped);
                }
                Some((pos, '{')) => {
                    let pos = *pos;
                    return Err(self.error(pos, "unexpected `{` in default value"));
                }
                Some((_, c)) => {
                    value.push(*c);
                    self.chars.next();
                }
                None => return Err(self.error(open, "unclosed parameter")),
            }
        }
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some((_, c)) = self.chars.peek() {
            if !(c.is_ascii_alphanumeric() || *c == '_') {
                break;
            }
            ident.push(*c);
            self.chars.next();
        }
        ident
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|(_, c)| *c == expected).is_some()
    }

    fn position(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(pos, _)| *pos)
            .unwrap_or(self.template.len())
    }

    fn error(&self, position: usize, message: impl Into<String>) -> PatternError {
        PatternError::syntax(self.template, position, message)
    }
}
