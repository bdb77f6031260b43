//! Low-level BUG lexer.
//!
//! Splits source text into [`RawToken`]s carrying only a kind and a byte length.

use std::str::Chars;

pub mod token;
use token::{Base, RawLiteralKind, RawToken, RawTokenKind};

/// Returns `true` if `c` is considered a whitespace.
#[inline]
pub const fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Returns `true` if the given character is valid at the start of an identifier.
#[inline]
pub const fn is_id_start(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

/// Returns `true` if the given character is valid in an identifier.
#[inline]
pub const fn is_id_continue(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

const EOF_CHAR: char = '\0';

/// Peekable iterator over a char sequence.
///
/// Next characters can be peeked via `first` method,
/// and position can be shifted forward via `bump` method.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    len_remaining: usize,
    chars: Chars<'a>,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor over the given input string slice.
    pub fn new(input: &'a str) -> Self {
        Cursor { len_remaining: input.len(), chars: input.chars() }
    }

    /// Parses a token from the input string.
    pub fn advance_token(&mut self) -> RawToken {
        let Some(first_char) = self.bump() else { return RawToken::EOF };

        let token_kind = match first_char {
            '/' => match self.first() {
                '/' => self.line_comment(),
                '*' => self.block_comment(),
                _ => RawTokenKind::Slash,
            },

            c if is_whitespace(c) => {
                self.eat_while(is_whitespace);
                RawTokenKind::Whitespace
            }

            c if is_id_start(c) => {
                self.eat_while(is_id_continue);
                RawTokenKind::Ident
            }

            c @ '0'..='9' => RawTokenKind::Literal { kind: self.number(c) },

            ';' => RawTokenKind::Semi,
            ',' => RawTokenKind::Comma,
            '.' => RawTokenKind::Dot,
            '(' => RawTokenKind::OpenParen,
            ')' => RawTokenKind::CloseParen,
            '{' => RawTokenKind::OpenBrace,
            '}' => RawTokenKind::CloseBrace,
            '[' => RawTokenKind::OpenBracket,
            ']' => RawTokenKind::CloseBracket,
            ':' => RawTokenKind::Colon,
            '+' => RawTokenKind::Plus,
            '*' => RawTokenKind::Star,
            '%' => RawTokenKind::Percent,
            '=' => self.glue('=', RawTokenKind::EqEq, RawTokenKind::Eq),
            '!' => self.glue('=', RawTokenKind::Ne, RawTokenKind::Bang),
            '<' => self.glue('=', RawTokenKind::Le, RawTokenKind::Lt),
            '>' => self.glue('=', RawTokenKind::Ge, RawTokenKind::Gt),
            '-' => self.glue('>', RawTokenKind::Arrow, RawTokenKind::Minus),
            '&' => self.glue('&', RawTokenKind::AndAnd, RawTokenKind::Unknown),
            '|' => self.glue('|', RawTokenKind::OrOr, RawTokenKind::Unknown),

            c @ ('\'' | '"') => {
                let terminated = self.eat_string(c);
                RawTokenKind::Literal { kind: RawLiteralKind::Str { terminated } }
            }

            _ => RawTokenKind::Unknown,
        };
        let res = RawToken::new(token_kind, self.pos_within_token());
        self.reset_pos_within_token();
        res
    }

    /// Eats `next` if it follows, returning `glued`; otherwise returns `single`.
    fn glue(&mut self, next: char, glued: RawTokenKind, single: RawTokenKind) -> RawTokenKind {
        if self.first() == next {
            self.bump();
            glued
        } else {
            single
        }
    }

    fn line_comment(&mut self) -> RawTokenKind {
        self.bump();
        self.eat_while(|c| c != '\n');
        RawTokenKind::LineComment
    }

    fn block_comment(&mut self) -> RawTokenKind {
        self.bump();
        let mut terminated = false;
        while let Some(c) = self.bump() {
            if c == '*' && self.first() == '/' {
                terminated = true;
                self.bump();
                break;
            }
        }
        RawTokenKind::BlockComment { terminated }
    }

    fn number(&mut self, first_digit: char) -> RawLiteralKind {
        if first_digit == '0' && self.first() == 'x' {
            self.bump();
            let has_digits = self.eat_hexadecimal_digits();
            return RawLiteralKind::Int { base: Base::Hexadecimal, empty_int: !has_digits };
        }
        self.eat_decimal_digits();
        RawLiteralKind::Int { base: Base::Decimal, empty_int: false }
    }

    /// Eats a string until the given quote character. Returns `true` if the string was terminated.
    fn eat_string(&mut self, quote: char) -> bool {
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '\n' => return false,
                c if c == quote => return true,
                _ => {}
            }
        }
        false
    }

    /// Eats characters for a decimal number. Returns `true` if any digits were encountered.
    fn eat_decimal_digits(&mut self) -> bool {
        let mut has_digits = false;
        loop {
            match self.first() {
                '_' => {
                    self.bump();
                }
                '0'..='9' => {
                    has_digits = true;
                    self.bump();
                }
                _ => break,
            }
        }
        has_digits
    }

    /// Eats characters for a hexadecimal number. Returns `true` if any digits were encountered.
    fn eat_hexadecimal_digits(&mut self) -> bool {
        let mut has_digits = false;
        loop {
            match self.first() {
                '_' => {
                    self.bump();
                }
                '0'..='9' | 'a'..='f' | 'A'..='F' => {
                    has_digits = true;
                    self.bump();
                }
                _ => break,
            }
        }
        has_digits
    }

    /// Returns the remaining input as a string slice.
    pub fn as_str(&self) -> &'a str {
        self.chars.as_str()
    }

    /// Peeks the next symbol from the input stream without consuming it.
    /// If requested position doesn't exist, `EOF_CHAR` is returned.
    fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    /// Returns amount of already consumed symbols.
    fn pos_within_token(&self) -> u32 {
        (self.len_remaining - self.chars.as_str().len()) as u32
    }

    /// Resets the number of bytes consumed to 0.
    fn reset_pos_within_token(&mut self) {
        self.len_remaining = self.chars.as_str().len();
    }

    /// Moves to the next character.
    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    /// Eats symbols while predicate returns true or until the end of file is reached.
    fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while predicate(self.first()) && !self.chars.as_str().is_empty() {
            self.bump();
        }
    }
}

impl Iterator for Cursor<'_> {
    type Item = RawToken;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.advance_token();
        if token.kind == RawTokenKind::Eof { None } else { Some(token) }
    }
}
