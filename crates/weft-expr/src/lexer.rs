//! Tokenizer for the JS-like expression surface syntax.

use crate::error::{ExprError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Question,
    QuestionDot, // ?.
    Coalesce,    // ??

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,        // == and ===
    NotEq,       // != and !==
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Int(n) => n.to_string(),
            Token::Float(x) => x.to_string(),
            Token::Str(s) => format!("'{}'", s),
            Token::Ident(name) => name.clone(),
            other => format!("{:?}", other),
        }
    }
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    Lexer {
        input,
        chars: input.char_indices().collect(),
        pos: 0,
    }
    .run()
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.input.len(), |(offset, _)| *offset)
    }

    fn run(mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek(0) {
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }

            let offset = self.offset();
            let token = match c {
                '0'..='9' => self.number()?,
                '\'' | '"' => self.string(c)?,
                c if c.is_alphabetic() || c == '_' || c == '$' => self.ident(),
                _ => self.punct(c)?,
            };
            tokens.push(Spanned { token, offset });
        }

        Ok(tokens)
    }

    fn number(&mut self) -> Result<Token> {
        let start = self.offset();
        let mut is_float = false;

        while matches!(self.peek(0), Some('0'..='9')) {
            self.pos += 1;
        }
        if self.peek(0) == Some('.') && matches!(self.peek(1), Some('0'..='9')) {
            is_float = true;
            self.pos += 1;
            while matches!(self.peek(0), Some('0'..='9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(0), Some('e' | 'E')) {
            let digits_at = if matches!(self.peek(1), Some('+' | '-')) { 2 } else { 1 };
            if matches!(self.peek(digits_at), Some('0'..='9')) {
                is_float = true;
                self.pos += digits_at;
                while matches!(self.peek(0), Some('0'..='9')) {
                    self.pos += 1;
                }
            }
        }

        let text = &self.input[start..self.offset()];
        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Token::Int(n));
            }
        }
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ExprError::syntax(start, format!("invalid number '{}'", text)))
    }

    fn string(&mut self, quote: char) -> Result<Token> {
        let start = self.offset();
        self.pos += 1;
        let mut out = String::new();

        loop {
            match self.peek(0) {
                None => return Err(ExprError::syntax(start, "unterminated string literal")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(Token::Str(out));
                }
                Some('\\') => {
                    let escaped = self
                        .peek(1)
                        .ok_or_else(|| ExprError::syntax(start, "unterminated string literal"))?;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                    self.pos += 2;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn ident(&mut self) -> Token {
        let start = self.offset();
        while matches!(self.peek(0), Some(c) if c.is_alphanumeric() || c == '_' || c == '$') {
            self.pos += 1;
        }
        Token::Ident(self.input[start..self.offset()].to_string())
    }

    fn punct(&mut self, c: char) -> Result<Token> {
        let next = self.peek(1);
        let third = self.peek(2);

        let (token, width) = match (c, next) {
            ('?', Some('?')) => (Token::Coalesce, 2),
            ('?', Some('.')) if !matches!(third, Some('0'..='9')) => (Token::QuestionDot, 2),
            ('?', _) => (Token::Question, 1),
            ('=', Some('=')) if third == Some('=') => (Token::EqEq, 3),
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) if third == Some('=') => (Token::NotEq, 3),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('!', _) => (Token::Bang, 1),
            ('<', Some('=')) => (Token::Le, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', Some('=')) => (Token::Ge, 2),
            ('>', _) => (Token::Gt, 1),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            ('{', _) => (Token::LBrace, 1),
            ('}', _) => (Token::RBrace, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            (':', _) => (Token::Colon, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            _ => {
                return Err(ExprError::syntax(
                    self.offset(),
                    format!("unexpected character '{}'", c),
                ))
            }
        };

        self.pos += width;
        Ok(token)
    }
}
