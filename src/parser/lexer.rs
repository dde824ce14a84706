//! Tokenizer for the infix text form

use crate::core::{CasError, Real, Span};

/// Operators of the text form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Prime,
    Not,
    And,
    Or,
    Equal,
    /// `=`, read as `==`
    Assign,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    ApproxEqual,
    Arrow,
    Colon,
}

impl Operator {
    /// Binding power when the operator appears after an operand
    pub(crate) const fn infix_precedence(self) -> Option<u8> {
        match self {
            Self::Equal
            | Self::Assign
            | Self::NotEqual
            | Self::Less
            | Self::LessEqual
            | Self::Greater
            | Self::GreaterEqual
            | Self::ApproxEqual
            | Self::Colon => Some(1),
            Self::Arrow => Some(2),
            Self::And => Some(3),
            Self::Or => Some(4),
            Self::Add | Self::Sub => Some(5),
            Self::Mul | Self::Div => Some(7),
            Self::Pow => Some(8),
            Self::Prime => Some(9),
            Self::Not => None,
        }
    }

    pub(crate) const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Prime => "'",
            Self::Not => "!",
            Self::And => "&",
            Self::Or => "|",
            Self::Equal => "==",
            Self::Assign => "=",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::ApproxEqual => "~=",
            Self::Arrow => "->",
            Self::Colon => ":",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(Real),
    Identifier(String),
    Operator(Operator),
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
}

impl Token {
    /// Convert token to a user-friendly string for error messages
    pub(crate) fn to_user_string(&self) -> String {
        match self {
            Self::Number(n) => format!("number '{n}'"),
            Self::Identifier(name) => format!("'{name}'"),
            Self::Operator(op) => format!("'{}'", op.symbol()),
            Self::LeftParen => "'('".to_string(),
            Self::RightParen => "')'".to_string(),
            Self::LeftBracket => "'['".to_string(),
            Self::RightBracket => "']'".to_string(),
            Self::LeftBrace => "'{'".to_string(),
            Self::RightBrace => "'}'".to_string(),
            Self::Comma => "','".to_string(),
        }
    }
}

/// A token and where it came from
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub span: Span,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn read_number(&mut self) -> Result<Token, CasError> {
        let start = self.pos;
        self.eat_digits();
        if self.peek() == Some('.') {
            self.bump();
            self.eat_digits();
        }
        // Only an exponent when digits follow, `2e` is `2` then the name `e`
        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_follows = match self.peek_at(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                self.eat_digits();
            }
        }

        let text = &self.input[start..self.pos];
        Real::parse_decimal(text)
            .map(Token::Number)
            .ok_or_else(|| CasError::InvalidNumber {
                value: text.to_string(),
                span: Some(Span::new(start, self.pos)),
            })
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        Token::Identifier(self.input[start..self.pos].to_string())
    }

    /// Operator or punctuation starting at the current position
    fn read_symbol(&mut self, c: char) -> Option<Token> {
        let next = self.peek_at(1);
        let (token, len) = match (c, next) {
            ('-', Some('>')) => (Token::Operator(Operator::Arrow), 2),
            ('=', Some('=')) => (Token::Operator(Operator::Equal), 2),
            ('!', Some('=')) => (Token::Operator(Operator::NotEqual), 2),
            ('<', Some('=')) => (Token::Operator(Operator::LessEqual), 2),
            ('>', Some('=')) => (Token::Operator(Operator::GreaterEqual), 2),
            ('~', Some('=')) => (Token::Operator(Operator::ApproxEqual), 2),
            ('+', _) => (Token::Operator(Operator::Add), 1),
            ('-', _) => (Token::Operator(Operator::Sub), 1),
            ('*', _) => (Token::Operator(Operator::Mul), 1),
            ('/', _) => (Token::Operator(Operator::Div), 1),
            ('^', _) => (Token::Operator(Operator::Pow), 1),
            ('\'', _) => (Token::Operator(Operator::Prime), 1),
            ('!', _) => (Token::Operator(Operator::Not), 1),
            ('&', _) => (Token::Operator(Operator::And), 1),
            ('|', _) => (Token::Operator(Operator::Or), 1),
            ('=', _) => (Token::Operator(Operator::Assign), 1),
            ('<', _) => (Token::Operator(Operator::Less), 1),
            ('>', _) => (Token::Operator(Operator::Greater), 1),
            (':', _) => (Token::Operator(Operator::Colon), 1),
            ('(', _) => (Token::LeftParen, 1),
            (')', _) => (Token::RightParen, 1),
            ('[', _) => (Token::LeftBracket, 1),
            (']', _) => (Token::RightBracket, 1),
            ('{', _) => (Token::LeftBrace, 1),
            ('}', _) => (Token::RightBrace, 1),
            (',', _) => (Token::Comma, 1),
            _ => return None,
        };
        for _ in 0..len {
            self.bump();
        }
        Some(token)
    }
}

/// Split `input` into tokens
///
/// # Errors
/// `InvalidToken` for characters outside the grammar, `InvalidNumber` for
/// malformed literals.
pub(crate) fn lex(input: &str) -> Result<Vec<Spanned>, CasError> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut tokens = Vec::with_capacity(input.len() / 2);

    loop {
        lexer.skip_whitespace();
        let start = lexer.pos;
        let Some(c) = lexer.peek() else {
            break;
        };

        let token = if c.is_ascii_digit()
            || (c == '.' && lexer.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            lexer.read_number()?
        } else if c.is_alphabetic() || c == '_' {
            lexer.read_identifier()
        } else {
            lexer
                .read_symbol(c)
                .ok_or_else(|| CasError::InvalidToken {
                    token: c.to_string(),
                    span: Some(Span::new(start, start + c.len_utf8())),
                })?
        };

        tokens.push(Spanned {
            token,
            span: Span::new(start, lexer.pos),
        });
    }

    Ok(tokens)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("12 1.5 .5 2e-3"),
            vec![
                Token::Number(Real::from_i64(12)),
                Token::Number(Real::from_ratio(3, 2)),
                Token::Number(Real::from_ratio(1, 2)),
                Token::Number(Real::from_ratio(1, 500)),
            ]
        );
    }

    #[test]
    fn test_exponent_needs_digits() {
        assert_eq!(
            kinds("2e"),
            vec![
                Token::Number(Real::from_i64(2)),
                Token::Identifier("e".to_string())
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("a->b != c <= d ~= e == f"),
            vec![
                Token::Identifier("a".to_string()),
                Token::Operator(Operator::Arrow),
                Token::Identifier("b".to_string()),
                Token::Operator(Operator::NotEqual),
                Token::Identifier("c".to_string()),
                Token::Operator(Operator::LessEqual),
                Token::Identifier("d".to_string()),
                Token::Operator(Operator::ApproxEqual),
                Token::Identifier("e".to_string()),
                Token::Operator(Operator::Equal),
                Token::Identifier("f".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = lex("ab + 1").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(3, 4));
    }

    #[test]
    fn test_invalid_character() {
        let err = lex("x $ y").unwrap_err();
        assert_eq!(
            err,
            CasError::InvalidToken {
                token: "$".to_string(),
                span: Some(Span::at(2)),
            }
        );
    }
}
