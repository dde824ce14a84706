use std::sync::Arc;

use crate::core::expr::NEGATE_PRECEDENCE;
use crate::core::{BinaryOp, CasError, Expr, Function, Namespace, UnaryOp};
use crate::parser::lexer::{Operator, Spanned, Token};

/// Precedence of the postfix `[..]` index operator
const INDEX_PRECEDENCE: u8 = 10;

/// Parse tokens into an expression using the Pratt parsing algorithm
pub(crate) fn parse_expression(tokens: &[Spanned], namespace: &Namespace) -> Result<Expr, CasError> {
    if tokens.is_empty() {
        return Err(CasError::UnexpectedEndOfInput);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        namespace,
    };

    let expr = parser.parse_expr(0)?;
    match parser.current_spanned() {
        None => Ok(expr),
        Some(extra) => Err(CasError::UnexpectedToken {
            expected: "end of input".to_string(),
            got: extra.token.to_user_string(),
            span: Some(extra.span),
        }),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    namespace: &'a Namespace,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn current_spanned(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn unexpected(&self, expected: &str) -> CasError {
        match self.current_spanned() {
            Some(s) => CasError::UnexpectedToken {
                expected: expected.to_string(),
                got: s.token.to_user_string(),
                span: Some(s.span),
            },
            None => CasError::UnexpectedEndOfInput,
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<(), CasError> {
        if self.current() == Some(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Expr, CasError> {
        // Parse left side (prefix)
        let mut left = self.parse_prefix()?;

        // Parse operators and right side (infix / postfix)
        while let Some(token) = self.current() {
            let precedence = match token {
                Token::Operator(op) => match op.infix_precedence() {
                    Some(p) => p,
                    None => break,
                },
                Token::LeftBracket => INDEX_PRECEDENCE,
                _ => break,
            };

            if precedence < min_precedence {
                break;
            }

            left = self.parse_infix(left, precedence)?;
        }

        Ok(left)
    }

    /// Comma separated expressions up to `close`, which is consumed
    fn parse_list(&mut self, close: &Token) -> Result<Vec<Expr>, CasError> {
        let mut items = Vec::new();

        if self.current() == Some(close) {
            self.advance();
            return Ok(items); // Empty list
        }

        loop {
            items.push(self.parse_expr(0)?);

            match self.current() {
                Some(Token::Comma) => {
                    self.advance(); // consume ,
                }
                Some(t) if t == close => {
                    self.advance();
                    break;
                }
                _ => {
                    return Err(self.unexpected(&format!(", or {}", close.to_user_string())));
                }
            }
        }

        Ok(items)
    }

    fn parse_prefix(&mut self) -> Result<Expr, CasError> {
        let spanned = self
            .current_spanned()
            .ok_or(CasError::UnexpectedEndOfInput)?;

        match &spanned.token {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::constant(n.clone()))
            }

            Token::Identifier(name) => {
                self.advance();
                match self.current() {
                    Some(Token::LeftBracket) => {
                        self.advance();
                        let args = self.parse_list(&Token::RightBracket)?;
                        self.call(name, args)
                    }
                    Some(Token::LeftParen) => {
                        self.advance();
                        let args = self.parse_list(&Token::RightParen)?;
                        self.call(name, args)
                    }
                    _ => Ok(self
                        .namespace
                        .lookup_name(name)
                        .cloned()
                        .unwrap_or_else(|| Expr::variable(name))),
                }
            }

            // Unary minus binds tighter than `*` and looser than `^`,
            // so -x^2 parses as -(x^2)
            Token::Operator(Operator::Sub) => {
                self.advance();
                Ok(self.parse_expr(NEGATE_PRECEDENCE)?.negate())
            }

            Token::Operator(Operator::Add) => {
                self.advance();
                self.parse_expr(NEGATE_PRECEDENCE)
            }

            Token::Operator(Operator::Not) => {
                self.advance();
                let operand = self.parse_expr(UnaryOp::Not.precedence() + 1)?;
                Ok(Expr::unary(UnaryOp::Not, operand))
            }

            Token::LeftParen => {
                self.advance(); // consume (
                let expr = self.parse_expr(0)?;
                self.expect(&Token::RightParen, "')'")?;
                Ok(expr)
            }

            Token::LeftBrace => {
                self.advance();
                let members = self.parse_list(&Token::RightBrace)?;
                Ok(Expr::set(members))
            }

            Token::LeftBracket => {
                self.advance();
                self.parse_matrix()
            }

            other => Err(CasError::InvalidToken {
                token: other.to_user_string(),
                span: Some(spanned.span),
            }),
        }
    }

    /// Rows `[a, b][c, d]` up to the closing `]`; the opening `[` is consumed
    fn parse_matrix(&mut self) -> Result<Expr, CasError> {
        let mut rows = Vec::new();
        while self.current() == Some(&Token::LeftBracket) {
            self.advance();
            rows.push(self.parse_list(&Token::RightBracket)?);
        }
        self.expect(&Token::RightBracket, "'[' or ']'")?;
        Expr::matrix(rows)
    }

    /// A call resolved through the namespace; unknown names become opaque functions
    fn call(&self, name: &str, args: Vec<Expr>) -> Result<Expr, CasError> {
        let function = match self.namespace.resolve_function(name, args.len()) {
            Ok(f) => f,
            Err(CasError::UnresolvedName { .. }) => Arc::new(Function::unknown(name, args.len())),
            Err(e) => return Err(e),
        };
        Ok(Expr::call(function, args))
    }

    fn parse_infix(&mut self, left: Expr, precedence: u8) -> Result<Expr, CasError> {
        let spanned = self
            .current_spanned()
            .ok_or(CasError::UnexpectedEndOfInput)?;

        let op = match &spanned.token {
            Token::Operator(op) => *op,
            Token::LeftBracket => {
                self.advance();
                let indices = self.parse_list(&Token::RightBracket)?;
                return Ok(Expr::index(left, indices));
            }
            other => {
                return Err(CasError::InvalidToken {
                    token: other.to_user_string(),
                    span: Some(spanned.span),
                });
            }
        };
        self.advance();

        if op == Operator::Prime {
            return Ok(Expr::unary(UnaryOp::Prime, left));
        }

        // Right associative for power, left for others
        let next_precedence = if op == Operator::Pow {
            precedence
        } else {
            precedence + 1
        };
        let right = self.parse_expr(next_precedence)?;

        let result = match op {
            Operator::Add => Expr::add_expr(left, right),
            Operator::Sub => Expr::sub_expr(left, right),
            Operator::Mul => Expr::mul_expr(left, right),
            Operator::Div => Expr::div_expr(left, right),
            Operator::Pow => Expr::power(left, right),
            Operator::And => Expr::binary(BinaryOp::And, left, right),
            Operator::Or => Expr::binary(BinaryOp::Or, left, right),
            Operator::Equal | Operator::Assign => Expr::binary(BinaryOp::Equal, left, right),
            Operator::NotEqual => Expr::binary(BinaryOp::NotEqual, left, right),
            Operator::Less => Expr::binary(BinaryOp::Less, left, right),
            Operator::LessEqual => Expr::binary(BinaryOp::LessEqual, left, right),
            Operator::Greater => Expr::binary(BinaryOp::Greater, left, right),
            Operator::GreaterEqual => Expr::binary(BinaryOp::GreaterEqual, left, right),
            Operator::ApproxEqual => Expr::binary(BinaryOp::ApproxEqual, left, right),
            Operator::Arrow => Expr::arrow(left, right),
            Operator::Colon => Expr::binary(BinaryOp::Substitute, left, right),
            Operator::Prime | Operator::Not => {
                return Err(CasError::InvalidToken {
                    token: format!("operator '{}'", op.symbol()),
                    span: Some(spanned.span),
                });
            }
        };

        Ok(result)
    }
}
