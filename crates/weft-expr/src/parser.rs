//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! Precedence, lowest first:
//!
//! ```text
//! ternary      cond ? a : b          (right associative)
//! coalesce     a ?? b
//! or           a || b, a or b
//! and          a && b, a and b
//! equality     == != === !==
//! comparison   < <= > >= in, not in
//! additive     + -
//! product      * / %
//! unary        ! not - +
//! postfix      a.b  a?.b  a[i]  a.m(args)  f(args)
//! ```

use crate::ast::Expr;
use crate::error::{ExprError, Result};
use crate::lexer::{tokenize, Spanned, Token};
use crate::op::{BinaryOp, UnaryOp};
use crate::value::Value;

/// Maximum nesting of sub-expressions and unary operators.
const MAX_NESTING: usize = 64;

/// Maximum binary and postfix operators in one expression, bounding chains.
const MAX_OPERATORS: usize = 512;

/// Parses an expression; the whole input must be consumed.
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
        operators: 0,
    };
    let expr = parser.expression()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(extra) => Err(ExprError::syntax(
            extra.offset,
            format!("unexpected {}", extra.token.describe()),
        )),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.eat(&token) {
            return Ok(());
        }
        let found = self
            .peek()
            .map_or_else(|| "end of expression".to_string(), Token::describe);
        Err(ExprError::syntax(
            self.offset(),
            format!("expected {}, found {}", token.describe(), found),
        ))
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(ExprError::syntax(self.offset(), "expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn count_operator(&mut self) -> Result<()> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(ExprError::syntax(self.offset(), "too many operators"));
        }
        Ok(())
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Result<Expr> {
        self.count_operator()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn expression(&mut self) -> Result<Expr> {
        self.nested(Self::ternary)
    }

    fn ternary(&mut self) -> Result<Expr> {
        let cond = self.coalesce()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = self.expression()?;
        self.expect(Token::Colon)?;
        let otherwise = self.expression()?;
        Ok(Expr::Ternary(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn coalesce(&mut self) -> Result<Expr> {
        let mut left = self.or()?;
        while self.eat(&Token::Coalesce) {
            let right = self.or()?;
            self.count_operator()?;
            left = Expr::Coalesce(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut left = self.and()?;
        while self.eat(&Token::OrOr) || self.eat_keyword("or") {
            let right = self.and()?;
            left = self.binary(BinaryOp::Or, left, right)?;
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut left = self.equality()?;
        while self.eat(&Token::AndAnd) || self.eat_keyword("and") {
            let right = self.equality()?;
            left = self.binary(BinaryOp::And, left, right)?;
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.comparison()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                Some(Token::Ident(kw)) if kw == "in" => BinaryOp::In,
                Some(Token::Ident(kw))
                    if kw == "not"
                        && matches!(self.peek_at(1), Some(Token::Ident(next)) if next == "in") =>
                {
                    self.pos += 1;
                    BinaryOp::NotIn
                }
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.additive()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut left = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.product()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn product(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = if self.eat(&Token::Bang) || self.eat_keyword("not") {
            UnaryOp::Not
        } else if self.eat(&Token::Minus) {
            UnaryOp::Neg
        } else if self.eat(&Token::Plus) {
            UnaryOp::Plus
        } else {
            return self.postfix();
        };
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) || self.eat(&Token::QuestionDot) {
                self.count_operator()?;
                let name = self.member_name()?;
                if self.eat(&Token::LParen) {
                    let args = self.arguments(Token::RParen)?;
                    expr = Expr::MethodCall(Box::new(expr), name, args);
                } else {
                    expr = Expr::Member(Box::new(expr), name);
                }
            } else if self.eat(&Token::LBracket) {
                self.count_operator()?;
                let index = self.expression()?;
                self.expect(Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.peek() == Some(&Token::LParen) {
                let Expr::Var(name) = expr else {
                    return Err(ExprError::syntax(
                        self.offset(),
                        "only named functions can be called",
                    ));
                };
                self.pos += 1;
                let args = self.arguments(Token::RParen)?;
                expr = Expr::Call(name, args);
            } else {
                return Ok(expr);
            }
        }
    }

    /// Member names after `.`; numeric segments (`items.0`) are allowed.
    fn member_name(&mut self) -> Result<String> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(Token::Int(n)) if n >= 0 => Ok(n.to_string()),
            other => Err(ExprError::syntax(
                offset,
                format!(
                    "expected member name, found {}",
                    other.map_or_else(|| "end of expression".to_string(), |t| t.describe())
                ),
            )),
        }
    }

    fn arguments(&mut self, close: Token) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(&close) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&close) {
                return Ok(args);
            }
            self.expect(Token::Comma)?;
            // Trailing comma.
            if self.eat(&close) {
                return Ok(args);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let offset = self.offset();
        let Some(token) = self.advance() else {
            return Err(ExprError::syntax(offset, "unexpected end of expression"));
        };

        match token {
            Token::Int(n) => Ok(Expr::Literal(Value::from(n))),
            Token::Float(x) => Ok(Expr::Literal(Value::from(x))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" | "True" => Expr::Literal(Value::Bool(true)),
                "false" | "False" => Expr::Literal(Value::Bool(false)),
                "null" | "None" | "undefined" => Expr::Literal(Value::Null),
                _ => Expr::Var(name),
            }),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::Array(self.arguments(Token::RBracket)?)),
            Token::LBrace => self.object(),
            other => Err(ExprError::syntax(
                offset,
                format!("unexpected {}", other.describe()),
            )),
        }
    }

    fn object(&mut self) -> Result<Expr> {
        let mut entries = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Object(entries));
        }
        loop {
            let offset = self.offset();
            let key = match self.advance() {
                Some(Token::Ident(name)) | Some(Token::Str(name)) => name,
                Some(Token::Int(n)) => n.to_string(),
                _ => return Err(ExprError::syntax(offset, "expected object key")),
            };
            self.expect(Token::Colon)?;
            entries.push((key, self.expression()?));
            if self.eat(&Token::RBrace) {
                return Ok(Expr::Object(entries));
            }
            self.expect(Token::Comma)?;
            if self.eat(&Token::RBrace) {
                return Ok(Expr::Object(entries));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.to_string()))
    }

    fn lit(v: impl Into<Value>) -> Box<Expr> {
        Box::new(Expr::Literal(v.into()))
    }

    #[test]
    fn precedence_of_arithmetic() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                lit(1),
                Box::new(Expr::Binary(BinaryOp::Mul, lit(2), lit(3)))
            )
        );
    }

    #[test]
    fn ternary_is_right_associative() {
        assert_eq!(
            parse("a ? 1 : b ? 2 : 3").unwrap(),
            Expr::Ternary(
                var("a"),
                lit(1),
                Box::new(Expr::Ternary(var("b"), lit(2), lit(3)))
            )
        );
    }

    #[test]
    fn coalesce_binds_looser_than_or() {
        assert_eq!(
            parse("a || b ?? c").unwrap(),
            Expr::Coalesce(
                Box::new(Expr::Binary(BinaryOp::Or, var("a"), var("b"))),
                var("c")
            )
        );
    }

    #[test]
    fn keyword_operators() {
        assert_eq!(
            parse("not a and b").unwrap(),
            Expr::Binary(
                BinaryOp::And,
                Box::new(Expr::Unary(UnaryOp::Not, var("a"))),
                var("b")
            )
        );
        assert_eq!(
            parse("x not in xs").unwrap(),
            Expr::Binary(BinaryOp::NotIn, var("x"), var("xs"))
        );
    }

    #[test]
    fn postfix_chains() {
        assert_eq!(
            parse("price.toFixed(2)").unwrap(),
            Expr::MethodCall(var("price"), "toFixed".into(), vec![*lit(2)])
        );
        assert_eq!(
            parse("user?.tags[0]").unwrap(),
            Expr::Index(Box::new(Expr::Member(var("user"), "tags".into())), lit(0))
        );
        assert_eq!(
            parse("items.0.name").unwrap(),
            Expr::Member(
                Box::new(Expr::Member(var("items"), "0".into())),
                "name".into()
            )
        );
    }

    #[test]
    fn calls_with_nested_arguments() {
        assert_eq!(
            parse("join(['a', f(1, 2)], ', ')").unwrap(),
            Expr::Call(
                "join".into(),
                vec![
                    Expr::Array(vec![
                        *lit("a"),
                        Expr::Call("f".into(), vec![*lit(1), *lit(2)])
                    ]),
                    *lit(", ")
                ]
            )
        );
    }

    #[test]
    fn object_literal() {
        assert_eq!(
            parse("{a: 1, 'b c': x,}").unwrap(),
            Expr::Object(vec![("a".into(), *lit(1)), ("b c".into(), *var("x"))])
        );
    }

    #[test]
    fn syntax_errors() {
        assert!(parse("").is_err());
        assert!(parse("a +").is_err());
        assert!(parse("(a").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("a ? b").is_err());
        assert!(parse("f(1)(2)").is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let source = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(parse(&source).is_err());
        assert!(parse(&"!".repeat(10_000)).is_err());
        assert!(parse(&format!("{}x", "!".repeat(50))).is_ok());
        assert!(parse(&vec!["1"; 2000].join(" + ")).is_err());
        assert!(parse(&vec!["1"; 200].join(" + ")).is_ok());
    }
}
