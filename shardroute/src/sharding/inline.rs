//! Inline expression sharding.
//!
//! The expression renders the target name from the sharding value, e.g.
//! `t_order_${order_id % 2}` sends `order_id = 5` to `t_order_1`.
//! Placeholders support integer arithmetic (`+ - * / %`, parentheses,
//! unary minus). Any identifier stands for the sharding value, so
//! `${user_id}` renders the value as is.

use super::{Error, PreciseAlgorithm, RangeAlgorithm, Shard, Value, ValueRange};

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Value,
    Integer(i64),
    Negate(Box<Expr>),
    Binary(Box<Expr>, Op, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Integer(i64),
    Ident,
    Op(Op),
    Open,
    Close,
}

/// Renders the expression and picks the target with that name.
#[derive(Debug, Clone, PartialEq)]
pub struct Inline {
    expression: String,
    parts: Vec<Part>,
}

impl Inline {
    pub fn new(expression: &str) -> Result<Self, Error> {
        let invalid =
            |reason: &str| Error::InvalidExpression(expression.to_string(), reason.to_string());

        let mut parts = vec![];
        let mut rest = expression;

        while let Some(position) = rest.find('$') {
            let after = &rest[position + 1..];
            let body_start = if after.starts_with("->{") {
                position + 4
            } else if after.starts_with('{') {
                position + 2
            } else {
                push_text(&mut parts, &rest[..position + 1]);
                rest = after;
                continue;
            };

            push_text(&mut parts, &rest[..position]);

            let end = rest[body_start..]
                .find('}')
                .map(|end| body_start + end)
                .ok_or_else(|| invalid("unterminated placeholder"))?;

            let tokens = tokenize(&rest[body_start..end]).map_err(invalid)?;
            let mut parser = Parser { tokens, position: 0 };
            let expr = parser.sum().map_err(invalid)?;
            if parser.position != parser.tokens.len() {
                return Err(invalid("unexpected token"));
            }

            parts.push(Part::Expr(expr));
            rest = &rest[end + 1..];
        }

        push_text(&mut parts, rest);

        if !parts.iter().any(|part| matches!(part, Part::Expr(_))) {
            return Err(invalid("no placeholder"));
        }

        Ok(Self {
            expression: expression.to_string(),
            parts,
        })
    }

    /// Target name for the value.
    pub fn render(&self, value: &Value) -> Result<String, Error> {
        let mut name = String::new();

        for part in &self.parts {
            match part {
                Part::Text(text) => name.push_str(text),
                Part::Expr(Expr::Value) => match value {
                    Value::Integer(integer) => name.push_str(&integer.to_string()),
                    Value::Uuid(uuid) => name.push_str(&uuid.to_string()),
                    Value::String(varchar) => name.push_str(varchar),
                },
                Part::Expr(expr) => {
                    let integer = value.integer().ok_or_else(|| self.invalid(value))?;
                    let result = eval(expr, integer).ok_or_else(|| self.invalid(value))?;
                    name.push_str(&result.to_string());
                }
            }
        }

        Ok(name)
    }

    fn invalid(&self, value: &Value) -> Error {
        Error::InvalidValue(value.clone(), "inline")
    }
}

impl PreciseAlgorithm for Inline {
    fn shard_value(&self, targets: &[String], value: &Value) -> Result<Shard, Error> {
        let name = self.render(value)?;
        Ok(targets
            .iter()
            .position(|target| target.eq_ignore_ascii_case(&name))
            .into())
    }
}

/// Names can't be computed for an interval; every target is a candidate.
impl RangeAlgorithm for Inline {
    fn shard_range(&self, _targets: &[String], _range: &ValueRange) -> Result<Shard, Error> {
        Ok(Shard::All)
    }
}

fn push_text(parts: &mut Vec<Part>, text: &str) {
    if text.is_empty() {
        return;
    }

    if let Some(Part::Text(previous)) = parts.last_mut() {
        previous.push_str(text);
    } else {
        parts.push(Part::Text(text.to_string()));
    }
}

fn tokenize(body: &str) -> Result<Vec<Token>, &'static str> {
    let mut tokens = vec![];
    let mut chars = body.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Op(Op::Add),
            '-' => Token::Op(Op::Sub),
            '*' => Token::Op(Op::Mul),
            '/' => Token::Op(Op::Div),
            '%' => Token::Op(Op::Rem),
            '(' => Token::Open,
            ')' => Token::Close,
            c if c.is_ascii_digit() || c.is_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        end = i + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &body[start..end];
                if c.is_ascii_digit() {
                    Token::Integer(word.parse().map_err(|_| "invalid integer")?)
                } else {
                    Token::Ident
                }
            }
            _ => return Err("unexpected character"),
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err("empty placeholder");
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).copied();
        self.position += 1;
        token
    }

    fn peek_op(&self, ops: &[Op]) -> Option<Op> {
        match self.tokens.get(self.position) {
            Some(Token::Op(op)) if ops.contains(op) => Some(*op),
            _ => None,
        }
    }

    fn sum(&mut self) -> Result<Expr, &'static str> {
        let mut left = self.product()?;
        while let Some(op) = self.peek_op(&[Op::Add, Op::Sub]) {
            self.position += 1;
            left = Expr::Binary(Box::new(left), op, Box::new(self.product()?));
        }
        Ok(left)
    }

    fn product(&mut self) -> Result<Expr, &'static str> {
        let mut left = self.factor()?;
        while let Some(op) = self.peek_op(&[Op::Mul, Op::Div, Op::Rem]) {
            self.position += 1;
            left = Expr::Binary(Box::new(left), op, Box::new(self.factor()?));
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Expr, &'static str> {
        match self.next() {
            Some(Token::Integer(integer)) => Ok(Expr::Integer(integer)),
            Some(Token::Ident) => Ok(Expr::Value),
            Some(Token::Op(Op::Sub)) => Ok(Expr::Negate(Box::new(self.factor()?))),
            Some(Token::Open) => {
                let expr = self.sum()?;
                match self.next() {
                    Some(Token::Close) => Ok(expr),
                    _ => Err("missing ')'"),
                }
            }
            _ => Err("expected a value"),
        }
    }
}

/// `None` on overflow or division by zero.
fn eval(expr: &Expr, value: i64) -> Option<i64> {
    match expr {
        Expr::Value => Some(value),
        Expr::Integer(integer) => Some(*integer),
        Expr::Negate(expr) => eval(expr, value)?.checked_neg(),
        Expr::Binary(left, op, right) => {
            let (left, right) = (eval(left, value)?, eval(right, value)?);
            match op {
                Op::Add => left.checked_add(right),
                Op::Sub => left.checked_sub(right),
                Op::Mul => left.checked_mul(right),
                Op::Div => left.checked_div(right),
                Op::Rem => left.checked_rem(right),
            }
        }
    }
}
