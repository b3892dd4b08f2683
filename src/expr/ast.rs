use std::fmt;

use crate::Value;

/// Binary operators, excluding the short-circuiting `and` / `or`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    List(Vec<Expr>),
    Field {
        target: Box<Expr>,
        name: String,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Method {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Variable(name) => write!(f, "#{name}"),
            Expr::List(items) => {
                write!(f, "{{")?;
                write_args(f, items)?;
                write!(f, "}}")
            }
            Expr::Field { target, name } => write!(f, "{target}.{name}"),
            Expr::Index { target, index } => write!(f, "{target}[{index}]"),
            Expr::Method { target, name, args } => {
                write!(f, "{target}.{name}(")?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Unary { op, operand } => write!(f, "{}{operand}", op.symbol()),
            Expr::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::And(a, b) => write!(f, "({a} and {b})"),
            Expr::Or(a, b) => write!(f, "({a} or {b})"),
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => write!(f, "({condition} ? {then} : {otherwise})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_structure() {
        let expr = Expr::And(
            Box::new(Expr::Binary {
                op: BinaryOp::Gt,
                left: Box::new(Expr::Variable("amount".into())),
                right: Box::new(Expr::Literal(Value::Int(100))),
            }),
            Box::new(Expr::Method {
                target: Box::new(Expr::Variable("tags".into())),
                name: "contains".into(),
                args: vec![Expr::Literal(Value::String("vip".into()))],
            }),
        );
        assert_eq!(
            expr.to_string(),
            "((#amount > 100) and #tags.contains('vip'))"
        );
    }

    #[test]
    fn operator_symbols() {
        assert_eq!(BinaryOp::Gte.symbol(), ">=");
        assert_eq!(BinaryOp::Rem.to_string(), "%");
        assert_eq!(UnaryOp::Not.symbol(), "!");
    }
}
