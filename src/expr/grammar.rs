use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, separated, terminated};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::Value;

const RESERVED: [&str; 6] = ["true", "false", "null", "and", "or", "not"];

// -- Whitespace -------------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

// -- Identifiers & keywords -------------------------------------------------

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

/// A word-form keyword that is not the prefix of a longer identifier.
fn keyword<'i>(word: &'static str) -> impl Parser<&'i str, &'i str, ErrMode<ContextError>> {
    terminated(word, not(take_while(1, is_ident_char)))
}

fn variable(input: &mut &str) -> ModalResult<Expr> {
    let marked = opt('#').parse_next(input)?.is_some();
    let name = if marked {
        cut_err(ident)
            .context(StrContext::Expected(StrContextValue::Description(
                "variable name",
            )))
            .parse_next(input)?
    } else {
        ident
            .verify(|name: &str| !RESERVED.contains(&name))
            .parse_next(input)?
    };
    Ok(Expr::Variable(name.to_owned()))
}

// -- Literals ---------------------------------------------------------------

/// `'...'` with `''` for a literal quote.
fn single_quoted(input: &mut &str) -> ModalResult<String> {
    '\''.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(StrContext::Expected(StrContextValue::CharLiteral('\'')))
            .parse_next(input)?;
        match ch {
            '\'' => {
                if opt('\'').parse_next(input)?.is_some() {
                    s.push('\'');
                } else {
                    return Ok(s);
                }
            }
            c => s.push(c),
        }
    }
}

/// `"..."` with backslash escapes.
fn double_quoted(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(StrContext::Expected(StrContextValue::CharLiteral('"')))
            .parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = cut_err(any).parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn float_literal(input: &mut &str) -> ModalResult<f64> {
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

fn int_literal(input: &mut &str) -> ModalResult<i64> {
    take_while(1.., |c: char| c.is_ascii_digit())
        .try_map(|s: &str| s.parse::<i64>())
        .parse_next(input)
}

fn literal(input: &mut &str) -> ModalResult<Value> {
    alt((
        single_quoted.map(Value::String),
        double_quoted.map(Value::String),
        float_literal.map(Value::Float),
        int_literal.map(Value::Int),
        keyword("true").value(Value::Bool(true)),
        keyword("false").value(Value::Bool(false)),
        keyword("null").value(Value::Null),
    ))
    .parse_next(input)
}

fn list_literal(input: &mut &str) -> ModalResult<Expr> {
    delimited(
        '{',
        separated(0.., expr, (ws, ',')),
        (ws, cut_err('}')),
    )
    .map(Expr::List)
    .parse_next(input)
}

// -- Primary & postfix ------------------------------------------------------

fn primary(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    alt((
        delimited('(', expr, (ws, cut_err(')'))),
        list_literal,
        literal.map(Expr::Literal),
        variable,
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

enum Postfix {
    Field(String),
    Method(String, Vec<Expr>),
    Index(Expr),
}

fn call_args(input: &mut &str) -> ModalResult<Vec<Expr>> {
    ws.parse_next(input)?;
    delimited('(', separated(0.., expr, (ws, ',')), (ws, cut_err(')'))).parse_next(input)
}

fn member(input: &mut &str) -> ModalResult<Postfix> {
    '.'.parse_next(input)?;
    let name = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "property or method name",
        )))
        .parse_next(input)?;
    let args = opt(call_args).parse_next(input)?;
    Ok(match args {
        Some(args) => Postfix::Method(name.to_owned(), args),
        None => Postfix::Field(name.to_owned()),
    })
}

fn index(input: &mut &str) -> ModalResult<Postfix> {
    delimited('[', cut_err(expr), (ws, cut_err(']')))
        .map(Postfix::Index)
        .parse_next(input)
}

fn postfix_op(input: &mut &str) -> ModalResult<Postfix> {
    ws.parse_next(input)?;
    alt((member, index)).parse_next(input)
}

fn postfix(input: &mut &str) -> ModalResult<Expr> {
    let target = primary(input)?;
    let ops: Vec<Postfix> = repeat(0.., postfix_op).parse_next(input)?;
    Ok(ops.into_iter().fold(target, |target, op| {
        let target = Box::new(target);
        match op {
            Postfix::Field(name) => Expr::Field { target, name },
            Postfix::Method(name, args) => Expr::Method { target, name, args },
            Postfix::Index(index) => Expr::Index {
                target,
                index: Box::new(index),
            },
        }
    }))
}

// -- Operators (precedence: ternary < or < and < equality < relational
//    < additive < multiplicative < unary < postfix) --------------------------

fn unary(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    let op = opt(alt((
        '!'.value(UnaryOp::Not),
        keyword("not").value(UnaryOp::Not),
        '-'.value(UnaryOp::Neg),
    )))
    .parse_next(input)?;
    match op {
        Some(op) => {
            let operand = cut_err(unary).parse_next(input)?;
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            })
        }
        None => postfix(input),
    }
}

fn fold_binary(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |left, (op, right)| Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn multiplicative(input: &mut &str) -> ModalResult<Expr> {
    let first = unary(input)?;
    let rest: Vec<(BinaryOp, Expr)> = repeat(
        0..,
        (
            preceded(
                ws,
                alt((
                    '*'.value(BinaryOp::Mul),
                    '/'.value(BinaryOp::Div),
                    '%'.value(BinaryOp::Rem),
                )),
            ),
            cut_err(unary),
        ),
    )
    .parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn additive(input: &mut &str) -> ModalResult<Expr> {
    let first = multiplicative(input)?;
    let rest: Vec<(BinaryOp, Expr)> = repeat(
        0..,
        (
            preceded(
                ws,
                alt(('+'.value(BinaryOp::Add), '-'.value(BinaryOp::Sub))),
            ),
            cut_err(multiplicative),
        ),
    )
    .parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn relational_op(input: &mut &str) -> ModalResult<BinaryOp> {
    ws.parse_next(input)?;
    alt((
        ">=".value(BinaryOp::Gte),
        ">".value(BinaryOp::Gt),
        "<=".value(BinaryOp::Lte),
        "<".value(BinaryOp::Lt),
    ))
    .parse_next(input)
}

/// Relational operators do not chain: `a < b < c` is a parse error.
fn relational(input: &mut &str) -> ModalResult<Expr> {
    let left = additive(input)?;
    let rest = opt((relational_op, cut_err(additive))).parse_next(input)?;
    Ok(match rest {
        Some((op, right)) => Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        None => left,
    })
}

fn equality(input: &mut &str) -> ModalResult<Expr> {
    let first = relational(input)?;
    let rest: Vec<(BinaryOp, Expr)> = repeat(
        0..,
        (
            preceded(
                ws,
                alt(("==".value(BinaryOp::Eq), "!=".value(BinaryOp::Neq))),
            ),
            cut_err(relational),
        ),
    )
    .parse_next(input)?;
    Ok(fold_binary(first, rest))
}

fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = equality(input)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded((ws, alt((keyword("and"), "&&"))), cut_err(equality)),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::And(Box::new(acc), Box::new(r))))
}

fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = and_expr(input)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded((ws, alt((keyword("or"), "||"))), cut_err(and_expr)),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::Or(Box::new(acc), Box::new(r))))
}

fn ternary(input: &mut &str) -> ModalResult<Expr> {
    let condition = or_expr(input)?;
    let branches = opt(preceded(
        (ws, '?'),
        cut_err((expr, preceded((ws, ':'), expr))),
    ))
    .parse_next(input)?;
    Ok(match branches {
        Some((then, otherwise)) => Expr::Ternary {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        },
        None => condition,
    })
}

fn expr(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    ternary(input)
}

// -- Top-level parser -------------------------------------------------------

pub(crate) fn expression(input: &mut &str) -> ModalResult<Expr> {
    let parsed = expr(input)?;
    ws.parse_next(input)?;
    Ok(parsed)
}
