//! Netlist parser.
//!
//! Parses a flat SPICE-like netlist into the circuit IR.
//!
//! # Supported syntax
//!
//! ```text
//! * comment line
//! Rname n+ n- value          (resistor)            ; trailing comment
//! Cname n+ n- value          (capacitor)
//! Lname n+ n- value          (inductor)
//! Vname n+ n- value          (independent voltage source)
//! Iname n+ n- value          (independent current source)
//! Ename n+ n- nc+ nc- gain   (VCVS)
//! Gname n+ n- nc+ nc- gm     (VCCS)
//! Fname n+ n- nc+ nc- gain   (CCCS, control current flows nc+ -> nc-)
//! Hname n+ n- nc+ nc- rm     (CCVS)
//! Tname p+ p- s+ s- ratio    (ideal transformer)
//! .END
//! ```
//!
//! Values are algebraic expressions over symbols and literals, e.g. `R1`,
//! `1/(2*gm)`, `4.7k*alpha`, `1e-3 + Rs`. Literals support scientific
//! notation and the engineering suffixes T, G, MEG, K, M, U, N, P, F
//! (case-insensitive) and are kept as exact rationals.

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while1};
use nom::character::complete::{one_of, space0, space1};
use nom::combinator::{map, opt, verify};
use nom::error::{Error as NomError, ErrorKind};
use nom::multi::count;
use nom::number::complete::recognize_float;
use nom::sequence::{delimited, preceded};
use nom::IResult;
use nom::Parser;

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::error::{Result, SymnaError};
use crate::ir::{BinaryOp, Circuit, Component, DeviceKind, ValueExpr};

/// Parse a netlist string into a Circuit IR.
pub fn parse(input: &str) -> Result<Circuit> {
    let mut circuit = Circuit::default();

    for (line_num, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();

        // Skip blank lines and comments
        if line.is_empty() || line.starts_with('*') {
            continue;
        }

        if line.eq_ignore_ascii_case(".END") {
            break;
        }
        if line.starts_with('.') {
            return Err(parse_err(line_num, raw_line, "unsupported dot command"));
        }

        let component =
            parse_device_line(line, line_num + 1).map_err(|e| parse_err(line_num, raw_line, &e))?;
        if circuit.contains(&component.name) {
            let detail = format!("duplicated device name '{}'", component.name);
            return Err(parse_err(line_num, raw_line, &detail));
        }
        tracing::trace!(device = %component.name, value = %component.value, "parsed device");
        circuit.push(component);
    }

    Ok(circuit)
}

fn parse_err(line_num: usize, raw_line: &str, detail: &str) -> SymnaError {
    SymnaError::Parse(format!("line {}: {} in: {}", line_num + 1, detail, raw_line))
}

// ---------------------------------------------------------------------------
// Device lines
// ---------------------------------------------------------------------------

fn parse_device_line(line: &str, line_no: usize) -> std::result::Result<Component, String> {
    let body = match line.split_once(';') {
        Some((body, _comment)) => body,
        None => line,
    };

    let (rest, name) = element_name(body).map_err(|_| "expected a device name".to_string())?;
    let kind = name
        .chars()
        .next()
        .and_then(DeviceKind::from_prefix)
        .ok_or_else(|| format!("unknown element '{}'", name))?;

    let n = kind.terminal_count();
    let (rest, nodes) = count(preceded(space1, node_id), n)
        .parse(rest)
        .map_err(|_: nom::Err<NomError<&str>>| format!("expected {} node names after {}", n, name))?;
    let (value_text, _) =
        space1::<&str, NomError<&str>>(rest).map_err(|_| format!("missing value for {}", name))?;
    let value = parse_value(value_text)?;

    Ok(Component {
        name: name.to_string(),
        kind,
        nodes: nodes.into_iter().map(str::to_string).collect(),
        value,
        line: line_no,
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn element_name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char)(input)
}

fn node_id(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char)(input)
}

// ---------------------------------------------------------------------------
// Value expressions
// ---------------------------------------------------------------------------

/// Parse a complete value expression. Anything left over is an error.
pub fn parse_value(text: &str) -> std::result::Result<ValueExpr, String> {
    match expression(text) {
        Ok((rest, expr)) if rest.trim().is_empty() => Ok(expr),
        Ok((rest, _)) => Err(format!("unexpected '{}' in value expression", rest.trim())),
        Err(_) => Err(format!("unable to parse value expression '{}'", text.trim())),
    }
}

/// `term (('+' | '-') term)*`
fn expression(input: &str) -> IResult<&str, ValueExpr> {
    let (mut input, mut acc) = term(input)?;
    loop {
        let (rest, op) = opt(preceded(space0, one_of("+-"))).parse(input)?;
        let Some(op) = op else {
            return Ok((input, acc));
        };
        let (rest, rhs) = term(rest)?;
        let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
        acc = ValueExpr::binary(op, acc, rhs);
        input = rest;
    }
}

/// `factor (('*' | '/') factor)*`
fn term(input: &str) -> IResult<&str, ValueExpr> {
    let (mut input, mut acc) = factor(input)?;
    loop {
        let (rest, op) = opt(preceded(space0, one_of("*/"))).parse(input)?;
        let Some(op) = op else {
            return Ok((input, acc));
        };
        let (rest, rhs) = factor(rest)?;
        let op = if op == '*' { BinaryOp::Mul } else { BinaryOp::Div };
        acc = ValueExpr::binary(op, acc, rhs);
        input = rest;
    }
}

fn factor(input: &str) -> IResult<&str, ValueExpr> {
    let (input, _) = space0(input)?;
    alt((
        map(preceded(tag("-"), factor), |e| ValueExpr::Neg(Box::new(e))),
        preceded(tag("+"), factor),
        delimited(tag("("), expression, preceded(space0, tag(")"))),
        literal,
        map(symbol_name, |s: &str| ValueExpr::Symbol(s.to_string())),
    ))
    .parse(input)
}

/// Identifiers: a letter or underscore, then letters, digits, underscores.
pub fn symbol_name(input: &str) -> IResult<&str, &str> {
    verify(take_while1(is_name_char), |s: &str| {
        !s.starts_with(|c: char| c.is_ascii_digit())
    })
    .parse(input)
}

/// Numeric literal with optional engineering suffix, e.g. `4.7k`, `1e-3`, `2MEG`.
fn literal(input: &str) -> IResult<&str, ValueExpr> {
    let (rest, digits) = recognize_float::<&str, NomError<&str>>(input)?;
    let (rest, multiplier) = opt(eng_suffix).parse(rest)?;

    // "10kohm" or "2R1" are not values
    if rest.starts_with(is_name_char) {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify)));
    }
    let value = decimal_to_rational(digits)
        .ok_or_else(|| nom::Err::Error(NomError::new(input, ErrorKind::Float)))?;
    let value = match multiplier {
        Some(m) => value * m,
        None => value,
    };
    Ok((rest, ValueExpr::Number(value)))
}

/// Match an engineering suffix and return its multiplier.
fn eng_suffix(input: &str) -> IResult<&str, BigRational> {
    // Order matters: MEG must come before M
    alt((
        map(tag_no_case("MEG"), |_: &str| pow10(6)),
        map(tag_no_case("T"), |_: &str| pow10(12)),
        map(tag_no_case("G"), |_: &str| pow10(9)),
        map(tag_no_case("K"), |_: &str| pow10(3)),
        map(tag_no_case("M"), |_: &str| pow10(-3)),
        map(tag_no_case("U"), |_: &str| pow10(-6)),
        map(tag_no_case("N"), |_: &str| pow10(-9)),
        map(tag_no_case("P"), |_: &str| pow10(-12)),
        map(tag_no_case("F"), |_: &str| pow10(-15)),
    ))
    .parse(input)
}

fn pow10(exp: i32) -> BigRational {
    let magnitude = num_traits::pow(BigInt::from(10), exp.unsigned_abs() as usize);
    let value = BigRational::from_integer(magnitude);
    if exp < 0 {
        value.recip()
    } else {
        value
    }
}

/// Largest decimal exponent a literal may carry, after folding in the
/// fractional digits.
const MAX_EXPONENT: i32 = 1000;

/// Exact value of a decimal literal such as `-4.75e-3`. `None` if the
/// exponent is out of range.
fn decimal_to_rational(text: &str) -> Option<BigRational> {
    let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => (&text[..pos], text[pos + 1..].parse::<i32>().ok()?),
        None => (text, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let shift = exponent.checked_sub(i32::try_from(frac_part.len()).ok()?)?;
    if !(-MAX_EXPONENT..=MAX_EXPONENT).contains(&shift) {
        return None;
    }
    let digits: BigInt = format!("{}{}", int_part, frac_part).parse().ok()?;
    Some(BigRational::from_integer(digits) * pow10(shift))
}
