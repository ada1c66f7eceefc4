//! Result formatting.

use std::fmt::Display;
use std::io::Write;

use crate::analysis::StateSpace;
use crate::error::Result;
use crate::symbolic::{Matrix, RationalFunction, Scalar};

/// Write a state-space model as text.
///
/// Format:
/// ```text
/// States:  x_C1
/// Inputs:  VIN
/// Outputs: IdC1, VdC1
///
/// A (1x1) =
///   [ -1/(C1*R1) ]
/// ```
pub fn write_state_space<W: Write, S: Scalar>(model: &StateSpace<S>, writer: &mut W) -> Result<()> {
    writeln!(writer, "States:  {}", list(&model.states))?;
    writeln!(writer, "Inputs:  {}", list(&model.inputs))?;
    writeln!(writer, "Outputs: {}", list(&model.outputs))?;
    for (name, matrix) in [
        ("A", &model.a),
        ("B", &model.b),
        ("C", &model.c),
        ("D", &model.d),
        ("DC_OP", &model.dc_op),
    ] {
        writeln!(writer)?;
        write_matrix(name, matrix, writer)?;
    }
    Ok(())
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

/// Columns are padded to their widest entry.
fn write_matrix<W: Write, S: Scalar>(name: &str, m: &Matrix<S>, writer: &mut W) -> Result<()> {
    if m.nrows() == 0 || m.ncols() == 0 {
        writeln!(writer, "{} ({}x{}) = []", name, m.nrows(), m.ncols())?;
        return Ok(());
    }
    let cells: Vec<Vec<String>> = (0..m.nrows())
        .map(|r| m.row(r).iter().map(|v| v.to_string()).collect())
        .collect();
    let widths: Vec<usize> = (0..m.ncols())
        .map(|c| cells.iter().map(|row| row[c].chars().count()).max().unwrap_or(0))
        .collect();

    writeln!(writer, "{} ({}x{}) =", name, m.nrows(), m.ncols())?;
    for row in &cells {
        let padded: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
            .collect();
        writeln!(writer, "  [ {} ]", padded.join("  "))?;
    }
    Ok(())
}

/// Write a single-input single-output transfer function as a centred fraction.
///
/// ```text
/// Transfer function of rc.cir
/// Input variable:  VIN
/// Output variable: VdC1
///
///            1
/// H(s) = ---------
///        C*R*s + 1
/// ```
pub fn write_transfer_function<W: Write>(
    h: &RationalFunction,
    source: &str,
    input: &str,
    output: &str,
    variable: &str,
    writer: &mut W,
) -> Result<()> {
    writeln!(writer, "Transfer function of {}", source)?;
    writeln!(writer, "Input variable:  {}", input)?;
    writeln!(writer, "Output variable: {}", output)?;
    writeln!(writer)?;

    let lhs = format!("H({}) = ", variable);
    let indent = " ".repeat(lhs.chars().count());
    if h.denominator().is_one() {
        writeln!(writer, "{}{}", lhs, h.numerator())?;
        return Ok(());
    }
    let num = h.numerator().to_string();
    let den = h.denominator().to_string();
    let width = num.chars().count().max(den.chars().count());
    writeln!(writer, "{}{}", indent, centred(&num, width))?;
    writeln!(writer, "{}{}", lhs, "-".repeat(width))?;
    writeln!(writer, "{}{}", indent, centred(&den, width))?;
    Ok(())
}

fn centred(text: impl Display, width: usize) -> String {
    let text = text.to_string();
    let pad = width.saturating_sub(text.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), text).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::convert;

    #[test]
    fn test_state_space_text() {
        let model = convert("V1 in 0 VIN\nR1 in out R1\nC1 out 0 C1\n", &["VIN"], &["IdC1", "VdC1"]).unwrap();
        let mut buf = Vec::new();
        write_state_space(&model, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("States:  x_C1"));
        assert!(text.contains("A (1x1) =\n  [ -1/(C1*R1) ]"));
        assert!(text.contains("DC_OP (2x1) =\n  [ 0   ]\n  [ VIN ]"));
    }

    #[test]
    fn test_empty_matrix() {
        let model = convert("I1 0 a I1\nR1 a 0 R1\n", &["I1"], &["VdR1"]).unwrap();
        let mut buf = Vec::new();
        write_state_space(&model, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("States:  (none)"));
        assert!(text.contains("A (0x0) = []"));
        assert!(text.contains("B (0x1) = []"));
    }

    #[test]
    fn test_transfer_function_fraction() {
        let h = RationalFunction::one()
            .div(&RationalFunction::symbol("a").add(&RationalFunction::one()))
            .unwrap();
        let mut buf = Vec::new();
        write_transfer_function(&h, "net.cir", "u", "VdC1", "s", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Transfer function of net.cir");
        assert_eq!(lines[4], "         1");
        assert_eq!(lines[5], "H(s) = -----");
        assert_eq!(lines[6], "       a + 1");
    }
}
