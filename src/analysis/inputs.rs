//! Input vector `U`.
//!
//! Inputs are plain symbols, kept in the order given. A name does not have
//! to match a source value in the netlist; unused inputs simply get zero
//! columns in B and D.

use crate::error::{Result, SymnaError};
use crate::parser::symbol_name;

pub fn build<I: AsRef<str>>(names: &[I]) -> Result<Vec<String>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref().trim();
            match symbol_name(name) {
                Ok(("", _)) => Ok(name.to_string()),
                _ => Err(SymnaError::Parse(format!(
                    "input '{}' is not a symbol name",
                    name
                ))),
            }
        })
        .collect()
}
