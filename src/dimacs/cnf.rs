use std::fmt::Debug;

use anyhow::Result;

use super::parser::DimacsParser;

/// A parsed CNF formula: the header counts plus the raw signed clauses.
#[derive(Clone)]
pub struct CnfFormula {
    pub num_vars: usize,
    /// Clause count announced by the header; the clauses vector is the
    /// authoritative one.
    pub num_clauses: usize,
    pub clauses: Vec<Vec<i64>>,
}

impl CnfFormula {
    /// Parses a DIMACS CNF string (tests and embedding).
    pub fn from_str(input: &str) -> Result<Self> {
        DimacsParser::new(input.as_bytes()).parse()
    }
}

impl Debug for CnfFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "num_vars: {}\tnum_clauses: {}",
            self.num_vars, self.num_clauses
        )?;
        for c in &self.clauses {
            write!(f, "Clause:")?;
            for l in c {
                write!(f, " {l}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
