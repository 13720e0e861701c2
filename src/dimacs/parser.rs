use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::debug;

use super::cnf::CnfFormula;

/// DIMACS CNF reader. Token-based: clauses are `0`-terminated runs of
/// nonzero signed integers and may span lines; `c` lines are comments; a
/// single `p cnf <vars> <clauses>` header must precede the first clause.
pub struct DimacsParser<R> {
    reader: R,
}

impl DimacsParser<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("cannot open {}", path.as_ref().display()))?;
        Ok(Self {
            reader: BufReader::new(file),
        })
    }
}

impl<R: BufRead> DimacsParser<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    // Parses the input provided during construction into a CNF formula.
    pub fn parse(self) -> Result<CnfFormula> {
        let mut header: Option<(usize, usize)> = None;
        let mut clauses: Vec<Vec<i64>> = Vec::new();
        let mut buffer: Vec<i64> = Vec::new();

        for line in self.reader.lines() {
            let line = line.context("read error in DIMACS input")?;
            let line = line.trim();
            // Skip blanks and comments
            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            if line.starts_with('p') {
                if header.is_some() {
                    bail!("duplicate problem line: {line}");
                }
                let tokens: Vec<&str> = line.split_whitespace().collect();
                if tokens.len() != 4 || tokens[0] != "p" || tokens[1] != "cnf" {
                    bail!("malformed problem line: {line}");
                }
                let num_vars = tokens[2]
                    .parse::<usize>()
                    .with_context(|| format!("bad variable count in problem line: {line}"))?;
                let num_clauses = tokens[3]
                    .parse::<usize>()
                    .with_context(|| format!("bad clause count in problem line: {line}"))?;
                clauses.reserve(num_clauses);
                header = Some((num_vars, num_clauses));
                continue;
            }

            let Some((num_vars, _)) = header else {
                bail!("clause before the problem line");
            };
            for token in line.split_whitespace() {
                let lit = token
                    .parse::<i64>()
                    .with_context(|| format!("bad literal: {token}"))?;
                if lit == 0 {
                    clauses.push(mem::take(&mut buffer));
                } else {
                    if lit.unsigned_abs() as usize > num_vars {
                        bail!("literal {lit} out of range for {num_vars} variables");
                    }
                    buffer.push(lit);
                }
            }
        }

        let Some((num_vars, num_clauses)) = header else {
            bail!("missing problem line");
        };
        if !buffer.is_empty() {
            bail!("unexpected end of file inside a clause");
        }

        let formula = CnfFormula {
            num_vars,
            num_clauses,
            clauses,
        };
        debug!("{:#?}", &formula);
        Ok(formula)
    }
}
