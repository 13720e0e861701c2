//! kitesat: a conflict-driven clause learning SAT solver for DIMACS CNF.

pub mod dimacs;
pub mod solver;
