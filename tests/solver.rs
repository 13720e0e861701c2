//! End-to-end tests: literal DIMACS scenarios, model checks against the
//! original clauses, and cross-checks against an exhaustive oracle on small
//! instances.

use fxhash::FxHashSet;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use kitesat::dimacs::cnf::CnfFormula;
use kitesat::solver::cdcl_solver::CdclSolver;
use kitesat::solver::config::SolverConfig;
use kitesat::solver::types::SolveStatus;

fn solve_with_seed(input: &str, seed: u64) -> (SolveStatus, Vec<i64>) {
    let formula = CnfFormula::from_str(input).expect("test input parses");
    let conf = SolverConfig {
        seed,
        ..SolverConfig::default()
    };
    let mut solver = CdclSolver::new(conf, &formula);
    let status = solver.solve();
    let model = match status {
        SolveStatus::Sat => solver.model(),
        _ => Vec::new(),
    };
    (status, model)
}

fn solve(input: &str) -> (SolveStatus, Vec<i64>) {
    solve_with_seed(input, 0)
}

/// Every original clause must contain a literal the model sets true.
fn satisfies(formula: &CnfFormula, model: &[i64]) -> bool {
    let assignment: FxHashSet<i64> = model.iter().copied().collect();
    formula
        .clauses
        .iter()
        .all(|clause| clause.iter().any(|lit| assignment.contains(lit)))
}

/// Exhaustive truth-table check, usable as an independent oracle for small
/// instances.
fn brute_force_sat(formula: &CnfFormula) -> bool {
    let n = formula.num_vars;
    assert!(n <= 20, "oracle is exponential in the variable count");
    'candidate: for bits in 0u32..(1 << n) {
        for clause in &formula.clauses {
            let clause_sat = clause.iter().any(|&lit| {
                let on = bits >> (lit.unsigned_abs() - 1) & 1 == 1;
                if lit > 0 {
                    on
                } else {
                    !on
                }
            });
            if !clause_sat {
                continue 'candidate;
            }
        }
        return true;
    }
    false
}

/// Random 3-SAT instance over n_vars with n_clauses, three distinct
/// variables per clause.
fn random_3sat(n_vars: usize, n_clauses: usize, rng: &mut SmallRng) -> String {
    let mut out = format!("p cnf {n_vars} {n_clauses}\n");
    for _ in 0..n_clauses {
        let mut vars: Vec<usize> = Vec::with_capacity(3);
        while vars.len() < 3 {
            let v = rng.gen_range(1..=n_vars);
            if !vars.contains(&v) {
                vars.push(v);
            }
        }
        for v in vars {
            let lit = if rng.gen_bool(0.5) {
                v as i64
            } else {
                -(v as i64)
            };
            out.push_str(&lit.to_string());
            out.push(' ');
        }
        out.push_str("0\n");
    }
    out
}

#[test]
fn single_unit_clause_is_sat() {
    let (status, model) = solve("p cnf 1 1\n1 0\n");
    assert_eq!(status, SolveStatus::Sat);
    assert_eq!(model, vec![1]);
}

#[test]
fn conflicting_units_are_unsat_at_load() {
    let (status, _) = solve("p cnf 1 2\n1 0\n-1 0\n");
    assert_eq!(status, SolveStatus::Unsat);
}

#[test]
fn empty_clause_is_unsat_at_load() {
    let (status, _) = solve("p cnf 2 1\n0\n");
    assert_eq!(status, SolveStatus::Unsat);
}

#[test]
fn level_zero_bcp_conflict_is_unsat_at_load() {
    // 1 forces 2 through the second clause, falsifying the third.
    let (status, _) = solve("p cnf 2 3\n1 0\n-1 2 0\n-2 -1 0\n");
    assert_eq!(status, SolveStatus::Unsat);
}

#[test]
fn implication_chain_is_sat() {
    let input = "p cnf 3 3\n1 2 0\n-1 2 0\n-2 3 0\n";
    let formula = CnfFormula::from_str(input).unwrap();
    let (status, model) = solve(input);
    assert_eq!(status, SolveStatus::Sat);
    assert_eq!(model.len(), 3);
    assert!(satisfies(&formula, &model));
}

#[test]
fn all_sign_combinations_over_two_vars_are_unsat() {
    let (status, _) = solve("p cnf 2 4\n1 2 0\n1 -2 0\n-1 2 0\n-1 -2 0\n");
    assert_eq!(status, SolveStatus::Unsat);
}

#[test]
fn pigeonhole_three_pigeons_two_holes_is_unsat() {
    // p_{i,h} = (i-1)*2 + h: every pigeon gets a hole, no hole gets two.
    let input = "p cnf 6 9\n\
                 1 2 0\n3 4 0\n5 6 0\n\
                 -1 -3 0\n-1 -5 0\n-3 -5 0\n\
                 -2 -4 0\n-2 -6 0\n-4 -6 0\n";
    let (status, _) = solve(input);
    assert_eq!(status, SolveStatus::Unsat);
}

#[test]
fn clauses_spanning_lines_solve_normally() {
    let input = "p cnf 3 2\n1\n2 0 -2\n3 0\n";
    let formula = CnfFormula::from_str(input).unwrap();
    let (status, model) = solve(input);
    assert_eq!(status, SolveStatus::Sat);
    assert!(satisfies(&formula, &model));
}

#[test]
fn agrees_with_exhaustive_oracle_on_small_instances() {
    let mut rng = SmallRng::seed_from_u64(0xC0FFEE);
    let mut sat_seen = 0;
    let mut unsat_seen = 0;
    for round in 0..40 {
        let input = random_3sat(12, 50, &mut rng);
        let formula = CnfFormula::from_str(&input).unwrap();
        let expected = brute_force_sat(&formula);
        let (status, model) = solve_with_seed(&input, round);
        match status {
            SolveStatus::Sat => {
                assert!(expected, "solver claimed SAT on an unsat instance:\n{input}");
                assert!(satisfies(&formula, &model), "bad model for:\n{input}");
                sat_seen += 1;
            }
            SolveStatus::Unsat => {
                assert!(!expected, "solver claimed UNSAT on a sat instance:\n{input}");
                unsat_seen += 1;
            }
            SolveStatus::Unknown => panic!("solve returned Unknown"),
        }
    }
    // The 50/12 ratio sits well past the phase transition boundary, so both
    // outcomes should show up across 40 rounds.
    assert!(sat_seen > 0 && unsat_seen > 0);
}

#[test]
fn hundred_variable_instance_terminates_with_a_checked_model() {
    let mut rng = SmallRng::seed_from_u64(7);
    let input = random_3sat(100, 400, &mut rng);
    let formula = CnfFormula::from_str(&input).unwrap();
    let (status, model) = solve(&input);
    match status {
        SolveStatus::Sat => assert!(satisfies(&formula, &model)),
        SolveStatus::Unsat => (),
        SolveStatus::Unknown => panic!("solve returned Unknown"),
    }
}

#[test]
fn fixed_seed_runs_are_identical() {
    let mut rng = SmallRng::seed_from_u64(99);
    let input = random_3sat(60, 250, &mut rng);
    let first = solve_with_seed(&input, 42);
    let second = solve_with_seed(&input, 42);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
}

#[test]
fn model_covers_unconstrained_variables() {
    // Variable 3 appears in no clause but still gets a polarity.
    let (status, model) = solve("p cnf 3 1\n1 2 0\n");
    assert_eq!(status, SolveStatus::Sat);
    assert_eq!(model.len(), 3);
    assert!(model[2] == 3 || model[2] == -3);
}
