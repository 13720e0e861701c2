use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::info;

use kitesat::dimacs::parser::DimacsParser;
use kitesat::solver::{cdcl_solver::CdclSolver, config::SolverConfig, types::SolveStatus};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// File path of the DIMACS CNF instance to solve
    pub path: String,

    /// Seed for the solver's pseudorandom stream
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let formula = DimacsParser::from_path(&args.path)?.parse()?;
    info!(
        "parsed {} vars, {} clauses from {}",
        formula.num_vars,
        formula.clauses.len(),
        args.path
    );

    let conf = SolverConfig {
        seed: args.seed,
        ..SolverConfig::default()
    };
    let mut solver = CdclSolver::new(conf, &formula);
    let start = Instant::now();
    let res = solver.solve();
    info!("finished in {:?}: {:?}", start.elapsed(), solver.stats());

    match res {
        SolveStatus::Sat => {
            println!("s SATISFIABLE");
            let mut line = String::from("v");
            for lit in solver.model() {
                line.push(' ');
                line.push_str(&lit.to_string());
            }
            line.push_str(" 0");
            println!("{line}");
        }
        SolveStatus::Unsat => println!("s UNSATISFIABLE"),
        SolveStatus::Unknown => unreachable!("solve always decides"),
    }
    Ok(())
}
