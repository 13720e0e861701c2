use super::types::Lbd;

// Restart policy defaults (glucose-style fast/slow LBD averages).
pub const LBD_WINDOW_DEFAULT: usize = 50;
pub const RESTART_FACTOR_DEFAULT: f64 = 0.8;

// VSIDS defaults.
pub const VAR_DECAY_DEFAULT: f64 = 0.8;
pub const RESCALE_LIMIT_DEFAULT: f64 = 1e100;
pub const RESCALE_FACTOR_DEFAULT: f64 = 1e-100;

// Clause database reduction defaults.
pub const REDUCE_LIMIT_DEFAULT: u64 = 8192;
pub const REDUCE_LIMIT_STEP_DEFAULT: u64 = 512;
pub const REDUCE_LBD_FLOOR_DEFAULT: Lbd = 5;

// Rephase schedule defaults.
pub const REPHASE_LIMIT_DEFAULT: u64 = 1024;
pub const REPHASE_LIMIT_STEP_DEFAULT: u64 = 8192;
pub const THRESHOLD_DECAY_DEFAULT: f64 = 0.9;

// Percentages for the probabilistic phase reset on restart; the remainder
// leaves saved phases untouched.
pub const PHASE_BEST_PCT: u32 = 60;
pub const PHASE_INVERT_PCT: u32 = 5;
pub const PHASE_RANDOM_PCT: u32 = 20;

#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Seed for the solver's pseudorandom stream (restart rephasing and
    /// reduction coin flips). Fixed seed means reproducible runs.
    pub seed: u64,

    /// Size of the recent-LBD window; restarts are suppressed until it fills.
    pub lbd_window: usize,
    /// Restart when factor * fast average > slow average.
    pub restart_factor: f64,

    /// var_inc grows by 1/var_decay after every conflict.
    pub var_decay: f64,
    /// Activity ceiling before all scores and var_inc are rescaled.
    pub rescale_limit: f64,
    pub rescale_factor: f64,

    /// Conflicts between reduction passes, and its per-pass increase.
    pub reduce_limit: u64,
    pub reduce_limit_step: u64,
    /// Learnt clauses at or above this LBD are deletion candidates.
    pub reduce_lbd_floor: Lbd,

    /// Conflicts between rephase events, and its per-event increase.
    pub rephase_limit: u64,
    pub rephase_limit_step: u64,
    /// Local-best threshold shrink applied by each rephase event.
    pub threshold_decay: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            lbd_window: LBD_WINDOW_DEFAULT,
            restart_factor: RESTART_FACTOR_DEFAULT,
            var_decay: VAR_DECAY_DEFAULT,
            rescale_limit: RESCALE_LIMIT_DEFAULT,
            rescale_factor: RESCALE_FACTOR_DEFAULT,
            reduce_limit: REDUCE_LIMIT_DEFAULT,
            reduce_limit_step: REDUCE_LIMIT_STEP_DEFAULT,
            reduce_lbd_floor: REDUCE_LBD_FLOOR_DEFAULT,
            rephase_limit: REPHASE_LIMIT_DEFAULT,
            rephase_limit_step: REPHASE_LIMIT_STEP_DEFAULT,
            threshold_decay: THRESHOLD_DECAY_DEFAULT,
        }
    }
}
