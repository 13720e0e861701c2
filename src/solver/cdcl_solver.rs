use std::mem;

use fxhash::FxHashSet;
use log::{debug, info};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use ringbuf::{
    ring_buffer::RbBase,
    HeapRb, Rb,
};

use crate::dimacs::cnf::CnfFormula;

use super::{
    clause::{ClauseDb, ClauseId},
    config::{SolverConfig, PHASE_BEST_PCT, PHASE_INVERT_PCT, PHASE_RANDOM_PCT},
    heap::ActivityHeap,
    stats::RuntimeStats,
    trail::Trail,
    types::{lits_from_vars, DecisionLevel, LBool, Lbd, Lit, SolveStatus, Var},
    watch_list::{WatchList, Watcher},
};

pub struct CdclSolver {
    /// Problem information: clause database and watcher index.
    db: ClauseDb,
    watches: WatchList,

    /// Search state: assignment trail with level boundaries, and the
    /// activity-ordered decision heap.
    trail: Trail,
    heap: ActivityHeap,

    /// Variable metadata, kept in separate vectors to keep accesses cheap
    /// when only a subset is needed.
    ///
    /// Var -> current assignment.
    values: Vec<LBool>,
    /// Var -> decision level of the current assignment (0 if unassigned).
    levels: Vec<DecisionLevel>,
    /// Var -> antecedent clause; None for decisions and unassigned vars.
    reasons: Vec<Option<ClauseId>>,
    /// Var -> last assigned polarity (phase saving), 0 before any.
    saved: Vec<i8>,
    /// Var -> polarity snapshot taken at the deepest trail seen so far.
    local_best: Vec<i8>,
    /// Time-stamp marks for conflict analysis. Slots double as decision
    /// level marks during LBD counting, hence the +1 length.
    mark: Vec<u64>,
    time_stamp: u64,

    /// VSIDS bump amount; grows by 1/var_decay per conflict.
    var_inc: f64,
    /// The learnt clause under construction; slot 0 is the asserting literal.
    learnt: Vec<Lit>,
    /// Scratch copy of the clause being resolved (keeps the borrow checker
    /// out of the resolution loop).
    reason_lits: Vec<Lit>,

    /// Recent-LBD window and running sums for the glucose restart test.
    lbd_window: HeapRb<Lbd>,
    fast_lbd_sum: f64,
    slow_lbd_sum: f64,

    /// Trail length to beat before local-best phases are snapshotted.
    threshold: f64,

    // Conflicts since the corresponding event, and the firing limits.
    restarts: u64,
    reduces: u64,
    rephases: u64,
    reduce_limit: u64,
    rephase_limit: u64,

    rng: SmallRng,
    conf: SolverConfig,
    stats: RuntimeStats,
    status: SolveStatus,
    n_vars: usize,
}

impl CdclSolver {
    pub fn new(conf: SolverConfig, formula: &CnfFormula) -> Self {
        let n_vars = formula.num_vars;
        let mut solver = Self {
            db: ClauseDb::with_capacity(formula.num_clauses),
            watches: WatchList::new(lits_from_vars(n_vars)),
            trail: Trail::new(n_vars),
            heap: ActivityHeap::new(n_vars),
            values: vec![LBool::Undef; n_vars],
            levels: vec![0; n_vars],
            reasons: vec![None; n_vars],
            saved: vec![0; n_vars],
            local_best: vec![0; n_vars],
            mark: vec![0; n_vars + 1],
            time_stamp: 0,
            var_inc: 1.0,
            learnt: Vec::new(),
            reason_lits: Vec::new(),
            lbd_window: HeapRb::new(conf.lbd_window),
            fast_lbd_sum: 0.0,
            slow_lbd_sum: 0.0,
            threshold: 0.0,
            restarts: 0,
            reduces: 0,
            rephases: 0,
            reduce_limit: conf.reduce_limit,
            rephase_limit: conf.rephase_limit,
            rng: SmallRng::seed_from_u64(conf.seed),
            conf,
            stats: RuntimeStats::default(),
            status: SolveStatus::Unknown,
            n_vars,
        };
        solver.load(formula);
        solver
    }

    /// Feeds the input clauses into the engine. Empty clauses and falsified
    /// units settle the formula immediately; units assign at level 0;
    /// everything longer goes to the store with both watchers installed.
    /// Finishes with one BCP pass over the level-0 trail.
    fn load(&mut self, formula: &CnfFormula) {
        for clause in &formula.clauses {
            let lits: Vec<Lit> = clause.iter().map(|&l| Lit::from_dimacs(l)).collect();
            match lits.len() {
                0 => {
                    self.status = SolveStatus::Unsat;
                    return;
                }
                1 => match self.value(lits[0]) {
                    LBool::False => {
                        self.status = SolveStatus::Unsat;
                        return;
                    }
                    LBool::Undef => self.assign(lits[0], 0, None),
                    LBool::True => (),
                },
                _ => {
                    self.add_clause(&lits);
                }
            }
        }
        self.db.seal_original();
        if self.propagate().is_some() {
            self.status = SolveStatus::Unsat;
        }
    }

    pub fn solve(&mut self) -> SolveStatus {
        if let SolveStatus::Unsat = self.status {
            return SolveStatus::Unsat;
        }
        loop {
            if let Some(conflict) = self.propagate() {
                self.stats.conflicts += 1;
                let Some((bt_level, lbd)) = self.analyze(conflict) else {
                    self.status = SolveStatus::Unsat;
                    return SolveStatus::Unsat;
                };
                self.backtrack(bt_level);
                if self.learnt.len() == 1 {
                    let unit = self.learnt[0];
                    self.assign(unit, 0, None);
                } else {
                    let lits = mem::take(&mut self.learnt);
                    let id = self.add_clause(&lits);
                    self.db[id].lbd = lbd;
                    self.stats.learnt_clauses += 1;
                    // The learnt clause is asserting: it implies the UIP
                    // literal right at the backtrack level.
                    self.assign(lits[0], bt_level, Some(id));
                    self.learnt = lits;
                }
                self.var_inc *= 1.0 / self.conf.var_decay;
                self.restarts += 1;
                self.reduces += 1;
                self.rephases += 1;
                if self.trail.len() as f64 > self.threshold {
                    self.threshold = self.trail.len() as f64;
                    self.snapshot_local_best();
                }
            } else if self.reduces >= self.reduce_limit {
                self.reduce();
            } else if self.lbd_window.is_full()
                && self.conf.restart_factor * self.fast_lbd_sum / self.conf.lbd_window as f64
                    > self.slow_lbd_sum / self.stats.conflicts as f64
            {
                self.restart();
            } else if self.rephases >= self.rephase_limit {
                self.rephase();
            } else if !self.decide() {
                self.status = SolveStatus::Sat;
                return SolveStatus::Sat;
            }
        }
    }

    /// The satisfying assignment in signed DIMACS form, one literal per
    /// variable 1..=V. Meaningful only after solve returned Sat.
    pub fn model(&self) -> Vec<i64> {
        (0..self.n_vars)
            .map(|v| match self.values[v] {
                LBool::False => -(v as i64 + 1),
                _ => v as i64 + 1,
            })
            .collect()
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    /// Calculate value given a literal.
    fn value(&self, l: Lit) -> LBool {
        self.values[l.var_idx()] ^ LBool::from(l.sign() as u8)
    }

    /// Records an assignment on the trail. Does not touch the heap.
    fn assign(&mut self, lit: Lit, level: DecisionLevel, reason: Option<ClauseId>) {
        debug_assert!(
            self.value(lit) == LBool::Undef,
            "lit {lit} assigned already"
        );
        let v = lit.var_idx();
        self.values[v] = if lit.sign() { LBool::False } else { LBool::True };
        self.levels[v] = level;
        self.reasons[v] = reason;
        self.trail.push(lit);
    }

    /// Stores a clause of length >= 2 and installs its two watchers, each
    /// blocked on the opposite watched literal.
    fn add_clause(&mut self, lits: &[Lit]) -> ClauseId {
        debug_assert!(lits.len() >= 2);
        let id = self.db.add(lits);
        self.watches.add_watcher(!lits[0], Watcher::new(id, lits[1]));
        self.watches.add_watcher(!lits[1], Watcher::new(id, lits[0]));
        id
    }

    /// Boolean constraint propagation: closes the trail under unit
    /// propagation, returning the falsified clause on conflict.
    fn propagate(&mut self) -> Option<ClauseId> {
        while let Some(p) = self.trail.next_unpropagated() {
            self.stats.propagations += 1;
            if let Some(conflict) = self.propagate_watchers(p) {
                return Some(conflict);
            }
        }
        None
    }

    /// Walks the watch list of the newly true literal p, compacting it in
    /// place: a read index advances over the original entries while a write
    /// index records the kept ones.
    fn propagate_watchers(&mut self, p: Lit) -> Option<ClauseId> {
        let mut ws = self.watches.take_watchers(p);
        let mut conflict = None;
        let n_ws = ws.len();
        let (mut i, mut j) = (0, 0);
        let false_lit = !p;

        'next_watcher: while i < n_ws {
            // A true blocker means the clause is satisfied somewhere; keep
            // the watcher without touching the clause body.
            if self.value(ws[i].blocker) == LBool::True {
                ws[j] = ws[i];
                i += 1;
                j += 1;
                continue;
            }

            let cid = ws[i].clause;
            i += 1;
            let (first, clause_len) = {
                let c = &mut self.db[cid];
                // Keep the falsified watched literal in slot 1.
                if c.lits[0] == false_lit {
                    c.lits.swap(0, 1);
                }
                debug_assert!(c.lits[1] == false_lit);
                (c.lits[0], c.len())
            };

            let w = Watcher::new(cid, first);
            if self.value(first) == LBool::True {
                // Satisfied by the other watched literal; refresh the blocker.
                ws[j] = w;
                j += 1;
                continue;
            }

            // Look for a replacement watch among the tail literals.
            for k in 2..clause_len {
                let cand = self.db[cid].lits[k];
                if self.value(cand) != LBool::False {
                    let c = &mut self.db[cid];
                    c.lits[1] = cand;
                    c.lits[k] = false_lit;
                    self.watches.add_watcher(!cand, w);
                    // The watcher migrated away from p's list.
                    continue 'next_watcher;
                }
            }

            // No replacement: the clause is unit or falsified, and p keeps
            // watching it either way.
            ws[j] = w;
            j += 1;
            if self.value(first) == LBool::False {
                debug!("conflict in {:?}", self.db[cid]);
                conflict = Some(cid);
                while i < n_ws {
                    ws[j] = ws[i];
                    i += 1;
                    j += 1;
                }
            } else {
                let level = self.levels[p.var_idx()];
                self.assign(first, level, Some(cid));
            }
        }

        ws.truncate(j);
        self.watches.set_watchers(p, ws);
        conflict
    }

    /// First-UIP conflict analysis. Leaves the learnt clause in self.learnt
    /// with the asserting literal in slot 0, and returns the backtrack level
    /// and the clause LBD. None means the conflict sits at level 0 and the
    /// formula is unsatisfiable.
    fn analyze(&mut self, conflict: ClauseId) -> Option<(DecisionLevel, Lbd)> {
        let highest = self.levels[self.db[conflict].lits[0].var_idx()];
        if highest == 0 {
            return None;
        }

        self.time_stamp += 1;
        self.learnt.clear();
        self.learnt.push(Lit::default()); // slot 0 is reserved for the UIP
        let mut bumped: Vec<Var> = Vec::with_capacity(32);

        let mut unresolved = 0usize; // marked literals left at the conflict level
        let mut first_clause = true;
        let mut uip;
        let mut index = self.trail.len() - 1;
        let mut clause = conflict;

        loop {
            let clause_len = self.db[clause].len();
            self.reason_lits.resize(clause_len, Lit::default());
            self.reason_lits.copy_from_slice(&self.db[clause].lits);

            // Slot 0 of an antecedent is the literal just resolved away.
            let start = if first_clause { 0 } else { 1 };
            first_clause = false;
            for idx in start..clause_len {
                let lit = self.reason_lits[idx];
                let vi = lit.var_idx();
                if self.mark[vi] != self.time_stamp && self.levels[vi] > 0 {
                    self.bump_var(lit.var(), 0.5);
                    bumped.push(lit.var());
                    self.mark[vi] = self.time_stamp;
                    if self.levels[vi] >= highest {
                        unresolved += 1;
                    } else {
                        self.learnt.push(lit);
                    }
                }
            }

            // Resolve against the most recent marked trail literal at the
            // conflict level; marked literals below that level stay in the
            // learnt clause.
            let resolve = loop {
                while self.mark[self.trail.get(index).var_idx()] != self.time_stamp {
                    index -= 1;
                }
                let l = self.trail.get(index);
                // Index 0 can only hold the final resolvent, so the
                // saturation is never observed by a later search.
                index = index.saturating_sub(1);
                if self.levels[l.var_idx()] >= highest {
                    break l;
                }
            };

            uip = resolve;
            let antecedent = self.reasons[resolve.var_idx()];
            self.mark[resolve.var_idx()] = 0;
            unresolved -= 1;
            if unresolved == 0 {
                break;
            }
            debug_assert!(
                antecedent.is_some(),
                "resolvent below the decision lacks an antecedent"
            );
            clause = antecedent.unwrap();
        }

        // Learning the negated UIP makes the clause asserting.
        self.learnt[0] = !uip;
        debug_assert!({
            let vars: FxHashSet<Var> = self.learnt.iter().map(|l| l.var()).collect();
            vars.len() == self.learnt.len()
        });

        // LBD: count distinct nonzero levels, marking level slots with a
        // fresh time-stamp.
        self.time_stamp += 1;
        let mut lbd: Lbd = 0;
        for idx in 0..self.learnt.len() {
            let lvl = self.levels[self.learnt[idx].var_idx()] as usize;
            if lvl != 0 && self.mark[lvl] != self.time_stamp {
                self.mark[lvl] = self.time_stamp;
                lbd += 1;
            }
        }

        if let Some(evicted) = self.lbd_window.push_overwrite(lbd) {
            self.fast_lbd_sum -= evicted as f64;
        }
        self.fast_lbd_sum += lbd as f64;
        self.slow_lbd_sum += lbd.min(self.conf.lbd_window as Lbd) as f64;

        // Backtrack to the second-highest level in the clause, keeping that
        // level's literal in slot 1 as the other watch.
        let bt_level = if self.learnt.len() == 1 {
            0
        } else {
            let mut max_idx = 1;
            for idx in 2..self.learnt.len() {
                if self.levels[self.learnt[idx].var_idx()]
                    > self.levels[self.learnt[max_idx].var_idx()]
                {
                    max_idx = idx;
                }
            }
            self.learnt.swap(1, max_idx);
            self.levels[self.learnt[1].var_idx()]
        };

        // Re-bump the variables that stay relevant after backtracking.
        for &var in &bumped {
            if self.levels[var as usize] + 1 >= bt_level {
                self.bump_var(var, 1.0);
            }
        }

        debug!(
            "learnt {:?} (lbd {lbd}, backtrack to {bt_level})",
            self.learnt
        );
        Some((bt_level, lbd))
    }

    /// Bumps a variable's activity, rescaling everything when the scores
    /// threaten to overflow, and refreshes its heap position.
    fn bump_var(&mut self, var: Var, coeff: f64) {
        if self.heap.bump(var, self.var_inc * coeff) > self.conf.rescale_limit {
            self.heap.rescale(self.conf.rescale_factor);
            self.var_inc *= self.conf.rescale_factor;
        }
        if self.heap.in_heap(var) {
            self.heap.update(var);
        }
    }

    /// Unassigns everything above the target level, saving phases and
    /// returning the variables to the heap.
    fn backtrack(&mut self, level: DecisionLevel) {
        if self.trail.decision_level() <= level {
            return;
        }
        let cut = self.trail.level_boundary(level);
        for idx in (cut..self.trail.len()).rev() {
            let lit = self.trail.get(idx);
            let v = lit.var_idx();
            self.values[v] = LBool::Undef;
            self.saved[v] = if lit.sign() { -1 } else { 1 };
            if !self.heap.in_heap(lit.var()) {
                self.heap.insert(lit.var());
            }
        }
        self.trail.truncate_to_level(level);
    }

    /// Picks the most active unassigned variable, opens a decision level,
    /// and assigns it its saved phase (positive when none was saved).
    /// Returns false when every variable is assigned.
    fn decide(&mut self) -> bool {
        let next = loop {
            match self.heap.pop() {
                None => return false,
                Some(v) if self.values[v as usize] == LBool::Undef => break v,
                Some(_) => (),
            }
        };
        self.stats.decisions += 1;
        self.trail.open_level();
        let lit = Lit::new(next, self.saved[next as usize] < 0);
        let level = self.trail.decision_level();
        debug!("decide {lit} at level {level}");
        self.assign(lit, level, None);
        true
    }

    /// Glucose-style restart: drop the fast-LBD window, return to level 0,
    /// and probabilistically reset saved phases toward the local best.
    fn restart(&mut self) {
        self.stats.restarts += 1;
        self.restarts = 0;
        self.lbd_window.clear();
        self.fast_lbd_sum = 0.0;
        self.backtrack(0);

        let roll = self.rng.gen_range(0..100u32);
        if roll < PHASE_BEST_PCT {
            for v in 0..self.n_vars {
                self.saved[v] = self.local_best[v];
            }
        } else if roll < PHASE_BEST_PCT + PHASE_INVERT_PCT {
            for v in 0..self.n_vars {
                self.saved[v] = -self.local_best[v];
            }
        } else if roll < PHASE_BEST_PCT + PHASE_INVERT_PCT + PHASE_RANDOM_PCT {
            for v in 0..self.n_vars {
                self.saved[v] = if self.rng.gen_range(0..2) == 1 { 1 } else { -1 };
            }
        }
        debug!(
            "restart #{} after {} conflicts",
            self.stats.restarts, self.stats.conflicts
        );
    }

    /// Clause database reduction: randomly drop half of the high-LBD learnt
    /// clauses, compact the store, and rewrite every watcher through the
    /// resulting remap.
    fn reduce(&mut self) {
        self.stats.reduces += 1;
        self.reduces = 0;
        self.reduce_limit += self.conf.reduce_limit_step;
        self.backtrack(0);

        let before = self.db.len();
        let remap = self.db.reduce(self.conf.reduce_lbd_floor, &mut self.rng);
        self.watches.rewrite(&remap);
        // Reduction runs at level 0, where analysis never dereferences a
        // reason; clearing them all beats remapping stale ids.
        for reason in &mut self.reasons {
            *reason = None;
        }
        self.stats.deleted_clauses += (before - self.db.len()) as u64;
        info!(
            "reduce #{}: {} -> {} clauses ({} conflicts so far)",
            self.stats.reduces,
            before,
            self.db.len(),
            self.stats.conflicts
        );
    }

    /// Rephase event: shrink the local-best threshold and push the next
    /// event out. The actual phase rewriting happens inside restart.
    fn rephase(&mut self) {
        self.stats.rephases += 1;
        self.rephases = 0;
        self.threshold *= self.conf.threshold_decay;
        self.rephase_limit += self.conf.rephase_limit_step;
    }

    /// Remembers the current assignment as the deepest trail seen.
    fn snapshot_local_best(&mut self) {
        for v in 0..self.n_vars {
            self.local_best[v] = match self.values[v] {
                LBool::True => 1,
                LBool::False => -1,
                LBool::Undef => 0,
            };
        }
    }
}
