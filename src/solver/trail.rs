use super::types::{DecisionLevel, Lit};

/// The sequence of assigned literals, in assignment order, together with the
/// decision-level boundaries and the BCP frontier. The prefix below
/// `propagated` has been processed; the rest is the pending queue.
pub struct Trail {
    lits: Vec<Lit>,
    // lvl -> trail index at which that decision level began
    level_starts: Vec<usize>,
    propagated: usize,
}

impl Trail {
    pub fn new(n_vars: usize) -> Self {
        Self {
            lits: Vec::with_capacity(n_vars),
            level_starts: Vec::new(),
            propagated: 0,
        }
    }

    pub fn push(&mut self, l: Lit) {
        self.lits.push(l);
    }

    pub fn get(&self, i: usize) -> Lit {
        self.lits[i]
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    /// The number of open decision levels; level 0 is implicit.
    pub fn decision_level(&self) -> DecisionLevel {
        self.level_starts.len() as DecisionLevel
    }

    /// The trail index where entries above `level` begin.
    pub fn level_boundary(&self, level: DecisionLevel) -> usize {
        self.level_starts[level as usize]
    }

    /// Opens a new decision level at the current trail head.
    pub fn open_level(&mut self) {
        self.level_starts.push(self.lits.len());
    }

    /// Pops the next pending literal off the propagation queue.
    pub fn next_unpropagated(&mut self) -> Option<Lit> {
        if self.propagated >= self.lits.len() {
            None
        } else {
            let lit = self.lits[self.propagated];
            self.propagated += 1;
            Some(lit)
        }
    }

    pub fn fully_propagated(&self) -> bool {
        self.propagated >= self.lits.len()
    }

    /// Discards everything above `level`; propagation resumes at the cut.
    pub fn truncate_to_level(&mut self, level: DecisionLevel) {
        let cut = self.level_boundary(level);
        self.lits.truncate(cut);
        self.level_starts.truncate(level as usize);
        self.propagated = cut;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(l: i64) -> Lit {
        Lit::from_dimacs(l)
    }

    #[test]
    fn propagation_queue_drains_in_order() {
        let mut t = Trail::new(4);
        t.push(lit(1));
        t.push(lit(-2));
        assert_eq!(t.next_unpropagated(), Some(lit(1)));
        t.push(lit(3));
        assert_eq!(t.next_unpropagated(), Some(lit(-2)));
        assert_eq!(t.next_unpropagated(), Some(lit(3)));
        assert_eq!(t.next_unpropagated(), None);
        assert!(t.fully_propagated());
    }

    #[test]
    fn levels_open_at_trail_head() {
        let mut t = Trail::new(4);
        t.push(lit(1));
        t.open_level();
        t.push(lit(2));
        t.push(lit(3));
        t.open_level();
        t.push(lit(4));
        assert_eq!(t.decision_level(), 2);
        assert_eq!(t.level_boundary(0), 1);
        assert_eq!(t.level_boundary(1), 3);
    }

    #[test]
    fn truncate_rewinds_queue_to_the_cut() {
        let mut t = Trail::new(4);
        t.push(lit(1));
        t.open_level();
        t.push(lit(2));
        t.push(lit(3));
        while t.next_unpropagated().is_some() {}

        t.truncate_to_level(0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.decision_level(), 0);
        // everything below the cut stays propagated
        assert!(t.fully_propagated());
        t.push(lit(-3));
        assert_eq!(t.next_unpropagated(), Some(lit(-3)));
    }
}
