use std::mem;

use super::clause::ClauseId;
use super::types::Lit;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Watcher {
    pub clause: ClauseId,
    /// Some other literal of the clause; if it is currently true the clause
    /// is satisfied and the body need not be touched.
    pub blocker: Lit,
}

impl Watcher {
    pub fn new(clause: ClauseId, blocker: Lit) -> Self {
        Self { clause, blocker }
    }
}

/// Literal -> watchers of the clauses in which the literal's negation sits
/// in slot 0 or 1.
pub struct WatchList {
    occs: Vec<Vec<Watcher>>,
}

impl WatchList {
    // Creates a watch list covering n literals.
    pub fn new(n_lits: usize) -> Self {
        Self {
            occs: vec![Vec::new(); n_lits],
        }
    }

    // Adds a watcher to the literal's watched clauses list.
    pub fn add_watcher(&mut self, l: Lit, w: Watcher) {
        self.occs[l.idx()].push(w);
    }

    /// Hands ownership of this literal's watchers to the caller for in-place
    /// compaction. Make sure to put it back with set_watchers.
    pub fn take_watchers(&mut self, l: Lit) -> Vec<Watcher> {
        mem::take(&mut self.occs[l.idx()])
    }

    pub fn set_watchers(&mut self, l: Lit, ws: Vec<Watcher>) {
        self.occs[l.idx()] = ws;
    }

    pub fn watchers(&self, l: Lit) -> &[Watcher] {
        &self.occs[l.idx()]
    }

    /// After a reduction pass, rewrites every watcher through the remap and
    /// drops the watchers of deleted clauses.
    pub fn rewrite(&mut self, remap: &[Option<ClauseId>]) {
        for ws in &mut self.occs {
            let mut j = 0;
            for i in 0..ws.len() {
                if let Some(new_id) = remap[ws[i].clause] {
                    ws[j] = Watcher::new(new_id, ws[i].blocker);
                    j += 1;
                }
            }
            ws.truncate(j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_and_set_round_trip() {
        let mut wl = WatchList::new(4);
        let l = Lit::from_dimacs(1);
        wl.add_watcher(l, Watcher::new(0, Lit::from_dimacs(2)));
        wl.add_watcher(l, Watcher::new(1, Lit::from_dimacs(-2)));

        let mut ws = wl.take_watchers(l);
        assert_eq!(ws.len(), 2);
        assert!(wl.watchers(l).is_empty());
        ws.truncate(1);
        wl.set_watchers(l, ws);
        assert_eq!(
            wl.watchers(l).to_vec(),
            vec![Watcher::new(0, Lit::from_dimacs(2))]
        );
    }

    #[test]
    fn rewrite_remaps_and_drops() {
        let mut wl = WatchList::new(4);
        let l = Lit::from_dimacs(-2);
        wl.add_watcher(l, Watcher::new(0, Lit::from_dimacs(1)));
        wl.add_watcher(l, Watcher::new(1, Lit::from_dimacs(2)));
        wl.add_watcher(l, Watcher::new(2, Lit::from_dimacs(-1)));

        // Clause 1 deleted, clause 2 compacted into its slot.
        wl.rewrite(&[Some(0), None, Some(1)]);
        assert_eq!(
            wl.watchers(l).to_vec(),
            vec![
                Watcher::new(0, Lit::from_dimacs(1)),
                Watcher::new(1, Lit::from_dimacs(-1)),
            ]
        );
    }
}
