use std::fmt::Debug;
use std::ops::{Index, IndexMut};

use rand::{rngs::SmallRng, Rng};

use super::types::{Lbd, Lit};

/// Index of a clause in the store. Ids below the original count are
/// permanent; higher ids belong to learnt clauses, and every id is
/// invalidated by `reduce`, which returns the remap to apply.
pub type ClauseId = usize;

#[derive(Clone)]
pub struct Clause {
    /// Slots 0 and 1 are the watched positions; the tail order is free game
    /// for propagation to permute.
    pub lits: Vec<Lit>,
    /// LBD (Glucose level)
    pub lbd: Lbd,
}

impl Clause {
    fn new(lits: &[Lit]) -> Self {
        Self {
            lits: lits.to_vec(),
            lbd: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }
}

impl Debug for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit_str = self
            .lits
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "Clause {{ lbd: {}, lits: {} }}", self.lbd, lit_str)
    }
}

impl Index<usize> for Clause {
    type Output = Lit;
    fn index(&self, i: usize) -> &Lit {
        &self.lits[i]
    }
}

impl IndexMut<usize> for Clause {
    fn index_mut(&mut self, i: usize) -> &mut Lit {
        &mut self.lits[i]
    }
}

/// Dense clause store. The input clauses form a permanent prefix; everything
/// appended after `seal_original` is learnt and eligible for deletion.
pub struct ClauseDb {
    clauses: Vec<Clause>,
    original: usize,
}

impl ClauseDb {
    pub fn with_capacity(n_clauses: usize) -> Self {
        Self {
            clauses: Vec::with_capacity(n_clauses),
            original: 0,
        }
    }

    /// Appends a clause and returns its id.
    pub fn add(&mut self, lits: &[Lit]) -> ClauseId {
        self.clauses.push(Clause::new(lits));
        self.clauses.len() - 1
    }

    /// Marks the current contents as the permanent original prefix.
    pub fn seal_original(&mut self) {
        self.original = self.clauses.len();
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn original_count(&self) -> usize {
        self.original
    }

    pub fn num_learnt(&self) -> usize {
        self.clauses.len() - self.original
    }

    /// Deletes each learnt clause with LBD >= lbd_floor with probability 1/2
    /// and compacts the store. Returns the old-id -> new-id map; a None entry
    /// means the clause is gone. Watchers must be rewritten through the map
    /// before the store is used again.
    pub fn reduce(&mut self, lbd_floor: Lbd, rng: &mut SmallRng) -> Vec<Option<ClauseId>> {
        let old_size = self.clauses.len();
        let mut remap: Vec<Option<ClauseId>> = vec![None; old_size];
        for (id, slot) in remap.iter_mut().enumerate().take(self.original) {
            *slot = Some(id);
        }
        let mut new_size = self.original;
        for id in self.original..old_size {
            if self.clauses[id].lbd >= lbd_floor && rng.gen_range(0..2) == 0 {
                continue;
            }
            if new_size != id {
                self.clauses.swap(new_size, id);
            }
            remap[id] = Some(new_size);
            new_size += 1;
        }
        self.clauses.truncate(new_size);
        remap
    }
}

impl Index<ClauseId> for ClauseDb {
    type Output = Clause;
    fn index(&self, id: ClauseId) -> &Clause {
        &self.clauses[id]
    }
}

impl IndexMut<ClauseId> for ClauseDb {
    fn index_mut(&mut self, id: ClauseId) -> &mut Clause {
        &mut self.clauses[id]
    }
}
