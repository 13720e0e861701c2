#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    /// Record total (i.e. monotonically increasing) number of:
    /// - decisions: branching decisions made.
    /// - propagations: literals processed by BCP.
    /// - conflicts: conflicts hit during search.
    /// - restarts: restart events fired.
    /// - reduces: clause database reductions performed.
    /// - rephases: rephase events fired.
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub restarts: u64,
    pub reduces: u64,
    pub rephases: u64,

    /// Clause database traffic:
    /// - learnt_clauses: clauses added by conflict analysis.
    /// - deleted_clauses: learnt clauses dropped by reduction.
    pub learnt_clauses: u64,
    pub deleted_clauses: u64,
}
