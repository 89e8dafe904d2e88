/// A status enum with a fixed set of allowed moves.
///
/// Staying in the current status is always allowed and treated as a no-op, so
/// an admin re-submitting the same value is not an error.
pub trait Lifecycle: Copy + Eq + Sized + 'static {
    const ALL: &'static [Self];

    /// Allowed moves to a *different* status.
    fn allows(self, next: Self) -> bool;

    fn can_transition_to(self, next: Self) -> bool {
        self == next || self.allows(next)
    }

    /// Every status from which `next` may be reached, `next` itself included.
    /// Storage adapters use this to express a transition as one conditional write.
    fn predecessors_of(next: Self) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }
}
