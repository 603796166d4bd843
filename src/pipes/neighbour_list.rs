use crate::utils::G6Error;

/// Per-pipe neighbour lists left behind by the last phase-2 evaluation.
///
/// The table holds the complete lists; truncation to the caller's buffer
/// happens at retrieval time, where saturation is reported rather than
/// silently swallowed. A table is valid until the next phase-2 call on the
/// same device replaces it.
#[derive(Debug, Clone, Default)]
pub struct NeighbourTable {
    lists: Vec<Vec<i32>>,
}

impl NeighbourTable {
    pub fn new(lists: Vec<Vec<i32>>) -> Self {
        Self { lists }
    }

    /// Number of pipes that produced a list in the last evaluation.
    pub fn pipe_count(&self) -> usize {
        self.lists.len()
    }

    /// Returns the first `maxlength` neighbour indices of pipe `ipipe`,
    /// together with the list's true length.
    ///
    /// A list longer than `maxlength` is truncated, never an error: the
    /// caller detects saturation by comparing the returned slice length with
    /// the true length (the ABI layer turns that into a positive status).
    ///
    /// # Errors
    ///
    /// Returns [`G6Error::CapacityExceeded`] if `ipipe` was not an active
    /// pipe of the last batch.
    pub fn retrieve(&self, ipipe: usize, maxlength: usize) -> Result<(&[i32], usize), G6Error> {
        let list = self.lists.get(ipipe).ok_or(G6Error::CapacityExceeded {
            requested: ipipe,
            pipes: self.lists.len(),
        })?;
        let copied = list.len().min(maxlength);
        Ok((&list[..copied], list.len()))
    }
}
