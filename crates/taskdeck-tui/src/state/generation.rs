/// Tag of one issued list request. Higher is newer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Hands out generations for one list and remembers the newest.
/// Only the newest request's result may be committed.
#[derive(Debug, Default)]
pub struct RequestSeq {
    latest: u64,
}

impl RequestSeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Generation {
        self.latest += 1;
        Generation(self.latest)
    }

    /// Newest generation issued so far (zero before the first request).
    pub fn current(&self) -> Generation {
        Generation(self.latest)
    }

    pub fn is_latest(&self, generation: Generation) -> bool {
        generation.0 == self.latest && self.latest != 0
    }
}
