/// Orders fetch responses so an older one never overwrites a newer one.
///
/// Each request takes a sequence number from `issue`; the response is applied
/// only if `accept` returns true for its number.
#[derive(Debug, Clone, Default)]
pub struct FetchSequencer {
    issued: u64,
    applied: u64,
}

impl FetchSequencer {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// True if `seq` is newer than everything applied so far; records it.
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.applied || seq > self.issued {
            return false;
        }
        self.applied = seq;
        true
    }

    /// Latest issued request has not been answered yet
    pub fn is_pending(&self) -> bool {
        self.issued > self.applied
    }
}
