/// Outcome of one scheduler pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Guilds whose celebration message was sent
    pub guilds_announced: usize,
    /// Members marked as celebrated, whether or not the message went out
    pub users_celebrated: usize,
    /// Expired birthday roles handled in this pass
    pub roles_expired: usize,
}

impl ScanSummary {
    pub fn is_empty(&self) -> bool {
        self.guilds_announced == 0 && self.users_celebrated == 0 && self.roles_expired == 0
    }
}
