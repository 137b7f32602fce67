use std::fmt::Display;

/// The two bookable resource kinds. Both share the same ledger rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ClassSession,
    TrainerSlot,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ResourceKind::ClassSession => "class",
            ResourceKind::TrainerSlot => "trainer",
        };
        write!(f, "{}", kind)
    }
}

impl ResourceKind {
    /// Noun used in user-facing messages.
    pub fn noun(&self) -> &'static str {
        match self {
            ResourceKind::ClassSession => "session",
            ResourceKind::TrainerSlot => "slot",
        }
    }
}
