use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelMode {
    Immediate,
    #[default]
    PeriodEnd,
}

impl Display for CancelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            CancelMode::Immediate => "immediate",
            CancelMode::PeriodEnd => "period_end",
        };
        write!(f, "{}", mode)
    }
}

impl CancelMode {
    /// Type of the synthetic event appended when a member cancels.
    pub fn event_type(&self) -> &'static str {
        match self {
            CancelMode::Immediate => "app.subscription.cancelled_immediate",
            CancelMode::PeriodEnd => "app.subscription.cancel_requested",
        }
    }
}
