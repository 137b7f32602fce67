use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Booked,
    Canceled,
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Canceled => "canceled",
        };
        write!(f, "{}", status)
    }
}

impl BookingStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "booked" => Some(BookingStatus::Booked),
            "canceled" => Some(BookingStatus::Canceled),
            _ => None,
        }
    }
}
