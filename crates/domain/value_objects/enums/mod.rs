pub mod booking_statuses;
pub mod cancel_modes;
pub mod membership_statuses;
pub mod resource_kinds;
