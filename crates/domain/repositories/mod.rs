pub mod bookings;
pub mod catalog;
pub mod group_classes;
pub mod membership;
pub mod plans;
pub mod revocations;
pub mod users;
