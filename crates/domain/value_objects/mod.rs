pub mod bookings;
pub mod catalog;
pub mod enums;
pub mod group_classes;
pub mod iam;
pub mod membership;
