pub mod accounts;
pub mod billing;
pub mod bookings;
pub mod catalog;
pub mod group_classes;
pub mod membership;
pub mod plan_resolver;
