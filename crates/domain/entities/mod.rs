pub mod bookings;
pub mod class_sessions;
pub mod group_classes;
pub mod jwt_blacklist;
pub mod membership_events;
pub mod plans;
pub mod trainers;
pub mod users;
