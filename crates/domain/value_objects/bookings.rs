use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::enums::booking_statuses::BookingStatus;

/// State of one instance as read under its row lock.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSnapshot {
    pub starts_at: DateTime<Utc>,
    pub capacity: i32,
    pub booked_count: i64,
    /// The caller's row for this instance, if one was ever written.
    pub existing_status: Option<BookingStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingRejection {
    PastInstance,
    Full,
    AlreadyBooked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingDecision {
    Insert,
    Reactivate,
    Rejected(BookingRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDecision {
    Cancel,
    Rejected(BookingRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOutcome {
    InstanceNotFound,
    Rejected(BookingRejection),
    Inserted,
    Reactivated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    InstanceNotFound,
    Rejected(BookingRejection),
    /// `released` is false when the caller held no active booking.
    Canceled { released: bool },
}

/// Decides a booking attempt. Checks run in a fixed order: started, full, already booked.
pub fn decide_book(snapshot: &InstanceSnapshot, now: DateTime<Utc>) -> BookingDecision {
    if snapshot.starts_at <= now {
        return BookingDecision::Rejected(BookingRejection::PastInstance);
    }

    if snapshot.booked_count >= i64::from(snapshot.capacity) {
        return BookingDecision::Rejected(BookingRejection::Full);
    }

    match snapshot.existing_status {
        Some(BookingStatus::Booked) => BookingDecision::Rejected(BookingRejection::AlreadyBooked),
        Some(BookingStatus::Canceled) => BookingDecision::Reactivate,
        None => BookingDecision::Insert,
    }
}

/// Bookings freeze once the instance has started.
pub fn decide_cancel(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> CancelDecision {
    if starts_at <= now {
        CancelDecision::Rejected(BookingRejection::PastInstance)
    } else {
        CancelDecision::Cancel
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassBookingView {
    pub id: Uuid,
    pub session_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub starts_at: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
    pub class_id: Uuid,
    pub class_title: String,
    pub class_blurb: Option<String>,
    pub booking_type: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrainerBookingView {
    pub id: Uuid,
    pub availability_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub starts_at: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
    pub trainer_id: Uuid,
    pub trainer_name: String,
    pub trainer_bio: Option<String>,
    pub booking_type: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingsDto {
    pub class_bookings: Vec<ClassBookingView>,
    pub trainer_bookings: Vec<TrainerBookingView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(capacity: i32, booked_count: i64, existing: Option<BookingStatus>) -> InstanceSnapshot {
        InstanceSnapshot {
            starts_at: Utc::now() + Duration::hours(2),
            capacity,
            booked_count,
            existing_status: existing,
        }
    }

    #[test]
    fn inserts_when_seat_free_and_no_row() {
        assert_eq!(decide_book(&snapshot(10, 3, None), Utc::now()), BookingDecision::Insert);
    }

    #[test]
    fn reactivates_canceled_row() {
        let decision = decide_book(&snapshot(10, 3, Some(BookingStatus::Canceled)), Utc::now());

        assert_eq!(decision, BookingDecision::Reactivate);
    }

    #[test]
    fn rejects_second_active_booking() {
        let decision = decide_book(&snapshot(10, 3, Some(BookingStatus::Booked)), Utc::now());

        assert_eq!(decision, BookingDecision::Rejected(BookingRejection::AlreadyBooked));
    }

    #[test]
    fn rejects_when_full() {
        let decision = decide_book(&snapshot(2, 2, None), Utc::now());

        assert_eq!(decision, BookingDecision::Rejected(BookingRejection::Full));
    }

    #[test]
    fn last_seat_is_bookable() {
        assert_eq!(decide_book(&snapshot(2, 1, None), Utc::now()), BookingDecision::Insert);
    }

    #[test]
    fn freed_seat_goes_to_the_next_booker() {
        let now = Utc::now();

        // A and B take both seats.
        assert_eq!(decide_book(&snapshot(2, 0, None), now), BookingDecision::Insert);
        assert_eq!(decide_book(&snapshot(2, 1, None), now), BookingDecision::Insert);

        // C finds the instance full.
        assert_eq!(
            decide_book(&snapshot(2, 2, None), now),
            BookingDecision::Rejected(BookingRejection::Full)
        );

        // A cancels, then C retries.
        assert_eq!(decide_book(&snapshot(2, 1, None), now), BookingDecision::Insert);

        // A coming back to a full instance does not get the canceled row back.
        assert_eq!(
            decide_book(&snapshot(2, 2, Some(BookingStatus::Canceled)), now),
            BookingDecision::Rejected(BookingRejection::Full)
        );
    }

    #[test]
    fn full_is_reported_before_already_booked() {
        let decision = decide_book(&snapshot(1, 1, Some(BookingStatus::Booked)), Utc::now());

        assert_eq!(decision, BookingDecision::Rejected(BookingRejection::Full));
    }

    #[test]
    fn past_is_reported_before_everything_else() {
        let now = Utc::now();
        let mut snap = snapshot(1, 1, Some(BookingStatus::Booked));
        snap.starts_at = now - Duration::minutes(1);

        assert_eq!(
            decide_book(&snap, now),
            BookingDecision::Rejected(BookingRejection::PastInstance)
        );
    }

    #[test]
    fn instance_starting_now_counts_as_past() {
        let now = Utc::now();
        let mut snap = snapshot(5, 0, None);
        snap.starts_at = now;

        assert_eq!(
            decide_book(&snap, now),
            BookingDecision::Rejected(BookingRejection::PastInstance)
        );
        assert_eq!(
            decide_cancel(now, now),
            CancelDecision::Rejected(BookingRejection::PastInstance)
        );
    }

    #[test]
    fn cancel_allowed_before_start() {
        let now = Utc::now();

        assert_eq!(decide_cancel(now + Duration::seconds(1), now), CancelDecision::Cancel);
    }

    #[test]
    fn bookings_dto_uses_camel_case_keys() {
        let dto = BookingsDto {
            class_bookings: Vec::new(),
            trainer_bookings: Vec::new(),
        };
        let json = serde_json::to_value(&dto).unwrap();

        assert!(json.get("classBookings").is_some());
        assert!(json.get("trainerBookings").is_some());
    }
}
