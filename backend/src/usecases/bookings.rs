use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    repositories::bookings::BookingRepository,
    value_objects::{
        bookings::{BookOutcome, BookingRejection, BookingsDto, CancelOutcome},
        enums::resource_kinds::ResourceKind,
    },
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{} not found", capitalize(.0.noun()))]
    NotFound(ResourceKind),
    #[error("Cannot {1} past {}", .0.noun())]
    PastInstance(ResourceKind, &'static str),
    #[error("{} full", capitalize(.0.noun()))]
    Full(ResourceKind),
    #[error("Already booked")]
    AlreadyBooked,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::PastInstance(..) => StatusCode::BAD_REQUEST,
            BookingError::Full(_) | BookingError::AlreadyBooked => StatusCode::CONFLICT,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn from_rejection(kind: ResourceKind, action: &'static str, rejection: BookingRejection) -> Self {
        match rejection {
            BookingRejection::PastInstance => BookingError::PastInstance(kind, action),
            BookingRejection::Full => BookingError::Full(kind),
            BookingRejection::AlreadyBooked => BookingError::AlreadyBooked,
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(_) => AppError::NotFound(err.to_string()),
            BookingError::PastInstance(..) => AppError::InvalidState(err.to_string()),
            BookingError::Full(_) | BookingError::AlreadyBooked => {
                AppError::Conflict(err.to_string())
            }
            BookingError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BookingError>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingConfirmation {
    pub message: String,
}

pub struct BookingUseCase<B>
where
    B: BookingRepository + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
}

impl<B> BookingUseCase<B>
where
    B: BookingRepository + Send + Sync + 'static,
{
    pub fn new(booking_repo: Arc<B>) -> Self {
        Self { booking_repo }
    }

    pub async fn book(
        &self,
        kind: ResourceKind,
        user_id: Uuid,
        instance_id: Uuid,
    ) -> UseCaseResult<BookingConfirmation> {
        let outcome = self
            .booking_repo
            .book(kind, user_id, instance_id, Utc::now())
            .await
            .map_err(|err| {
                error!(%user_id, %instance_id, %kind, db_error = ?err, "bookings: failed to book");
                BookingError::Internal(err)
            })?;

        match outcome {
            BookOutcome::InstanceNotFound => Err(BookingError::NotFound(kind)),
            BookOutcome::Rejected(rejection) => {
                info!(%user_id, %instance_id, %kind, ?rejection, "bookings: booking rejected");
                Err(BookingError::from_rejection(kind, "book", rejection))
            }
            BookOutcome::Inserted | BookOutcome::Reactivated => {
                info!(%user_id, %instance_id, %kind, ?outcome, "bookings: booked");
                Ok(BookingConfirmation {
                    message: format!("Booked {kind} {}", kind.noun()),
                })
            }
        }
    }

    pub async fn cancel(
        &self,
        kind: ResourceKind,
        user_id: Uuid,
        instance_id: Uuid,
    ) -> UseCaseResult<BookingConfirmation> {
        let outcome = self
            .booking_repo
            .cancel(kind, user_id, instance_id, Utc::now())
            .await
            .map_err(|err| {
                error!(%user_id, %instance_id, %kind, db_error = ?err, "bookings: failed to cancel");
                BookingError::Internal(err)
            })?;

        match outcome {
            CancelOutcome::InstanceNotFound => Err(BookingError::NotFound(kind)),
            CancelOutcome::Rejected(rejection) => {
                info!(%user_id, %instance_id, %kind, ?rejection, "bookings: cancel rejected");
                Err(BookingError::from_rejection(kind, "cancel", rejection))
            }
            CancelOutcome::Canceled { released } => {
                if !released {
                    warn!(%user_id, %instance_id, %kind, "bookings: cancel without active booking");
                } else {
                    info!(%user_id, %instance_id, %kind, "bookings: canceled");
                }
                Ok(BookingConfirmation {
                    message: format!("Canceled {kind} {}", kind.noun()),
                })
            }
        }
    }

    pub async fn list_bookings(&self, user_id: Uuid) -> UseCaseResult<BookingsDto> {
        let class_bookings = self
            .booking_repo
            .list_class_bookings(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "bookings: failed to list class bookings");
                BookingError::Internal(err)
            })?;
        let trainer_bookings = self
            .booking_repo
            .list_trainer_bookings(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "bookings: failed to list trainer bookings");
                BookingError::Internal(err)
            })?;

        Ok(BookingsDto {
            class_bookings,
            trainer_bookings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::bookings::MockBookingRepository;
    use mockall::predicate::{always, eq};

    fn usecase(repo: MockBookingRepository) -> BookingUseCase<MockBookingRepository> {
        BookingUseCase::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn booking_a_trainer_slot_confirms() {
        let user_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();
        let mut repo = MockBookingRepository::new();
        repo.expect_book()
            .with(eq(ResourceKind::TrainerSlot), eq(user_id), eq(slot_id), always())
            .times(1)
            .returning(|_, _, _, _| Ok(BookOutcome::Inserted));

        let confirmation = usecase(repo)
            .book(ResourceKind::TrainerSlot, user_id, slot_id)
            .await
            .unwrap();

        assert_eq!(confirmation.message, "Booked trainer slot");
    }

    #[tokio::test]
    async fn reactivation_is_a_normal_booking() {
        let mut repo = MockBookingRepository::new();
        repo.expect_book()
            .returning(|_, _, _, _| Ok(BookOutcome::Reactivated));

        let confirmation = usecase(repo)
            .book(ResourceKind::ClassSession, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(confirmation.message, "Booked class session");
    }

    #[tokio::test]
    async fn rejections_map_to_taxonomy() {
        let cases = [
            (BookOutcome::InstanceNotFound, 404, "Slot not found"),
            (
                BookOutcome::Rejected(BookingRejection::PastInstance),
                400,
                "Cannot book past slot",
            ),
            (BookOutcome::Rejected(BookingRejection::Full), 409, "Slot full"),
            (
                BookOutcome::Rejected(BookingRejection::AlreadyBooked),
                409,
                "Already booked",
            ),
        ];

        for (outcome, code, message) in cases {
            let mut repo = MockBookingRepository::new();
            repo.expect_book().returning(move |_, _, _, _| Ok(outcome));

            let err = usecase(repo)
                .book(ResourceKind::TrainerSlot, Uuid::new_v4(), Uuid::new_v4())
                .await
                .unwrap_err();

            assert_eq!(err.status_code().as_u16(), code);
            assert_eq!(err.to_string(), message);
        }
    }

    #[tokio::test]
    async fn past_session_cancel_is_invalid_state() {
        let mut repo = MockBookingRepository::new();
        repo.expect_cancel()
            .returning(|_, _, _, _| Ok(CancelOutcome::Rejected(BookingRejection::PastInstance)));

        let err = usecase(repo)
            .cancel(ResourceKind::ClassSession, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Cannot cancel past session");
        assert!(matches!(AppError::from(err), AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn cancel_without_booking_still_succeeds() {
        let mut repo = MockBookingRepository::new();
        repo.expect_cancel()
            .returning(|_, _, _, _| Ok(CancelOutcome::Canceled { released: false }));

        let confirmation = usecase(repo)
            .cancel(ResourceKind::TrainerSlot, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(confirmation.message, "Canceled trainer slot");
    }

    #[tokio::test]
    async fn storage_failure_is_internal() {
        let mut repo = MockBookingRepository::new();
        repo.expect_book()
            .returning(|_, _, _, _| Err(anyhow::anyhow!("pool timed out")));

        let err = usecase(repo)
            .book(ResourceKind::ClassSession, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[tokio::test]
    async fn lists_both_kinds() {
        let user_id = Uuid::new_v4();
        let mut repo = MockBookingRepository::new();
        repo.expect_list_class_bookings()
            .with(eq(user_id))
            .returning(|_| Ok(Vec::new()));
        repo.expect_list_trainer_bookings()
            .with(eq(user_id))
            .returning(|_| Ok(Vec::new()));

        let dto = usecase(repo).list_bookings(user_id).await.unwrap();

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["classBookings"], serde_json::json!([]));
        assert_eq!(json["trainerBookings"], serde_json::json!([]));
    }
}
