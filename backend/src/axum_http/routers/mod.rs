pub mod admin_classes;
pub mod auth;
pub mod billing;
pub mod protected;
pub mod public;
pub mod trainers;

use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

/// Parses a `:id` path segment; malformed ids are a validation error rather than a 404.
pub fn parse_path_id(raw: &str, resource: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {resource} ID")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_is_validation() {
        let err = parse_path_id("42", "class").unwrap_err();

        assert!(matches!(err, AppError::Validation(ref msg) if msg == "Invalid class ID"));
    }

    #[test]
    fn uuid_is_accepted() {
        let id = Uuid::new_v4();

        assert_eq!(parse_path_id(&id.to_string(), "session").unwrap(), id);
    }
}
