use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::users::{InsertUserEntity, UserEntity},
    value_objects::enums::membership_statuses::MembershipStatus,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUserModel {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
}

impl RegisterUserModel {
    /// New accounts start `inactive` until a plan or payment activates them.
    pub fn to_entity(&self, password_hash: String) -> InsertUserEntity {
        let now = Utc::now();
        InsertUserEntity {
            email: normalize_email(&self.email),
            password_hash,
            full_name: self.full_name.clone(),
            gender: self.gender.clone(),
            date_of_birth: self.date_of_birth,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            goal: self.goal.clone(),
            membership_status: MembershipStatus::Inactive.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginModel {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Public view of a user; never carries the password hash or billing ids.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
    pub membership_status: MembershipStatus,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for UserDto {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            full_name: entity.full_name,
            gender: entity.gender,
            date_of_birth: entity.date_of_birth,
            height_cm: entity.height_cm,
            weight_kg: entity.weight_kg,
            goal: entity.goal,
            membership_status: MembershipStatus::from_str(&entity.membership_status),
            is_admin: entity.is_admin,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthResponseDto {
    pub token: String,
    pub user: UserDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_lowercases_email_and_starts_inactive() {
        let model = RegisterUserModel {
            email: "  Jane.Doe@Example.COM ".to_string(),
            password: "Secret#123".to_string(),
            ..Default::default()
        };

        let entity = model.to_entity("hash".to_string());

        assert_eq!(entity.email, "jane.doe@example.com");
        assert_eq!(entity.membership_status, "inactive");
        assert_eq!(entity.password_hash, "hash");
    }
}
