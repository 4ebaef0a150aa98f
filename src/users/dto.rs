use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::recipes::dto::ShortRecipe;
use crate::users::repo_types::User;

const NAME_MAX_LEN: u64 = 150;
const EMAIL_MAX_LEN: u64 = 254;
const PASSWORD_MIN_LEN: u64 = 8;
const PASSWORD_MAX_LEN: u64 = 128;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
}

fn not_reserved(username: &str) -> Result<(), ValidationError> {
    if username.eq_ignore_ascii_case("me") {
        return Err(ValidationError::new("reserved").with_message("This username is reserved.".into()));
    }
    Ok(())
}

/// Request body for user registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."), length(max = EMAIL_MAX_LEN))]
    pub email: String,
    #[validate(
        length(min = 1, max = NAME_MAX_LEN),
        regex(path = *USERNAME_RE, message = "Letters, digits and @/./+/-/_ only."),
        custom(function = "not_reserved")
    )]
    pub username: String,
    #[validate(length(min = 1, max = NAME_MAX_LEN))]
    pub first_name: String,
    #[validate(length(min = 1, max = NAME_MAX_LEN))]
    pub last_name: String,
    #[validate(length(min = PASSWORD_MIN_LEN, max = PASSWORD_MAX_LEN))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[validate(length(min = PASSWORD_MIN_LEN, max = PASSWORD_MAX_LEN))]
    pub new_password: String,
    pub current_password: String,
}

/// Returned right after registration.
#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for CreatedUserResponse {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}

/// Public view of a user as seen by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn new(u: User, is_subscribed: bool) -> Self {
        Self {
            email: u.email,
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            is_subscribed,
        }
    }
}

/// A followed author with a preview of their recipes.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: "cook@example.com".into(),
            username: username.into(),
            first_name: "Ivan".into(),
            last_name: "Petrov".into(),
            password: password.into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(request("ivan.petrov", "long-enough").validate().is_ok());
    }

    #[test]
    fn registration_field_rules() {
        let errs = request("bad name!", "short").validate().unwrap_err();
        let fields = errs.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("email"));

        let errs = request("me", "long-enough").validate().unwrap_err();
        assert!(errs.field_errors().contains_key("username"));
    }

    #[test]
    fn subscription_response_flattens_user() {
        let resp = SubscriptionResponse {
            user: UserResponse {
                email: "a@b.c".into(),
                id: 7,
                username: "a".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                is_subscribed: true,
            },
            recipes: vec![],
            recipes_count: 0,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["is_subscribed"], true);
        assert_eq!(json["recipes_count"], 0);
    }
}
