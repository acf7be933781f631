use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub is_online: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl User {
    /// Display name assembled from the name parts. A user without a last
    /// name gets the first name alone, no trailing separator.
    pub fn full_name(&self) -> String {
        match self.last_name {
            Some(ref last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Input for user creation. No id, no timestamps, and the password is
/// still in clear form; the repository hashes it before anything is
/// written to the collection.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: None,
            username: "amine".to_string(),
            first_name: "Amine".to_string(),
            last_name: Some("Bouzid".to_string()),
            email: "amine@mersal.app".to_string(),
            password_hash: "$2b$10$hash".to_string(),
            is_online: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_full_name_with_last_name() {
        let user = sample_user();
        assert_eq!(user.full_name(), "Amine Bouzid");
    }

    #[test]
    fn test_full_name_without_last_name() {
        let mut user = sample_user();
        user.last_name = None;
        assert_eq!(user.full_name(), "Amine");
    }
}
