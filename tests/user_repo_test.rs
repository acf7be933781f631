use bson::oid::ObjectId;
use mersal_backend::config::mongo_conf::MongoConfig;
use mersal_backend::model::user::NewUser;
use mersal_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use mersal_backend::repository::user_repo::{MongoUserRepository, UniqueField, UserRepository};
use mersal_backend::util::logger::Logger;
use mersal_backend::util::password::{PasswordUtils, PasswordUtilsImpl};
use tokio;

async fn setup_user_repository() -> RepositoryResult<MongoUserRepository> {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();
    let _ = Logger::new();
    let config = MongoConfig::from_env().map_err(|e| RepositoryError::database(format!("Failed to load MongoConfig: {}", e)))?;
    MongoUserRepository::new(&config).await.map_err(|e| RepositoryError::database(format!("Failed to setup MongoUserRepository: {}", e)))
}

// Collision-free usernames/emails so runs do not step on each other
fn unique(tag: &str) -> String {
    format!("{}_{}", tag, ObjectId::new().to_hex())
}

fn new_user(username: String, email: String) -> NewUser {
    NewUser {
        username,
        first_name: "Test".to_string(),
        last_name: Some("User".to_string()),
        email,
        password: "S3cure!password".to_string(),
    }
}

#[tokio::test]
async fn test_user_repository_workflow() {
    let repo = setup_user_repository().await.expect("Failed to setup user repository");

    let username = unique("walid");
    let email = format!("{}@test.mersal.app", unique("walid"));
    let details = new_user(username.clone(), email.clone());

    // Username and email start out available
    assert!(repo.check_availability(&username, UniqueField::Username).await.expect("Failed to check username availability"));
    assert!(repo.check_availability(&email, UniqueField::Email).await.expect("Failed to check email availability"));

    // Create the user
    let created = repo.create_user(details.clone()).await.expect("Failed to create user");
    assert!(created.id.is_some());
    assert!(!created.is_online);
    assert!(created.created_at.is_some());
    assert!(created.updated_at.is_some());
    let user_id = created.id.unwrap();

    // Stored password is a hash that still verifies against the plaintext
    assert_ne!(created.password_hash, details.password);
    assert!(PasswordUtilsImpl::verify_password(&details.password, &created.password_hash).expect("Failed to verify password"));

    // Both values are now taken
    assert!(!repo.check_availability(&username, UniqueField::Username).await.expect("Failed to check username availability"));
    assert!(!repo.check_availability(&email, UniqueField::Email).await.expect("Failed to check email availability"));

    // Same username with a fresh email is rejected
    let dup = new_user(username.clone(), format!("{}@test.mersal.app", unique("other")));
    let err = repo.create_user(dup).await.expect_err("Duplicate username must fail");
    assert!(matches!(err, RepositoryError::AlreadyExists(_)));

    // Same email with a fresh username is rejected
    let dup = new_user(unique("other"), email.clone());
    let err = repo.create_user(dup).await.expect_err("Duplicate email must fail");
    assert!(matches!(err, RepositoryError::AlreadyExists(_)));

    // First record survived the failed inserts
    let fetched = repo.get_user_by_id(user_id).await.expect("Failed to get user by id");
    assert_eq!(fetched.id, Some(user_id));
    assert_eq!(fetched.username, username);

    // Toggle online status; the call returns the pre-update record
    let before = repo.change_login_status(user_id, true).await.expect("Failed to change login status");
    assert!(!before.is_online);
    let after = repo.get_user_by_id(user_id).await.expect("Failed to get user by id");
    assert!(after.is_online);

    // Listing contains the record
    let users = repo.get_users().await.expect("Failed to list users");
    assert!(users.iter().any(|u| u.id == Some(user_id)));

    // Delete returns the prior record data, then the id resolves to nothing
    let deleted = repo.delete_user_by_id(user_id).await.expect("Failed to delete user").expect("Expected the deleted record back");
    assert_eq!(deleted.username, username);
    let err = repo.get_user_by_id(user_id).await.expect_err("Deleted user must not resolve");
    assert!(matches!(err, RepositoryError::NotFound(_)));

    // Deleting again is an empty result, not an error
    assert!(repo.delete_user_by_id(user_id).await.expect("Second delete must not error").is_none());

    // Email is available again after the delete
    assert!(repo.check_availability(&email, UniqueField::Email).await.expect("Failed to check email availability"));
}

#[tokio::test]
async fn test_lookups_with_unknown_id() {
    let repo = setup_user_repository().await.expect("Failed to setup user repository");

    let ghost = ObjectId::new();
    assert!(matches!(repo.get_user_by_id(ghost).await, Err(RepositoryError::NotFound(_))));
    assert!(matches!(repo.change_login_status(ghost, true).await, Err(RepositoryError::NotFound(_))));
    assert!(repo.delete_user_by_id(ghost).await.expect("Delete of unknown id must not error").is_none());
}

#[tokio::test]
async fn test_find_by_login_prefers_username() {
    let repo = setup_user_repository().await.expect("Failed to setup user repository");

    // Second account whose email is exactly the first account's username
    let login = unique("nadia");
    let first = repo
        .create_user(new_user(login.clone(), format!("{}@test.mersal.app", unique("nadia"))))
        .await
        .expect("Failed to create first user");
    let second = repo
        .create_user(new_user(unique("rival"), login.clone()))
        .await
        .expect("Failed to create second user");

    // The username match wins over the email match on the same login value
    let found = repo.find_by_login(&login).await.expect("Failed to find by login").expect("Expected a match");
    assert_eq!(found.id, first.id);

    // Email fallback when no username matches
    let found = repo.find_by_login(&first.email).await.expect("Failed to find by login").expect("Expected a match");
    assert_eq!(found.id, first.id);

    // No match at all is an empty result, not an error
    assert!(repo.find_by_login(&unique("missing")).await.expect("Failed to find by login").is_none());

    repo.delete_user_by_id(first.id.unwrap()).await.expect("Failed to delete first user");
    repo.delete_user_by_id(second.id.unwrap()).await.expect("Failed to delete second user");
}
