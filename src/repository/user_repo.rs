use crate::config::mongo_conf::MongoConfig;
use crate::model::user::{NewUser, User};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt; // For next on MongoDB cursor
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use tracing::{error, info};

/// Fields carrying a unique index, usable as availability probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Hashes the plaintext password and inserts the record. Duplicate
    /// username or email fails with `AlreadyExists`.
    async fn create_user(&self, details: NewUser) -> RepositoryResult<User>;
    /// Returns true when no record holds `value` in the given field.
    async fn check_availability(&self, value: &str, field: UniqueField) -> RepositoryResult<bool>;
    /// Flips the online flag. Returns the record as it was before the
    /// update; `NotFound` when no record matches the id.
    async fn change_login_status(&self, id: ObjectId, new_value: bool) -> RepositoryResult<User>;
    async fn get_user_by_id(&self, id: ObjectId) -> RepositoryResult<User>;
    async fn get_users(&self) -> RepositoryResult<Vec<User>>;
    /// Matches on username first, then email. A miss on both is `Ok(None)`,
    /// not an error.
    async fn find_by_login(&self, login: &str) -> RepositoryResult<Option<User>>;
    /// Hard delete. Returns the deleted record, `Ok(None)` when the id
    /// matched nothing.
    async fn delete_user_by_id(&self, id: ObjectId) -> RepositoryResult<Option<User>>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    /// Create a new MongoUserRepository using MongoConfig
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        use mongodb::{options::{ClientOptions, Credential, ResolverConfig}, Client};

        // Parse client options from URI
        let mut client_options = ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare()).await?;
        client_options.app_name = Some("MersalBackend".to_string());
        client_options.max_pool_size = Some(config.pool_size);
        client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));

        // Set credentials if username and password are provided
        if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
            client_options.credential = Some(Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build());
        }

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database);
        let collection_name = config.get_user_collection().unwrap_or("users");
        let collection = db.collection::<User>(collection_name);
        Self::ensure_unique_indexes(&collection).await?;
        Ok(MongoUserRepository { collection })
    }

    /// Unique indexes back the username/email invariants. Racing inserts
    /// are settled by the server as duplicate-key write errors.
    async fn ensure_unique_indexes(
        collection: &mongodb::Collection<User>,
    ) -> Result<(), mongodb::error::Error> {
        for field in [UniqueField::Username, UniqueField::Email] {
            let key = field.as_str();
            let index = IndexModel::builder()
                .keys(doc! { key: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            collection.create_index(index, None).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {

    #[tracing::instrument(skip(self, details), fields(username = %details.username, email = %details.email))]
    async fn create_user(&self, details: NewUser) -> RepositoryResult<User> {
        info!("Creating new user");
        let hash = PasswordUtilsImpl::hash_password(&details.password)?;
        let time = chrono::Local::now().to_rfc3339();
        let user = User {
            id: Some(ObjectId::new()),
            username: details.username,
            first_name: details.first_name,
            last_name: details.last_name,
            email: details.email,
            password_hash: hash,
            is_online: false,
            created_at: Some(time.clone()),
            updated_at: Some(time),
        };

        let result = self.collection.insert_one(user.clone(), None).await;
        match result {
            Ok(_) => {
                info!("User created successfully");
                Ok(user)
            },
            Err(e) => {
                error!("Failed to create user: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(field = field.as_str()))]
    async fn check_availability(&self, value: &str, field: UniqueField) -> RepositoryResult<bool> {
        info!("Checking {} availability", field.as_str());
        let key = field.as_str();
        let filter = doc! { key: value };
        let result = self.collection.find_one(filter, None).await;
        match result {
            Ok(existing) => {
                let available = existing.is_none();
                info!("Value for {} is {}", field.as_str(), if available { "available" } else { "taken" });
                Ok(available)
            },
            Err(e) => {
                error!("Failed to check {} availability: {}", field.as_str(), e);
                Err(RepositoryError::database(format!("Failed to check {} availability: {}", field.as_str(), e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, new_value = new_value))]
    async fn change_login_status(&self, id: ObjectId, new_value: bool) -> RepositoryResult<User> {
        info!("Updating login status for ID: {}", id);
        let filter = doc! { "_id": id };
        let update = doc! { "$set": { "is_online": new_value, "updated_at": chrono::Local::now().to_rfc3339() } };
        // find_one_and_update returns the pre-update document by default,
        // which is the contract callers rely on here
        let result = self.collection.find_one_and_update(filter, update, None).await;
        match result {
            Ok(Some(user)) => {
                info!("Login status updated for ID: {}", id);
                Ok(user)
            },
            Ok(None) => {
                error!("User not found for ID: {}", id);
                Err(RepositoryError::not_found(format!("User not found for ID: {}", id)))
            },
            Err(e) => {
                error!("Failed to update login status: {}", e);
                Err(RepositoryError::database(format!("Failed to update login status: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_user_by_id(&self, id: ObjectId) -> RepositoryResult<User> {
        info!("Fetching user by ID: {}", id);
        let filter = doc! { "_id": id };
        let result = self.collection.find_one(filter, None).await;
        match result {
            Ok(Some(user)) => {
                info!("User found for ID: {}", id);
                Ok(user)
            },
            Ok(None) => {
                error!("User not found for ID: {}", id);
                Err(RepositoryError::not_found(format!("User not found for ID: {}", id)))
            },
            Err(e) => {
                error!("Failed to fetch user by ID: {}", e);
                Err(RepositoryError::database(format!("Failed to fetch user by ID: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn get_users(&self) -> RepositoryResult<Vec<User>> {
        info!("Listing all users");
        let cursor = self.collection.find(None, None).await;
        match cursor {
            Ok(mut cursor) => {
                let mut users = Vec::new();
                while let Some(user) = cursor.next().await {
                    match user {
                        Ok(u) => users.push(u),
                        Err(e) => {
                            error!("Failed to deserialize user: {}", e);
                            return Err(RepositoryError::serialization(format!("Failed to deserialize user: {}", e)));
                        }
                    }
                }
                info!("Fetched {} users", users.len());
                Ok(users)
            },
            Err(e) => {
                error!("Failed to list users: {}", e);
                Err(RepositoryError::database(format!("Failed to list users: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(login = %login))]
    async fn find_by_login(&self, login: &str) -> RepositoryResult<Option<User>> {
        info!("Looking up user by login");
        let by_username = self.collection.find_one(doc! { "username": login }, None).await;
        let user = match by_username {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                let by_email = self.collection.find_one(doc! { "email": login }, None).await;
                match by_email {
                    Ok(user) => user,
                    Err(e) => {
                        error!("Failed to look up user by email: {}", e);
                        return Err(RepositoryError::database(format!("Failed to look up user by email: {}", e)));
                    }
                }
            },
            Err(e) => {
                error!("Failed to look up user by username: {}", e);
                return Err(RepositoryError::database(format!("Failed to look up user by username: {}", e)));
            }
        };
        match user {
            Some(_) => info!("User found for login"),
            None => info!("No user matches login"),
        }
        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete_user_by_id(&self, id: ObjectId) -> RepositoryResult<Option<User>> {
        info!("Deleting user with ID: {}", id);
        let filter = doc! { "_id": id };
        let result = self.collection.find_one_and_delete(filter, None).await;
        match result {
            Ok(Some(user)) => {
                info!("User deleted for ID: {}", id);
                Ok(Some(user))
            },
            Ok(None) => {
                info!("No user to delete for ID: {}", id);
                Ok(None)
            },
            Err(e) => {
                error!("Failed to delete user: {}", e);
                Err(RepositoryError::database(format!("Failed to delete user: {}", e)))
            }
        }
    }
}
