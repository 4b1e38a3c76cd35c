//! Accounts: registration, login, session verification and profiles

use super::club_service::caller;
use super::error::{ServiceError, ServiceResult};
use super::requests::{LoginRequest, RegisterRequest};
use super::validation::{normalize_email, Validate};
use crate::config::AuthConfig;
use crate::core_auth::{PasswordHasher, TokenSigner};
use crate::core_store::{ClubStore, User, UserId, UserProfile};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Same message for unknown email and wrong password
const INVALID_CREDENTIALS: &str = "invalid login credentials";

/// Signed credential handed to a client after register or login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub auth_token: String,
}

/// The caller's profile with club references resolved to names
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyProfile {
    pub user: UserProfile,
    pub included_in_clubs: Vec<String>,
    pub following_clubs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<ClubStore>,
    hasher: PasswordHasher,
    signer: TokenSigner,
    admin_emails: HashSet<String>,
}

impl UserService {
    pub fn new(
        store: Arc<ClubStore>,
        hasher: PasswordHasher,
        signer: TokenSigner,
        admin_emails: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            store,
            hasher,
            signer,
            admin_emails: admin_emails.into_iter().map(|e| normalize_email(&e)).collect(),
        }
    }

    pub fn from_config(store: Arc<ClubStore>, config: &AuthConfig) -> ServiceResult<Self> {
        Ok(Self::new(
            store,
            PasswordHasher::from_config(config)?,
            TokenSigner::from_config(config),
            config.admin_emails.iter().cloned(),
        ))
    }

    pub fn register(&self, request: &RegisterRequest) -> ServiceResult<SessionToken> {
        request.validate()?;
        let email = normalize_email(&request.email);

        // hash before opening the write transaction
        let password_hash = self.hasher.hash(&request.password)?;

        let mut user = User::new(
            email,
            request.name.trim().to_string(),
            password_hash,
            request.institute_id.trim().to_string(),
        );
        if self.admin_emails.contains(&user.email) {
            user.promote_to_admin();
        }

        self.store.write(|c| -> ServiceResult<()> {
            if c.find_user_by_email(&user.email)?.is_some() {
                return Err(ServiceError::Conflict("User already exists".to_string()));
            }
            c.insert_user(&user)?;
            Ok(())
        })?;

        info!(user_id = %user.id, is_admin = user.is_admin, "User registered");
        self.session_for(user.id)
    }

    pub fn login(&self, request: &LoginRequest) -> ServiceResult<SessionToken> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let user = self.store.read(|c| c.find_user_by_email(&email))?;
        let Some(user) = user else {
            self.hasher.verify_dummy(&request.password);
            debug!("Login for unknown email");
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !self.hasher.verify(&request.password, &user.password_hash) {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        info!(user_id = %user.id, "User logged in");
        self.session_for(user.id)
    }

    fn session_for(&self, user_id: UserId) -> ServiceResult<SessionToken> {
        Ok(SessionToken {
            auth_token: self.signer.issue(user_id)?,
        })
    }

    /// Resolve a session token to the id of an existing user
    pub fn authenticate(&self, token: &str) -> ServiceResult<UserId> {
        let claims = self.signer.verify(token)?;
        let exists = self.store.read(|c| c.find_user(&claims.sub))?.is_some();
        if !exists {
            return Err(ServiceError::Authentication("User not found".to_string()));
        }
        Ok(claims.sub)
    }

    /// Every user except the caller
    pub fn list_users(&self, caller_id: &UserId) -> ServiceResult<Vec<UserProfile>> {
        let users = self.store.read(|c| c.list_users())?;
        Ok(users
            .iter()
            .filter(|u| &u.id != caller_id)
            .map(User::profile)
            .collect())
    }

    pub fn my_profile(&self, caller_id: &UserId) -> ServiceResult<MyProfile> {
        self.store.read(|c| -> ServiceResult<MyProfile> {
            let user = caller(c, caller_id)?;
            Ok(MyProfile {
                included_in_clubs: c.membership_club_names(&user.id)?,
                following_clubs: c.followed_club_names(&user.id)?,
                user: user.profile(),
            })
        })
    }
}
