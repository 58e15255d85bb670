use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, RefreshTokenRecord, TokenPair}, user::User},
    ports::{AuthRepository, UserRepository},
};
use crate::error::AppError;
use crate::config::Config;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Sha256, Digest};
use tracing::{error, info, warn};

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    users: Arc<dyn UserRepository>,
    config: Config,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, users: Arc<dyn UserRepository>, config: Config) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self { repo, users, config, encoding_key, decoding_key }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Password hashing failed: {}", e);
                AppError::Internal
            })
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<(), AppError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|_| AppError::Internal)?;

        Argon2::default().verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Unauthorized)
    }

    pub async fn login(&self, user: &User) -> Result<TokenPair, AppError> {
        let family_id = Uuid::new_v4().to_string();
        self.issue_token_pair(user, family_id, 1).await
    }

    /// Rotates a refresh token. The presented token is revoked either way.
    ///
    /// Presenting a token that was already revoked means it leaked or was replayed,
    /// so every token of its family is revoked too.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<(TokenPair, User), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);
        let now = Utc::now();

        let Some(record) = self.repo.consume_refresh_token(&token_hash, now).await? else {
            if let Some(replayed) = self.repo.find_refresh_token(&token_hash).await? {
                let revoked = self.repo.revoke_family(&replayed.family_id, now).await?;
                warn!(
                    user_id = %replayed.user_id,
                    family_id = %replayed.family_id,
                    revoked,
                    "Revoked refresh token replayed; family revoked"
                );
            }
            return Err(AppError::Unauthorized);
        };

        if record.expires_at < now {
            info!("Expired refresh token presented for user {}", record.user_id);
            return Err(AppError::Unauthorized);
        }

        let Some(user) = self.users.find_by_id(&record.user_id).await? else {
            warn!("Refresh token for unknown user {}; revoking family", record.user_id);
            self.repo.revoke_family(&record.family_id, now).await?;
            return Err(AppError::Unauthorized);
        };

        let pair = self.issue_token_pair(&user, record.family_id, record.generation_id + 1).await?;
        Ok((pair, user))
    }

    /// Ends the session the token belongs to. Unknown or already revoked tokens are ignored.
    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);
        let now = Utc::now();
        if let Some(record) = self.repo.consume_refresh_token(&token_hash, now).await? {
            self.repo.revoke_family(&record.family_id, now).await?;
            info!(user_id = %record.user_id, "Refresh token family revoked on logout");
        }
        Ok(())
    }

    pub async fn purge_expired_tokens(&self) -> Result<u64, AppError> {
        self.repo.purge_expired(Utc::now()).await
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    async fn issue_token_pair(&self, user: &User, family_id: String, generation_id: i32) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.config.access_token_minutes);

        let claims = Claims {
            iss: self.config.jwt_issuer.clone(),
            sub: user.id.clone(),
            aud: self.config.jwt_audience.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        let refresh_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();

        let refresh_record = RefreshTokenRecord {
            token_hash: self.hash_token(&refresh_token),
            user_id: user.id.clone(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(self.config.refresh_token_days),
            created_at: now,
            revoked_at: None,
        };

        self.repo.store_refresh_token(&refresh_record).await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_at,
        })
    }

    pub fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
