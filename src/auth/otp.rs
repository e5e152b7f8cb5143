//! One-time verification codes
//!
//! Six-digit codes delivered by mail, stored hashed. A code is bound to a
//! (user, purpose) pair, expires after a configured TTL and can be consumed
//! exactly once; failed verifications are counted against it.

use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db::entities::otp_code::{self, Purpose};
use crate::types::{LyceumError, Result};

/// Failed attempts allowed before a code is locked out
pub const MAX_ATTEMPTS: i32 = 5;

/// Generate a random six-digit code
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// Hash a code for storage
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issue a fresh code for the user, invalidating any outstanding one
/// for the same purpose. Returns the plaintext code for mail delivery.
pub async fn issue_code<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    purpose: Purpose,
    ttl_seconds: i64,
) -> Result<String> {
    // A new code replaces whatever was outstanding
    otp_code::Entity::delete_many()
        .filter(otp_code::Column::UserId.eq(user_id))
        .filter(otp_code::Column::Purpose.eq(purpose))
        .filter(otp_code::Column::ConsumedAt.is_null())
        .exec(db)
        .await?;

    let code = generate_code();
    let now = Utc::now();

    otp_code::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        code_hash: Set(hash_code(&code)),
        purpose: Set(purpose),
        expires_at: Set(now + Duration::seconds(ttl_seconds)),
        consumed_at: Set(None),
        attempts: Set(0),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(code)
}

/// Verify and consume a code.
///
/// A correct, unexpired, unused code succeeds exactly once. Expired or
/// mismatched codes are rejected and recorded as a failed attempt.
pub async fn verify_code<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    purpose: Purpose,
    code: &str,
) -> Result<()> {
    let record = otp_code::Entity::find()
        .filter(otp_code::Column::UserId.eq(user_id))
        .filter(otp_code::Column::Purpose.eq(purpose))
        .filter(otp_code::Column::ConsumedAt.is_null())
        .order_by_desc(otp_code::Column::CreatedAt)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::Unauthorized("No active verification code".into()))?;

    if record.attempts >= MAX_ATTEMPTS {
        return Err(LyceumError::Unauthorized(
            "Too many failed attempts, request a new code".into(),
        ));
    }

    let now = Utc::now();
    if record.expires_at <= now || record.code_hash != hash_code(code) {
        record_failed_attempt(db, record.id, record.attempts).await?;
        return Err(LyceumError::Unauthorized(
            "Invalid or expired verification code".into(),
        ));
    }

    // Conditional consume: only one caller can win the null -> timestamp flip
    let consumed = otp_code::Entity::update_many()
        .col_expr(
            otp_code::Column::ConsumedAt,
            sea_orm::sea_query::Expr::value(Some(now)),
        )
        .filter(otp_code::Column::Id.eq(record.id))
        .filter(otp_code::Column::ConsumedAt.is_null())
        .exec(db)
        .await?;

    if consumed.rows_affected == 0 {
        return Err(LyceumError::Unauthorized(
            "Verification code already used".into(),
        ));
    }

    Ok(())
}

async fn record_failed_attempt<C: ConnectionTrait>(
    db: &C,
    code_id: Uuid,
    attempts: i32,
) -> Result<()> {
    otp_code::Entity::update_many()
        .col_expr(
            otp_code::Column::Attempts,
            sea_orm::sea_query::Expr::value(attempts + 1),
        )
        .filter(otp_code::Column::Id.eq(code_id))
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_hash_is_stable_and_hex() {
        let a = hash_code("123456");
        let b = hash_code("123456");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_code("654321"));
    }
}
