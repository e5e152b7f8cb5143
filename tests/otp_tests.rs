//! One-time code contract: single use, TTL, attempt accounting

mod common;

use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use lyceum::auth::otp;
use lyceum::db::entities::otp_code::{self, Purpose};
use lyceum::services::users;
use lyceum::types::LyceumError;

async fn make_user(db: &DatabaseConnection) -> Uuid {
    users::register(
        db,
        users::RegisterInput {
            email: "otp@example.com".into(),
            password: "hunter2hunter2".into(),
            name: "Learner".into(),
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn correct_code_succeeds_exactly_once() {
    let db = common::setup_db().await;
    let user = make_user(&db).await;

    let code = otp::issue_code(&db, user, Purpose::VerifyEmail, 600)
        .await
        .unwrap();

    otp::verify_code(&db, user, Purpose::VerifyEmail, &code)
        .await
        .unwrap();

    // Second use of the same code fails
    let err = otp::verify_code(&db, user, Purpose::VerifyEmail, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Unauthorized(_)));
}

#[tokio::test]
async fn mismatched_code_is_rejected_and_counted() {
    let db = common::setup_db().await;
    let user = make_user(&db).await;

    let code = otp::issue_code(&db, user, Purpose::VerifyEmail, 600)
        .await
        .unwrap();
    let wrong = if code == "000000" { "000001" } else { "000000" };

    let err = otp::verify_code(&db, user, Purpose::VerifyEmail, wrong)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Unauthorized(_)));

    let record = otp_code::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(record.attempts, 1);
    assert!(record.consumed_at.is_none());
}

#[tokio::test]
async fn expired_code_is_rejected() {
    let db = common::setup_db().await;
    let user = make_user(&db).await;

    // Already past its TTL
    let code = otp::issue_code(&db, user, Purpose::VerifyEmail, -1)
        .await
        .unwrap();

    let err = otp::verify_code(&db, user, Purpose::VerifyEmail, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Unauthorized(_)));

    let record = otp_code::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(record.attempts, 1);
}

#[tokio::test]
async fn new_code_replaces_the_outstanding_one() {
    let db = common::setup_db().await;
    let user = make_user(&db).await;

    let first = otp::issue_code(&db, user, Purpose::VerifyEmail, 600)
        .await
        .unwrap();
    let second = otp::issue_code(&db, user, Purpose::VerifyEmail, 600)
        .await
        .unwrap();

    // The first code is gone; only the second verifies
    let err = otp::verify_code(&db, user, Purpose::VerifyEmail, &first)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Unauthorized(_)));

    otp::verify_code(&db, user, Purpose::VerifyEmail, &second)
        .await
        .unwrap();
}

#[tokio::test]
async fn lockout_after_too_many_failures() {
    let db = common::setup_db().await;
    let user = make_user(&db).await;

    let code = otp::issue_code(&db, user, Purpose::VerifyEmail, 600)
        .await
        .unwrap();
    let wrong = if code == "999999" { "999998" } else { "999999" };

    for _ in 0..otp::MAX_ATTEMPTS {
        let _ = otp::verify_code(&db, user, Purpose::VerifyEmail, wrong).await;
    }

    // Even the correct code is refused now
    let err = otp::verify_code(&db, user, Purpose::VerifyEmail, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Unauthorized(_)));
}
