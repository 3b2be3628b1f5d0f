//! Store round-trips against a real Postgres.
//!
//! Ignored by default. Run with:
//!   DATABASE_URL=postgresql:///postgres cargo test -p burnout_postgres -- --ignored
//!
//! Each test creates a throwaway database, applies the schema, and drops it.

use std::str::FromStr;

use chrono::{Duration, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use burnout_core::error::BurnoutError;
use burnout_core::ports::{EvaluationStore, RevocationLedger, UserStore};
use burnout_core::scoring::Answers;
use burnout_core::types::*;
use burnout_postgres::{migrate, PgEvaluationStore, PgRevocationLedger, PgUserStore};

struct TestDb {
    pool: PgPool,
    admin: PgPool,
    dbname: String,
}

async fn isolated_db() -> TestDb {
    let admin_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let dbname = format!("burnout_test_{}", uuid::Uuid::new_v4().simple());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(PgConnectOptions::from_str(&admin_url).unwrap())
        .await
        .expect("admin connect failed");
    sqlx::query(&format!(r#"CREATE DATABASE "{dbname}""#))
        .execute(&admin)
        .await
        .expect("CREATE DATABASE failed");

    let opts = PgConnectOptions::from_str(&admin_url)
        .unwrap()
        .database(&dbname);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("test db connect failed");
    migrate(&pool).await.expect("migration failed");

    TestDb {
        pool,
        admin,
        dbname,
    }
}

async fn drop_db(db: TestDb) {
    db.pool.close().await;
    let sql = format!(r#"DROP DATABASE IF EXISTS "{}" WITH (FORCE)"#, db.dbname);
    let _ = sqlx::query(&sql).execute(&db.admin).await;
    db.admin.close().await;
}

fn new_user(name: &str, role: Role) -> NewUser {
    NewUser {
        username: name.into(),
        email: format!("{name}@example.com"),
        password_hash: "$argon2id$placeholder".into(),
        role,
    }
}

fn new_evaluation(user_id: UserId, value: i32, minutes_ago: i64) -> NewEvaluation {
    let answers = Answers::from_stored([value; 10]);
    let score = answers.score();
    NewEvaluation {
        user_id,
        submitted_at: Utc::now() - Duration::minutes(minutes_ago),
        answers,
        total_score: score.total,
        needs_support: score.needs_support,
    }
}

#[tokio::test]
#[ignore]
async fn user_uniqueness_and_partial_update() {
    let db = isolated_db().await;
    let users = PgUserStore::new(db.pool.clone());

    let ada = users.insert(new_user("ada", Role::Student)).await.unwrap();
    assert_eq!(ada.role, Role::Student);
    assert!(ada.is_active);

    let dup = users.insert(new_user("ada", Role::Staff)).await;
    assert!(matches!(dup, Err(BurnoutError::Conflict(_))));

    let updated = users
        .update(
            ada.id,
            UserChanges {
                email: Some("ada@school.edu".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.username, "ada");
    assert_eq!(updated.email, "ada@school.edu");

    let found = users
        .find_by_username_or_email("nobody", "ada@school.edu")
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(ada.id));

    assert_eq!(users.list(Some(Role::Admin)).await.unwrap().len(), 0);
    assert_eq!(users.list(None).await.unwrap().len(), 1);

    drop_db(db).await;
}

#[tokio::test]
#[ignore]
async fn mark_handled_is_first_writer_wins() {
    let db = isolated_db().await;
    let users = PgUserStore::new(db.pool.clone());
    let evaluations = PgEvaluationStore::new(db.pool.clone());

    let student = users.insert(new_user("sam", Role::Student)).await.unwrap();
    let first = users.insert(new_user("root", Role::Admin)).await.unwrap();
    let second = users.insert(new_user("boss", Role::Admin)).await.unwrap();
    let e = evaluations
        .insert(new_evaluation(student.id, 4, 0))
        .await
        .unwrap();
    assert!(e.needs_support);
    assert_eq!(evaluations.count_unhandled().await.unwrap(), 1);

    let outcome = evaluations
        .mark_handled(e.id, first.id, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, HandleOutcome::Handled(_)));

    let again = evaluations
        .mark_handled(e.id, second.id, Utc::now())
        .await
        .unwrap()
        .unwrap();
    match again {
        HandleOutcome::AlreadyHandled(ev) => {
            assert_eq!(ev.handling.map(|h| h.admin_id), Some(first.id));
        }
        other => panic!("expected AlreadyHandled, got {other:?}"),
    }
    assert_eq!(evaluations.count_unhandled().await.unwrap(), 0);
    assert!(evaluations
        .mark_handled(9999, first.id, Utc::now())
        .await
        .unwrap()
        .is_none());

    // Referenced handler cannot be removed.
    assert!(matches!(
        users.delete(first.id).await,
        Err(BurnoutError::Conflict(_))
    ));

    drop_db(db).await;
}

#[tokio::test]
#[ignore]
async fn meetings_ordering_and_cascade() {
    let db = isolated_db().await;
    let users = PgUserStore::new(db.pool.clone());
    let evaluations = PgEvaluationStore::new(db.pool.clone());

    let student = users.insert(new_user("kim", Role::Student)).await.unwrap();
    let older = evaluations
        .insert(new_evaluation(student.id, 2, 30))
        .await
        .unwrap();
    let newer = evaluations
        .insert(new_evaluation(student.id, 3, 5))
        .await
        .unwrap();

    let listed = evaluations
        .list(Some(student.id), SortOrder::Oldest)
        .await
        .unwrap();
    assert_eq!(
        listed.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![older.id, newer.id]
    );

    let meeting = Meeting {
        place: "Room 4".into(),
        time: "14:00".into(),
        day: "Monday".into(),
        date: "2025-07-07".into(),
    };
    evaluations
        .set_meeting(older.id, &meeting)
        .await
        .unwrap()
        .unwrap();
    let latest = evaluations
        .latest_with_meeting(student.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, older.id);
    assert_eq!(latest.meeting, Some(meeting));

    assert!(users.delete(student.id).await.unwrap());
    assert!(evaluations.get(newer.id).await.unwrap().is_none());

    drop_db(db).await;
}

#[tokio::test]
#[ignore]
async fn revocation_is_idempotent() {
    let db = isolated_db().await;
    let ledger = PgRevocationLedger::new(db.pool.clone());

    assert!(!ledger.is_revoked("abc").await.unwrap());
    ledger.revoke("abc", Utc::now()).await.unwrap();
    ledger.revoke("abc", Utc::now()).await.unwrap();
    assert!(ledger.is_revoked("abc").await.unwrap());

    drop_db(db).await;
}
