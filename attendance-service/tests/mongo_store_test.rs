//! Store contract checks against a live MongoDB.
//!
//! Run with `MONGODB_URI` pointing at a disposable server:
//! `cargo test --test mongo_store_test -- --ignored`

use attendance_service::models::{AttendanceRecord, Session, SessionStatus};
use attendance_service::services::store::{AttendanceLedger, InsertOutcome, SessionStore, TemplateStore};
use attendance_service::services::MongoDb;
use chrono::{Duration, Utc};
use uuid::Uuid;

async fn connect() -> MongoDb {
    let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db = MongoDb::connect(&uri, &format!("attendance_test_{}", Uuid::new_v4()))
        .await
        .expect("Failed to connect to MongoDB");
    db.initialize_indexes().await.expect("Failed to create indexes");
    db
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn ledger_rejects_second_record_for_pair() {
    let db = connect().await;
    let session = Session::new("F".into(), "OS".into(), "10.0.0.5".into(), Utc::now(), 2);
    db.insert(&session).await.unwrap();

    let first = AttendanceRecord::verified("S1".into(), &session, "10.0.0.5".into(), Utc::now());
    let second = AttendanceRecord::verified("S1".into(), &session, "10.0.0.5".into(), Utc::now());

    assert_eq!(db.insert_if_absent(&first).await.unwrap(), InsertOutcome::Inserted);
    assert_eq!(db.insert_if_absent(&second).await.unwrap(), InsertOutcome::Duplicate);
    assert_eq!(db.list_for_session(&session.id).await.unwrap().len(), 1);

    db.database().drop(None).await.ok();
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn status_transitions_apply_once() {
    let db = connect().await;
    let start = Utc::now() - Duration::minutes(5);
    let session = Session::new("F".into(), "OS".into(), "10.0.0.5".into(), start, 2);
    db.insert(&session).await.unwrap();

    assert_eq!(db.count_live_for_owner("F", Utc::now()).await.unwrap(), 0);
    assert!(db.mark_expired(&session.id).await.unwrap());
    assert!(!db.mark_expired(&session.id).await.unwrap());
    assert!(!db.mark_completed(&session.id).await.unwrap());

    let stored = db.get(&session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Expired);

    db.database().drop(None).await.ok();
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn template_list_is_bounded_newest_first() {
    let db = connect().await;
    for i in 1..=11 {
        db.push_front_bounded("S1", vec![i as f64, 1.0], 10).await.unwrap();
    }

    let templates = db.templates("S1").await.unwrap();
    assert_eq!(templates.len(), 10);
    assert_eq!(templates[0][0], 11.0);
    assert_eq!(templates[9][0], 2.0);

    db.database().drop(None).await.ok();
}
