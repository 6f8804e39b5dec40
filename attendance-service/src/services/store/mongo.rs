use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use super::{AttendanceLedger, InsertOutcome, SessionStore, TemplateStore};
use crate::models::{AttendanceRecord, Session, SessionStatus, Template};
use crate::services::database::MongoDb;
use crate::services::error::AttendanceError;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Whether a write failed on a unique index.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

impl MongoDb {
    async fn transition(&self, id: &str, to: SessionStatus) -> Result<bool, AttendanceError> {
        let result = self
            .sessions()
            .update_one(
                doc! { "_id": id, "status": SessionStatus::Active.as_str() },
                doc! { "$set": { "status": to.as_str() } },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn find_attendance(
        &self,
        filter: Document,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let options = FindOptions::builder()
            .sort(doc! { "verified_at": -1, "_id": -1 })
            .build();
        let cursor = self.attendance().find(filter, options).await?;
        let records: Vec<AttendanceRecord> = cursor.try_collect().await?;
        Ok(records)
    }
}

#[async_trait]
impl SessionStore for MongoDb {
    async fn insert(&self, session: &Session) -> Result<(), AttendanceError> {
        self.sessions().insert_one(session, None).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, AttendanceError> {
        Ok(self.sessions().find_one(doc! { "_id": id }, None).await?)
    }

    async fn mark_expired(&self, id: &str) -> Result<bool, AttendanceError> {
        self.transition(id, SessionStatus::Expired).await
    }

    async fn mark_completed(&self, id: &str) -> Result<bool, AttendanceError> {
        self.transition(id, SessionStatus::Completed).await
    }

    async fn count_live_for_owner(
        &self,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, AttendanceError> {
        let filter = doc! {
            "owner": owner,
            "status": SessionStatus::Active.as_str(),
            "expires_at": { "$gte": bson::DateTime::from_chrono(now) },
        };
        Ok(self.sessions().count_documents(filter, None).await?)
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, AttendanceError> {
        let result = self
            .sessions()
            .update_many(
                doc! {
                    "status": SessionStatus::Active.as_str(),
                    "expires_at": { "$lt": bson::DateTime::from_chrono(now) },
                },
                doc! { "$set": { "status": SessionStatus::Expired.as_str() } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn health_check(&self) -> Result<(), AttendanceError> {
        MongoDb::health_check(self).await?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceLedger for MongoDb {
    async fn insert_if_absent(
        &self,
        record: &AttendanceRecord,
    ) -> Result<InsertOutcome, AttendanceError> {
        match self.attendance().insert_one(record, None).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_duplicate_key(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn find(
        &self,
        participant: &str,
        session_id: &str,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        Ok(self
            .attendance()
            .find_one(
                doc! { "participant": participant, "session_id": session_id },
                None,
            )
            .await?)
    }

    async fn list_for_participant(
        &self,
        participant: &str,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        self.find_attendance(doc! { "participant": participant }).await
    }

    async fn list_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        self.find_attendance(doc! { "session_id": session_id }).await
    }
}

#[async_trait]
impl TemplateStore for MongoDb {
    async fn push_front_bounded(
        &self,
        participant: &str,
        template: Template,
        bound: usize,
    ) -> Result<usize, AttendanceError> {
        // $position/$slice keep head insertion and truncation in one update.
        let update = doc! {
            "$push": {
                "templates": {
                    "$each": [template],
                    "$position": 0,
                    "$slice": bound as i64,
                }
            },
            "$set": { "updated_at": bson::DateTime::now() },
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let stored = self
            .identity_templates()
            .find_one_and_update(doc! { "_id": participant }, update, options)
            .await?
            .ok_or_else(|| {
                AttendanceError::Internal(anyhow::anyhow!(
                    "template upsert returned no document for {}",
                    participant
                ))
            })?;
        Ok(stored.templates.len())
    }

    async fn templates(&self, participant: &str) -> Result<Vec<Template>, AttendanceError> {
        Ok(self
            .identity_templates()
            .find_one(doc! { "_id": participant }, None)
            .await?
            .map(|t| t.templates)
            .unwrap_or_default())
    }
}
