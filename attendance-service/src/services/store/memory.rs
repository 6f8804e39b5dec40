//! `DashMap`-backed stores. Each mutation goes through a single shard entry,
//! which gives the same atomicity as the MongoDB conditional writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{AttendanceLedger, InsertOutcome, SessionStore, TemplateStore};
use crate::models::{AttendanceRecord, Session, SessionStatus, Template};
use crate::services::error::AttendanceError;

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn transition(&self, id: &str, to: SessionStatus) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut session) if session.status == SessionStatus::Active => {
                session.status = to;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: &Session) -> Result<(), AttendanceError> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, AttendanceError> {
        Ok(self.sessions.get(id).map(|s| s.value().clone()))
    }

    async fn mark_expired(&self, id: &str) -> Result<bool, AttendanceError> {
        Ok(self.transition(id, SessionStatus::Expired))
    }

    async fn mark_completed(&self, id: &str) -> Result<bool, AttendanceError> {
        Ok(self.transition(id, SessionStatus::Completed))
    }

    async fn count_live_for_owner(
        &self,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, AttendanceError> {
        let count = self
            .sessions
            .iter()
            .filter(|s| s.owner == owner && s.status == SessionStatus::Active && !s.is_overdue(now))
            .count();
        Ok(count as u64)
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, AttendanceError> {
        let mut expired = 0;
        for mut session in self.sessions.iter_mut() {
            if session.status == SessionStatus::Active && session.is_overdue(now) {
                session.status = SessionStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn health_check(&self) -> Result<(), AttendanceError> {
        Ok(())
    }
}

/// Records carry an insertion sequence so equal timestamps still list in a
/// stable newest-first order.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceLedger {
    records: DashMap<(String, String), (u64, AttendanceRecord)>,
    next_seq: AtomicU64,
}

impl InMemoryAttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_newest_first<F>(&self, keep: F) -> Vec<AttendanceRecord>
    where
        F: Fn(&AttendanceRecord) -> bool,
    {
        let mut records: Vec<(u64, AttendanceRecord)> = self
            .records
            .iter()
            .filter(|r| keep(&r.value().1))
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|(seq_a, a), (seq_b, b)| {
            b.verified_at
                .cmp(&a.verified_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        records.into_iter().map(|(_, record)| record).collect()
    }
}

#[async_trait]
impl AttendanceLedger for InMemoryAttendanceLedger {
    async fn insert_if_absent(
        &self,
        record: &AttendanceRecord,
    ) -> Result<InsertOutcome, AttendanceError> {
        let key = (record.participant.clone(), record.session_id.clone());
        match self.records.entry(key) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert((seq, record.clone()));
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn find(
        &self,
        participant: &str,
        session_id: &str,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let key = (participant.to_string(), session_id.to_string());
        Ok(self.records.get(&key).map(|r| r.value().1.clone()))
    }

    async fn list_for_participant(
        &self,
        participant: &str,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.collect_newest_first(|r| r.participant == participant))
    }

    async fn list_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.collect_newest_first(|r| r.session_id == session_id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: DashMap<String, Vec<Template>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn push_front_bounded(
        &self,
        participant: &str,
        template: Template,
        bound: usize,
    ) -> Result<usize, AttendanceError> {
        let mut entry = self.templates.entry(participant.to_string()).or_default();
        entry.insert(0, template);
        entry.truncate(bound);
        Ok(entry.len())
    }

    async fn templates(&self, participant: &str) -> Result<Vec<Template>, AttendanceError> {
        Ok(self
            .templates
            .get(participant)
            .map(|t| t.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn session(owner: &str, now: DateTime<Utc>) -> Session {
        Session::new(
            owner.to_string(),
            "Networks".to_string(),
            "10.0.0.5".to_string(),
            now,
            2,
        )
    }

    #[tokio::test]
    async fn status_transitions_are_one_shot() {
        let store = InMemorySessionStore::new();
        let s = session("f1", Utc::now());
        store.insert(&s).await.unwrap();

        assert!(store.mark_expired(&s.id).await.unwrap());
        assert!(!store.mark_expired(&s.id).await.unwrap());
        assert!(!store.mark_completed(&s.id).await.unwrap());
        assert_eq!(
            store.get(&s.id).await.unwrap().unwrap().status,
            SessionStatus::Expired
        );
        assert!(!store.mark_expired("missing").await.unwrap());
    }

    #[tokio::test]
    async fn sweep_expires_only_overdue_active_sessions() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let old = session("f1", now - Duration::minutes(10));
        let fresh = session("f1", now);
        store.insert(&old).await.unwrap();
        store.insert(&fresh).await.unwrap();

        assert_eq!(store.count_live_for_owner("f1", now).await.unwrap(), 1);
        assert_eq!(store.expire_overdue(now).await.unwrap(), 1);
        assert_eq!(store.expire_overdue(now).await.unwrap(), 0);
        assert_eq!(
            store.get(&fresh.id).await.unwrap().unwrap().status,
            SessionStatus::Active
        );
    }

    #[tokio::test]
    async fn concurrent_inserts_for_same_pair_admit_one() {
        let ledger = Arc::new(InMemoryAttendanceLedger::new());
        let s = session("f1", Utc::now());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = ledger.clone();
            let record =
                AttendanceRecord::verified("s1".to_string(), &s, "10.0.0.5".to_string(), Utc::now());
            handles.push(tokio::spawn(async move {
                ledger.insert_if_absent(&record).await.unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() == InsertOutcome::Inserted {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(ledger.list_for_session(&s.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn equal_timestamps_list_latest_insert_first() {
        let ledger = InMemoryAttendanceLedger::new();
        let at = Utc::now();
        let sessions: Vec<Session> = (0..8).map(|_| session("f1", at)).collect();

        for s in &sessions {
            let record = AttendanceRecord::verified("s1".to_string(), s, "10.0.0.5".to_string(), at);
            ledger.insert_if_absent(&record).await.unwrap();
        }

        let listed: Vec<String> = ledger
            .list_for_participant("s1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.session_id)
            .collect();
        let expected: Vec<String> = sessions.iter().rev().map(|s| s.id.clone()).collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn template_list_is_bounded_most_recent_first() {
        let store = InMemoryTemplateStore::new();
        for i in 0..12 {
            let count = store
                .push_front_bounded("s1", vec![i as f64, 1.0], 10)
                .await
                .unwrap();
            assert_eq!(count, (i + 1).min(10));
        }

        let stored = store.templates("s1").await.unwrap();
        assert_eq!(stored.len(), 10);
        assert_eq!(stored[0], vec![11.0, 1.0]);
        assert_eq!(stored[9], vec![2.0, 1.0]);
        assert!(store.templates("nobody").await.unwrap().is_empty());
    }
}
