use crate::models::{AttendanceRecord, IdentityTemplates, Session};
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for attendance-service");

        // The unique index is what makes a redemption one-shot under
        // concurrent requests; the ledger insert relies on it.
        let participant_session_index = IndexModel::builder()
            .keys(doc! { "participant": 1, "session_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("participant_session_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let participant_history_index = IndexModel::builder()
            .keys(doc! { "participant": 1, "verified_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("participant_history".to_string())
                    .build(),
            )
            .build();

        let session_roster_index = IndexModel::builder()
            .keys(doc! { "session_id": 1, "verified_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("session_roster".to_string())
                    .build(),
            )
            .build();

        self.attendance()
            .create_indexes(
                [
                    participant_session_index,
                    participant_history_index,
                    session_roster_index,
                ],
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes on attendance collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created indexes on attendance");

        let owner_status_index = IndexModel::builder()
            .keys(doc! { "owner": 1, "status": 1, "expires_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("owner_live_sessions".to_string())
                    .build(),
            )
            .build();

        let status_expiry_index = IndexModel::builder()
            .keys(doc! { "status": 1, "expires_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("status_expiry_sweep".to_string())
                    .build(),
            )
            .build();

        self.sessions()
            .create_indexes([owner_status_index, status_expiry_index], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes on sessions collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created indexes on sessions");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn sessions(&self) -> Collection<Session> {
        self.db.collection("sessions")
    }

    pub fn attendance(&self) -> Collection<AttendanceRecord> {
        self.db.collection("attendance")
    }

    pub fn identity_templates(&self) -> Collection<IdentityTemplates> {
        self.db.collection("identity_templates")
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
