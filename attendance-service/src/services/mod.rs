pub mod clock;
pub mod database;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod metrics;
pub mod redemption;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use database::MongoDb;
pub use error::AttendanceError;
pub use gate::{Evidence, IdentityGate, TemplateRegistry};
pub use lifecycle::{NewSession, SessionManager, SessionPolicy};
pub use redemption::{RedemptionEngine, RedemptionRequest};
pub use store::{AttendanceLedger, SessionStore, TemplateStore};
pub use sweeper::spawn_sweeper;
