pub mod attendance;
pub mod identity_template;
pub mod session;

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use identity_template::{IdentityTemplates, Template};
pub use session::{Session, SessionStatus};
