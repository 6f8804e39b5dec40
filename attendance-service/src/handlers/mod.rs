pub mod attendance;
pub mod health;
pub mod identity;
pub mod sessions;

pub use attendance::{mark_attendance, my_attendance};
pub use health::{health_check, metrics_handler};
pub use identity::{enroll_template, validate_activity, verify_identity};
pub use sessions::{complete_session, create_session, get_session, list_session_attendance};
