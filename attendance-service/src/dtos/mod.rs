pub mod attendance;
pub mod identity;
pub mod sessions;

pub use attendance::{AttendanceListResponse, AttendanceResponse, MarkAttendanceRequest};
pub use identity::{
    ActivityValidateRequest, ActivityValidateResponse, EnrollTemplateRequest,
    EnrollTemplateResponse, VerifyIdentityRequest, VerifyIdentityResponse,
};
pub use sessions::{CreateSessionRequest, SessionResponse};
