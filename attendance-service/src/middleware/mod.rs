pub mod caller;
pub mod origin;

pub use caller::{Caller, Role, USER_ID_HEADER, USER_ROLE_HEADER};
pub use origin::{ForwardedOrigin, FORWARDED_FOR_HEADER};
