pub mod flow;
pub mod session;
pub mod user;

pub use flow::Flow;
pub use session::{DelegatedSession, Mode, ADVISORY_SESSION_WINDOW_SECS};
pub use user::UserProfile;
