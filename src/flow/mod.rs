//! The delegated-login state machine and the pieces a host plugs into it.
//!
//! A host (front end, desktop shell, CLI, test) supplies a `Verifier`, a
//! `SessionStore` and a `Navigator`; `DelegatedLogin` drives one page
//! instance from `Verifying` to `Success` or `Error` and schedules the
//! navigation that ends it.

pub mod banner;
pub mod exit;
pub mod machine;
pub mod navigator;
pub mod scheduler;
pub mod status;

pub use banner::ImpersonationBanner;
pub use exit::exit_impersonation;
pub use machine::{DelegatedLogin, FlowError, FlowSettings};
pub use navigator::{LoggingNavigator, Navigation, NavigationKind, Navigator, RecordingNavigator};
pub use scheduler::DelayedNavigation;
pub use status::LoginStatus;
