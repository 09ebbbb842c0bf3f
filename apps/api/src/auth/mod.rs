//! Accounts, sessions and login throttling.

pub mod handlers;
pub mod password;
pub mod session;
pub mod throttle;

pub use session::CurrentUser;
pub use throttle::{AttemptStore, Clock, InMemoryAttemptStore, LoginThrottle, SystemClock};
