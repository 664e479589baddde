pub mod registry;
pub mod session;
pub mod validation;

pub use registry::JoinSessions;
pub use session::{JoinError, JoinNotice, JoinPhase, JoinSession, JoinSessionView};
pub use validation::{check_balance, validate_selection, JoinViolation};
