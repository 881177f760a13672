pub mod run_log;
pub mod session_store;
pub mod streak_sender;

pub use run_log::RunLog;
pub use session_store::{Session, SessionBackend, SessionStore};
pub use streak_sender::StreakSender;
