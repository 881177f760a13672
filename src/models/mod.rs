pub mod cookie;
pub mod outcome;
pub mod target;

pub use cookie::{load_cookies, Cookie};
pub use outcome::{AttemptResult, FinalOutcome, RunSummary, TargetOutcome};
pub use target::{Target, TargetList};
