//! Service layer module
//!
//! Contains the AI fallback dispatcher, streaming proxy, reachability checks,
//! utilities and the response formatter

pub mod dispatcher;
pub mod formatter;
pub mod jokes;
pub mod proxy;
pub mod status;
pub mod world_time;

pub use dispatcher::{AnswerPolicy, FallbackDispatcher, Verdict};
pub use proxy::StreamProxy;
pub use status::StatusChecker;
