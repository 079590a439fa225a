mod controller;
mod mode;
mod sinks;
mod words;

pub use controller::{
    validate_minutes, SessionController, SessionState, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES,
    MIN_RECORDED_SECS,
};
pub use mode::SessionMode;
pub use sinks::{
    CompletedSession, MemoryStatistics, NotificationSink, SessionObserver, SilentNotifier,
    StatisticsSink,
};
pub use words::{WordCount, WordSession};
