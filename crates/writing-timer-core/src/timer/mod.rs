mod clock;
mod countdown;
mod cycle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::{CountdownTimer, TimerState};
pub use cycle::{CyclePhase, CycleState, PomodoroConfig, Transition};
