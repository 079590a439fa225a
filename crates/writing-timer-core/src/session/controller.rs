//! The application shell around the countdown.
//!
//! [`SessionController`] owns the countdown, the optional Pomodoro cycle and
//! the injected collaborators. It validates user input before it reaches the
//! timer, turns completions into statistics, notifications and phase changes,
//! and keeps collaborator failures away from timer state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::sinks::{CompletedSession, NotificationSink, SessionObserver, StatisticsSink};
use super::words::{WordCount, WordSession};
use super::SessionMode;
use crate::error::{Result, ValidationError};
use crate::events::{at_ms, Event};
use crate::timer::{Clock, CountdownTimer, CyclePhase, CycleState, PomodoroConfig, SystemClock, TimerState};

pub const MIN_DURATION_MINUTES: u32 = 1;
pub const MAX_DURATION_MINUTES: u32 = 999;

/// Sessions shorter than this are not recorded.
pub const MIN_RECORDED_SECS: u64 = 60;

/// Check a user-supplied duration.
///
/// # Errors
/// Returns `DurationOutOfRange` outside 1..=999 minutes.
pub fn validate_minutes(minutes: u32) -> Result<u32, ValidationError> {
    if (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::DurationOutOfRange {
            value: minutes,
            min: MIN_DURATION_MINUTES,
            max: MAX_DURATION_MINUTES,
        })
    }
}

/// Persistable part of a session controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub timer: TimerState,
    #[serde(default)]
    pub cycle: Option<CycleState>,
    #[serde(default)]
    pub mode: SessionMode,
    #[serde(default)]
    pub project: Option<String>,
    /// Run whose completion has already been handled.
    #[serde(default)]
    pub handled_run_id: Option<u64>,
    #[serde(default)]
    pub words: WordCount,
}

pub struct SessionController<C: Clock = SystemClock> {
    timer: CountdownTimer<C>,
    cycle: Option<CycleState>,
    pomodoro: PomodoroConfig,
    mode: SessionMode,
    project: Option<String>,
    handled_run_id: Option<u64>,
    words: WordCount,
    statistics: Box<dyn StatisticsSink>,
    notifier: Box<dyn NotificationSink>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl<C: Clock> SessionController<C> {
    /// Plain-session controller around `timer`.
    pub fn new(
        timer: CountdownTimer<C>,
        statistics: Box<dyn StatisticsSink>,
        notifier: Box<dyn NotificationSink>,
    ) -> Self {
        Self {
            timer,
            cycle: None,
            pomodoro: PomodoroConfig::default(),
            mode: SessionMode::default(),
            project: None,
            handled_run_id: None,
            words: WordCount::default(),
            statistics,
            notifier,
            observers: Vec::new(),
        }
    }

    /// Rebuild a controller from persisted state.
    pub fn from_state(
        state: SessionState,
        pomodoro: PomodoroConfig,
        clock: C,
        statistics: Box<dyn StatisticsSink>,
        notifier: Box<dyn NotificationSink>,
    ) -> Self {
        Self {
            timer: CountdownTimer::from_state(state.timer, clock),
            cycle: state.cycle,
            pomodoro,
            mode: state.mode,
            project: state.project,
            handled_run_id: state.handled_run_id,
            words: state.words,
            statistics,
            notifier,
            observers: Vec::new(),
        }
    }

    pub fn to_state(&self) -> SessionState {
        SessionState {
            timer: self.timer.state().clone(),
            cycle: self.cycle,
            mode: self.mode,
            project: self.project.clone(),
            handled_run_id: self.handled_run_id,
            words: self.words,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &CountdownTimer<C> {
        &self.timer
    }

    pub fn cycle(&self) -> Option<&CycleState> {
        self.cycle.as_ref()
    }

    pub fn pomodoro_enabled(&self) -> bool {
        self.cycle.is_some()
    }

    pub fn pomodoro_config(&self) -> &PomodoroConfig {
        &self.pomodoro
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn words(&self) -> &WordCount {
        &self.words
    }

    /// The phase the countdown is timing. Plain sessions count as work.
    pub fn phase(&self) -> CyclePhase {
        self.cycle.map(|c| c.phase()).unwrap_or(CyclePhase::Work)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            remaining_secs: self.timer.remaining_secs(),
            elapsed_secs: self.timer.elapsed_secs(),
            duration_secs: self.timer.duration_secs(),
            running: self.timer.is_running(),
            paused: self.timer.is_paused(),
            completed: self.timer.is_completed(),
            progress_pct: self.timer.progress(),
            formatted: self.timer.formatted_time(),
            mode: self.mode,
            phase: self.cycle.map(|c| c.phase()),
            session_index: self.cycle.map(|c| c.session_index()),
            at: at_ms(self.timer.now_ms()),
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Apply a preset or custom duration. Restarts the Pomodoro cycle.
    ///
    /// # Errors
    /// Rejects durations outside 1..=999 minutes without touching the timer.
    pub fn set_duration(&mut self, minutes: u32) -> Result<Vec<Event>> {
        let minutes = validate_minutes(minutes)?;
        if self.cycle.is_some() {
            self.cycle = Some(CycleState::new());
        }
        Ok(self.timer.set_duration(minutes).into_iter().collect())
    }

    /// Switch mode. An idle plain session adopts the mode's default length.
    pub fn set_mode(&mut self, mode: SessionMode) -> Vec<Event> {
        self.mode = mode;
        if self.timer.is_idle() && self.cycle.is_none() {
            return self.timer.set_duration(mode.default_minutes()).into_iter().collect();
        }
        Vec::new()
    }

    pub fn set_project(&mut self, project: Option<String>) {
        self.project = project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
    }

    pub fn set_words_at_start(&mut self, words: Option<u32>) {
        self.words.at_start = words;
    }

    pub fn set_words_at_end(&mut self, words: Option<u32>) {
        self.words.at_end = words;
    }

    pub fn set_word_target(&mut self, words: Option<u32>) {
        self.words.target = words;
    }

    pub fn clear_words(&mut self) {
        self.words = WordCount::default();
    }

    pub fn enable_pomodoro(&mut self) -> Vec<Event> {
        self.cycle = Some(CycleState::new());
        info!(work_minutes = self.pomodoro.work_minutes, "pomodoro mode enabled");
        self.timer
            .set_duration(self.pomodoro.work_minutes)
            .into_iter()
            .collect()
    }

    pub fn disable_pomodoro(&mut self) {
        if self.cycle.take().is_some() {
            info!("pomodoro mode disabled");
        }
    }

    /// Replace the Pomodoro durations. An idle work phase picks up the new
    /// work length immediately.
    ///
    /// # Errors
    /// Rejects invalid configurations and keeps the previous one.
    pub fn set_pomodoro_config(&mut self, config: PomodoroConfig) -> Result<Vec<Event>> {
        config.validate()?;
        self.pomodoro = config;
        let idle_work = matches!(self.cycle, Some(c) if c.phase() == CyclePhase::Work)
            && !self.timer.is_running();
        if idle_work {
            return Ok(self
                .timer
                .set_duration(config.work_minutes)
                .into_iter()
                .collect());
        }
        Ok(Vec::new())
    }

    // ── Timer commands ───────────────────────────────────────────────

    /// Start or resume. A fresh run forgets the previous closing word count.
    pub fn start(&mut self) -> Vec<Event> {
        let started = self.timer.start();
        if matches!(started, Some(Event::TimerStarted { .. })) {
            self.words.at_end = None;
        }
        started.into_iter().collect()
    }

    pub fn pause(&mut self) -> Vec<Event> {
        self.timer.pause().into_iter().collect()
    }

    pub fn resume(&mut self) -> Vec<Event> {
        self.timer.resume().into_iter().collect()
    }

    pub fn toggle(&mut self) -> Vec<Event> {
        self.timer.toggle().into_iter().collect()
    }

    /// # Errors
    /// Rejects extensions outside 1..=999 minutes.
    pub fn add_time(&mut self, minutes: u32) -> Result<Vec<Event>> {
        let minutes = validate_minutes(minutes)?;
        Ok(self.timer.add_time(minutes).into_iter().collect())
    }

    /// Stop the countdown, recording the work done so far.
    pub fn stop(&mut self) -> Vec<Event> {
        let already_recorded = self.timer.is_completed();
        let was_running = self.timer.is_running();
        let stopped = self.timer.stop();
        self.after_cancel(stopped, already_recorded, was_running)
    }

    /// Reset the countdown, recording the work done so far.
    pub fn reset(&mut self) -> Vec<Event> {
        let already_recorded = self.timer.is_completed();
        let was_running = self.timer.is_running();
        let reset = self.timer.reset();
        self.after_cancel(reset, already_recorded, was_running)
    }

    /// Advance the countdown. Call periodically.
    pub fn tick(&mut self) -> Vec<Event> {
        let was_running = self.timer.is_running();
        let completed = self.timer.tick();
        if was_running {
            let remaining = self.timer.remaining_secs();
            let progress = self.timer.progress();
            for observer in &mut self.observers {
                observer.on_tick(remaining, progress);
            }
        }
        match completed {
            Some(event) => self.handle_completion(event),
            None => Vec::new(),
        }
    }

    /// React to a `TimerCompleted` event.
    ///
    /// Completions from a run that has since been stopped or reconfigured are
    /// ignored, as is a second delivery of the same completion.
    pub fn handle_completion(&mut self, event: Event) -> Vec<Event> {
        let Event::TimerCompleted {
            run_id,
            elapsed_secs,
            ..
        } = event
        else {
            return Vec::new();
        };
        if run_id != self.timer.run_id()
            || !self.timer.is_completed()
            || self.handled_run_id == Some(run_id)
        {
            debug!(run_id, current = self.timer.run_id(), "ignoring stale completion");
            return Vec::new();
        }
        self.handled_run_id = Some(run_id);

        if let Err(e) = self.notifier.notify(&event) {
            warn!(error = %e, "completion notification failed");
        }
        for observer in &mut self.observers {
            observer.on_complete(&event);
        }

        let mut events = vec![event];
        if self.phase() == CyclePhase::Work {
            events.extend(self.record(elapsed_secs));
            events.extend(self.record_words());
        }

        if let Some(cycle) = self.cycle.as_mut() {
            let transition = cycle.advance(&self.pomodoro);
            let snapshot = *cycle;
            info!(
                from = %transition.from,
                to = %transition.to,
                session_index = snapshot.session_index(),
                "pomodoro phase changed"
            );
            events.extend(self.timer.set_duration(transition.next_minutes));
            events.push(Event::PhaseChanged {
                from: transition.from,
                to: transition.to,
                session_index: snapshot.session_index(),
                completed_work_sessions: snapshot.completed_work_sessions(),
                duration_secs: self.timer.duration_secs(),
                at: at_ms(self.timer.now_ms()),
            });
            for observer in &mut self.observers {
                observer.on_phase_change(transition.from, transition.to);
            }
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn after_cancel(
        &mut self,
        cancelled: Option<Event>,
        already_recorded: bool,
        was_running: bool,
    ) -> Vec<Event> {
        let Some(event) = cancelled else {
            return Vec::new();
        };
        let elapsed = match &event {
            Event::TimerStopped { elapsed_secs, .. } | Event::TimerReset { elapsed_secs, .. } => {
                *elapsed_secs
            }
            _ => 0,
        };
        let mut events = vec![event];
        if !already_recorded && self.phase() == CyclePhase::Work {
            events.extend(self.record(elapsed));
            if was_running {
                events.extend(self.record_words());
            }
        }
        events
    }

    /// Report the entered word counts and clear them. Counts are kept if
    /// the sink fails so the writer can retry.
    fn record_words(&mut self) -> Option<Event> {
        let session = WordSession::from_counts(
            &self.words,
            self.mode,
            self.project.clone(),
            at_ms(self.timer.now_ms()),
        )?;
        if let Err(e) = self.statistics.record_words(&session) {
            warn!(error = %e, words = session.words_written, "failed to record word count");
            return None;
        }
        self.words = WordCount::default();
        info!(words = session.words_written, "word count recorded");
        Some(Event::WordsRecorded {
            words_written: session.words_written,
            target_words: session.target_words,
            goal_achieved: session.goal_achieved,
            at: session.completed_at,
        })
    }

    /// Report a work session to the statistics sink if it lasted a minute.
    fn record(&mut self, elapsed_secs: u64) -> Option<Event> {
        if elapsed_secs < MIN_RECORDED_SECS {
            debug!(elapsed_secs, "session too short to record");
            return None;
        }
        let minutes = u32::try_from((elapsed_secs + 30) / 60).unwrap_or(u32::MAX);
        let session = CompletedSession {
            mode: self.mode,
            minutes,
            is_pomodoro_work: self.cycle.is_some() && self.phase() == CyclePhase::Work,
            project: self.project.clone(),
            completed_at: at_ms(self.timer.now_ms()),
        };
        if let Err(e) = self.statistics.record(&session) {
            warn!(error = %e, minutes, "failed to record session");
            return None;
        }
        info!(mode = %session.mode, minutes, "session recorded");
        Some(Event::SessionRecorded {
            mode: session.mode,
            minutes: session.minutes,
            is_pomodoro_work: session.is_pomodoro_work,
            project: session.project,
            at: session.completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::session::{MemoryStatistics, SilentNotifier};
    use crate::timer::ManualClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FailingSink;

    impl StatisticsSink for FailingSink {
        fn record(&self, _session: &CompletedSession) -> Result<()> {
            Err(CoreError::Collaborator {
                collaborator: "statistics",
                message: "disk full".into(),
            })
        }

        fn record_words(&self, _session: &WordSession) -> Result<()> {
            Err(CoreError::Collaborator {
                collaborator: "statistics",
                message: "disk full".into(),
            })
        }
    }

    impl NotificationSink for FailingSink {
        fn notify(&self, _event: &Event) -> Result<()> {
            Err(CoreError::Collaborator {
                collaborator: "sound",
                message: "no audio device".into(),
            })
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        calls: RefCell<u32>,
    }

    impl NotificationSink for CountingNotifier {
        fn notify(&self, _event: &Event) -> Result<()> {
            *self.calls.borrow_mut() += 1;
            Ok(())
        }
    }

    fn controller(minutes: u32) -> (SessionController<ManualClock>, ManualClock, Rc<MemoryStatistics>) {
        let clock = ManualClock::new(1_700_000_000_000);
        let stats = Rc::new(MemoryStatistics::new());
        let c = SessionController::new(
            CountdownTimer::with_clock(minutes, clock.clone()),
            Box::new(Rc::clone(&stats)),
            Box::new(SilentNotifier),
        );
        (c, clock, stats)
    }

    fn run_to_completion(c: &mut SessionController<ManualClock>, clock: &ManualClock) -> Vec<Event> {
        c.start();
        clock.advance_secs(c.timer().duration_secs());
        c.tick()
    }

    #[test]
    fn validate_minutes_bounds() {
        assert!(validate_minutes(0).is_err());
        assert_eq!(validate_minutes(1), Ok(1));
        assert_eq!(validate_minutes(999), Ok(999));
        assert!(validate_minutes(1000).is_err());
    }

    #[test]
    fn invalid_duration_leaves_timer_untouched() {
        let (mut c, _clock, _stats) = controller(25);
        assert!(c.set_duration(0).is_err());
        assert!(c.set_duration(1000).is_err());
        assert_eq!(c.timer().duration_secs(), 1500);
    }

    #[test]
    fn plain_completion_records_once() {
        let (mut c, clock, stats) = controller(2);
        let events = run_to_completion(&mut c, &clock);
        assert!(matches!(events[0], Event::TimerCompleted { .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SessionRecorded { minutes: 2, is_pomodoro_work: false, .. })));

        clock.advance_secs(30);
        assert!(c.tick().is_empty());
        // Stopping a completed run must not count it again.
        c.stop();
        assert_eq!(stats.len(), 1);
    }

    #[test]
    fn stopped_sub_minute_session_is_not_recorded() {
        let (mut c, clock, stats) = controller(25);
        c.start();
        clock.advance_secs(40);
        c.tick();
        let events = c.stop();
        assert_eq!(events.len(), 1);
        assert!(stats.is_empty());
    }

    #[test]
    fn stopped_session_records_rounded_minutes() {
        let (mut c, clock, stats) = controller(25);
        c.set_project(Some("  Novel  ".into()));
        c.start();
        clock.advance_secs(150);
        c.reset();
        let sessions = stats.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].minutes, 3);
        assert_eq!(sessions[0].project.as_deref(), Some("Novel"));
    }

    #[test]
    fn pomodoro_cycle_drives_timer_durations() {
        let (mut c, clock, stats) = controller(25);
        c.enable_pomodoro();
        let mut phases = vec![c.phase()];
        let mut durations = vec![c.timer().duration_secs() / 60];
        for _ in 0..8 {
            let events = run_to_completion(&mut c, &clock);
            assert!(events.iter().any(|e| matches!(e, Event::PhaseChanged { .. })));
            phases.push(c.phase());
            durations.push(c.timer().duration_secs() / 60);
            assert!(!c.timer().is_running());
        }
        use CyclePhase::*;
        assert_eq!(
            phases,
            vec![Work, ShortBreak, Work, ShortBreak, Work, ShortBreak, Work, LongBreak, Work]
        );
        assert_eq!(durations, vec![25, 5, 25, 5, 25, 5, 25, 15, 25]);

        let cycle = c.cycle().unwrap();
        assert_eq!(cycle.session_index(), 1);
        assert_eq!(cycle.completed_work_sessions(), 0);

        // Only the four work phases are recorded, all as Pomodoro work.
        let sessions = stats.sessions();
        assert_eq!(sessions.len(), 4);
        assert!(sessions.iter().all(|s| s.is_pomodoro_work && s.minutes == 25));
    }

    #[test]
    fn stale_or_repeated_completion_is_ignored() {
        let (mut c, clock, stats) = controller(1);
        let events = run_to_completion(&mut c, &clock);
        let completion = events[0].clone();
        assert!(c.handle_completion(completion.clone()).is_empty());
        assert_eq!(stats.len(), 1);

        c.stop();
        c.start();
        assert!(c.handle_completion(completion).is_empty());
        assert!(c.timer().is_running());
    }

    #[test]
    fn collaborator_failures_do_not_corrupt_state() {
        let clock = ManualClock::new(0);
        let mut c = SessionController::new(
            CountdownTimer::with_clock(1, clock.clone()),
            Box::new(FailingSink),
            Box::new(FailingSink),
        );
        c.enable_pomodoro();
        c.set_pomodoro_config(PomodoroConfig {
            work_minutes: 1,
            ..PomodoroConfig::default()
        })
        .unwrap();
        let events = run_to_completion(&mut c, &clock);
        assert!(!events.iter().any(|e| matches!(e, Event::SessionRecorded { .. })));
        assert_eq!(c.phase(), CyclePhase::ShortBreak);
        assert_eq!(c.timer().duration_secs(), 300);
    }

    #[test]
    fn notifier_called_once_per_completion() {
        let clock = ManualClock::new(0);
        let notifier = Rc::new(CountingNotifier::default());
        let mut c = SessionController::new(
            CountdownTimer::with_clock(1, clock.clone()),
            Box::new(MemoryStatistics::new()),
            Box::new(Rc::clone(&notifier)),
        );
        run_to_completion(&mut c, &clock);
        for _ in 0..5 {
            clock.advance_secs(1);
            c.tick();
        }
        assert_eq!(*notifier.calls.borrow(), 1);
    }

    #[test]
    fn mode_change_sets_default_duration_only_when_idle() {
        let (mut c, clock, _stats) = controller(25);
        c.set_mode(SessionMode::Researching);
        assert_eq!(c.timer().duration_secs(), 45 * 60);

        c.start();
        clock.advance_secs(5);
        assert!(c.set_mode(SessionMode::Creative).is_empty());
        assert_eq!(c.mode(), SessionMode::Creative);
        assert_eq!(c.timer().duration_secs(), 45 * 60);

        c.stop();
        c.enable_pomodoro();
        c.set_mode(SessionMode::Roaming);
        assert_eq!(c.timer().duration_secs(), 25 * 60);
    }

    #[test]
    fn preset_restarts_cycle() {
        let (mut c, clock, _stats) = controller(25);
        c.enable_pomodoro();
        run_to_completion(&mut c, &clock);
        assert_eq!(c.phase(), CyclePhase::ShortBreak);
        c.set_duration(50).unwrap();
        let cycle = c.cycle().unwrap();
        assert_eq!(cycle.phase(), CyclePhase::Work);
        assert_eq!(cycle.session_index(), 1);
        assert_eq!(c.timer().duration_secs(), 50 * 60);
    }

    #[test]
    fn config_change_applies_to_idle_work_phase() {
        let (mut c, _clock, _stats) = controller(25);
        c.enable_pomodoro();
        let config = PomodoroConfig {
            work_minutes: 40,
            ..PomodoroConfig::default()
        };
        c.set_pomodoro_config(config).unwrap();
        assert_eq!(c.timer().duration_secs(), 40 * 60);

        let bad = PomodoroConfig {
            long_break_minutes: 0,
            ..config
        };
        assert!(c.set_pomodoro_config(bad).is_err());
        assert_eq!(c.pomodoro_config().long_break_minutes, 15);
    }

    #[test]
    fn disabling_pomodoro_returns_to_plain_sessions() {
        let (mut c, clock, stats) = controller(25);
        c.enable_pomodoro();
        c.disable_pomodoro();
        assert!(!c.pomodoro_enabled());
        run_to_completion(&mut c, &clock);
        assert!(c.timer().is_completed());
        assert!(!stats.sessions()[0].is_pomodoro_work);
    }

    #[test]
    fn state_round_trips_through_json() {
        let (mut c, clock, _stats) = controller(25);
        c.enable_pomodoro();
        c.set_mode(SessionMode::Creative);
        c.start();
        clock.advance_secs(61);
        c.tick();
        let json = serde_json::to_string(&c.to_state()).unwrap();
        let state: SessionState = serde_json::from_str(&json).unwrap();
        let restored = SessionController::from_state(
            state,
            PomodoroConfig::default(),
            clock.clone(),
            Box::new(MemoryStatistics::new()),
            Box::new(SilentNotifier),
        );
        assert_eq!(restored.timer().elapsed_secs(), 61);
        assert_eq!(restored.mode(), SessionMode::Creative);
        assert!(restored.pomodoro_enabled());
    }

    #[test]
    fn observers_see_ticks_completion_and_phase_changes() {
        #[derive(Default)]
        struct Log(Rc<RefCell<Vec<String>>>);

        impl SessionObserver for Log {
            fn on_tick(&mut self, remaining_secs: u64, _progress_pct: f64) {
                self.0.borrow_mut().push(format!("tick {remaining_secs}"));
            }
            fn on_complete(&mut self, _event: &Event) {
                self.0.borrow_mut().push("complete".into());
            }
            fn on_phase_change(&mut self, from: CyclePhase, to: CyclePhase) {
                self.0.borrow_mut().push(format!("{from}->{to}"));
            }
        }

        let (mut c, clock, _stats) = controller(25);
        let log = Rc::new(RefCell::new(Vec::new()));
        c.add_observer(Box::new(Log(Rc::clone(&log))));
        c.enable_pomodoro();
        c.start();
        clock.advance_secs(1500);
        c.tick();
        c.tick();
        assert_eq!(
            *log.borrow(),
            vec!["tick 0".to_string(), "complete".into(), "work->short_break".into()]
        );
    }

    #[test]
    fn work_completion_records_word_count_once() {
        let (mut c, clock, stats) = controller(1);
        c.set_words_at_start(Some(1_200));
        c.set_word_target(Some(300));
        c.start();
        c.set_words_at_end(Some(1_550));
        clock.advance_secs(60);
        let events = c.tick();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::WordsRecorded {
                words_written: 350,
                goal_achieved: Some(true),
                ..
            }
        )));
        assert_eq!(*c.words(), WordCount::default());

        c.stop();
        let words = stats.word_sessions();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].target_words, Some(300));
    }

    #[test]
    fn starting_a_run_clears_the_closing_count() {
        let (mut c, _clock, _stats) = controller(25);
        c.set_words_at_start(Some(10));
        c.set_words_at_end(Some(99));
        c.start();
        assert_eq!(c.words().at_start, Some(10));
        assert_eq!(c.words().at_end, None);
    }

    #[test]
    fn stopping_a_running_work_session_records_words() {
        let (mut c, clock, stats) = controller(25);
        c.set_words_at_start(Some(0));
        c.start();
        clock.advance_secs(20);
        c.set_words_at_end(Some(120));
        let events = c.stop();
        assert!(events.iter().any(|e| matches!(e, Event::WordsRecorded { words_written: 120, .. })));
        // The timer part was too short to count.
        assert!(stats.is_empty());
        assert_eq!(stats.word_sessions().len(), 1);

        // Stopping an idle timer does not consume entered counts.
        c.set_words_at_start(Some(120));
        c.set_words_at_end(Some(200));
        c.stop();
        assert_eq!(stats.word_sessions().len(), 1);
        assert_eq!(c.words().written(), 80);
    }

    #[test]
    fn break_completion_keeps_word_counts() {
        let (mut c, clock, stats) = controller(25);
        c.enable_pomodoro();
        run_to_completion(&mut c, &clock);
        assert_eq!(c.phase(), CyclePhase::ShortBreak);
        c.set_words_at_start(Some(0));
        c.start();
        c.set_words_at_end(Some(40));
        clock.advance_secs(c.timer().duration_secs());
        c.tick();
        assert!(stats.word_sessions().is_empty());
        assert_eq!(c.words().written(), 40);
    }

    #[test]
    fn failed_word_recording_keeps_counts() {
        let clock = ManualClock::new(0);
        let mut c = SessionController::new(
            CountdownTimer::with_clock(1, clock.clone()),
            Box::new(FailingSink),
            Box::new(SilentNotifier),
        );
        c.set_words_at_start(Some(5));
        c.start();
        c.set_words_at_end(Some(50));
        clock.advance_secs(60);
        let events = c.tick();
        assert!(!events.iter().any(|e| matches!(e, Event::WordsRecorded { .. })));
        assert_eq!(c.words().written(), 45);
    }
}
