//! A running meditation session.
//!
//! [`ActiveSession`] owns the two periodic tasks of a session: the one-second
//! countdown and the faster breathing animation. Both share one
//! [`SessionRuntime`] behind a mutex. Every exit path (natural completion,
//! [`ActiveSession::end`], or dropping the handle) goes through the same
//! teardown, which aborts both tasks and rewinds the breathing guide.

use crate::breath::{BreathCycler, BreathSnapshot};
use crate::clock::{early_end_minutes, ClockTick, SessionClock};
use crate::{Error, Result, SessionConfig, SessionOutcome, TechniqueCatalog};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use uuid::Uuid;

const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Events reported by the countdown task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Tick { seconds_remaining: u32 },
    /// Sent once, right after the tick that reaches zero
    Completed { elapsed_minutes: u32 },
}

/// State shared between the session handle and its timer tasks
#[derive(Debug)]
pub struct SessionRuntime {
    pub clock: SessionClock,
    pub breath: BreathCycler,
}

type SharedRuntime = Arc<Mutex<SessionRuntime>>;

fn lock(runtime: &Mutex<SessionRuntime>) -> MutexGuard<'_, SessionRuntime> {
    runtime.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ActiveSession {
    id: Uuid,
    config: SessionConfig,
    runtime: SharedRuntime,
    tasks: Vec<JoinHandle<()>>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl ActiveSession {
    /// Start a session: the countdown and the breathing guide begin together
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: SessionConfig, catalog: &TechniqueCatalog) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| Error::Other(format!("session timers need a Tokio runtime: {}", e)))?;
        let technique = catalog.require(config.technique_id())?;

        let mut clock = SessionClock::new();
        clock.start(config.total_seconds());
        let mut breath = BreathCycler::new(technique.clone())?;
        breath.set_active(true);

        let runtime = Arc::new(Mutex::new(SessionRuntime { clock, breath }));
        let (tx, events) = mpsc::unbounded_channel();

        let tasks = vec![
            handle.spawn(run_clock(runtime.clone(), tx)),
            handle.spawn(run_breath(runtime.clone())),
        ];

        let id = Uuid::new_v4();
        tracing::info!(
            session_id = %id,
            minutes = config.minutes(),
            technique = config.technique_id(),
            "Meditation session started"
        );

        Ok(Self {
            id,
            config,
            runtime,
            tasks,
            events,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Wait for the next countdown event
    ///
    /// Returns `None` once the countdown has finished or been torn down.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Whether the countdown is still running
    pub fn is_active(&self) -> bool {
        lock(&self.runtime).clock.is_running()
    }

    pub fn seconds_remaining(&self) -> u32 {
        lock(&self.runtime).clock.seconds_remaining()
    }

    pub fn countdown_label(&self) -> String {
        lock(&self.runtime).clock.countdown_label()
    }

    pub fn breath(&self) -> BreathSnapshot {
        lock(&self.runtime).breath.snapshot()
    }

    /// Number of timer tasks that have not exited yet
    pub fn timers_running(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Finish the session and work out its credit
    ///
    /// A session whose countdown reached zero earns its configured minutes.
    /// Anything shorter earns whole elapsed minutes, at least one.
    pub fn end(mut self) -> SessionOutcome {
        let outcome = {
            let runtime = lock(&self.runtime);
            if runtime.clock.is_completed() {
                SessionOutcome {
                    minutes_credited: self.config.minutes(),
                    completed: true,
                }
            } else {
                SessionOutcome {
                    minutes_credited: early_end_minutes(runtime.clock.seconds_elapsed()),
                    completed: false,
                }
            }
        };

        self.teardown();
        tracing::info!(
            session_id = %self.id,
            minutes = outcome.minutes_credited,
            completed = outcome.completed,
            "Meditation session ended"
        );
        outcome
    }

    fn teardown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        let mut runtime = lock(&self.runtime);
        runtime.clock.stop();
        runtime.breath.set_active(false);
    }

    #[cfg(test)]
    fn liveness(&self) -> std::sync::Weak<Mutex<SessionRuntime>> {
        Arc::downgrade(&self.runtime)
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            tracing::debug!(session_id = %self.id, "Tearing down dropped session");
            self.teardown();
        }
    }
}

async fn run_clock(runtime: SharedRuntime, events: mpsc::UnboundedSender<SessionEvent>) {
    let mut interval = time::interval_at(time::Instant::now() + CLOCK_PERIOD, CLOCK_PERIOD);

    loop {
        interval.tick().await;

        let tick = {
            let mut guard = lock(&runtime);
            let tick = guard.clock.tick();
            if let Some(ClockTick {
                completed: Some(_), ..
            }) = tick
            {
                guard.breath.set_active(false);
            }
            tick
        };

        let Some(tick) = tick else {
            break;
        };

        // The receiver may be gone if the handle is mid-teardown
        let _ = events.send(SessionEvent::Tick {
            seconds_remaining: tick.seconds_remaining,
        });

        if let Some(elapsed_minutes) = tick.completed {
            tracing::debug!("Countdown reached zero");
            let _ = events.send(SessionEvent::Completed { elapsed_minutes });
            break;
        }
    }
}

async fn run_breath(runtime: SharedRuntime) {
    loop {
        let period = {
            let guard = lock(&runtime);
            if !guard.breath.is_active() {
                break;
            }
            guard.breath.tick_interval()
        };

        time::sleep(period).await;

        let advanced = lock(&runtime).breath.tick();
        if !advanced {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;

    fn start(minutes: u32, technique: &str) -> ActiveSession {
        crate::logging::init_test();
        let config = SessionConfig::new(minutes, technique).unwrap();
        ActiveSession::start(config, get_default_catalog()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_runs_to_completion() {
        let mut session = start(1, "calm");
        assert!(session.is_active());
        assert_eq!(session.countdown_label(), "01:00");

        let mut ticks = Vec::new();
        let mut completions = Vec::new();
        while let Some(event) = session.next_event().await {
            match event {
                SessionEvent::Tick { seconds_remaining } => ticks.push(seconds_remaining),
                SessionEvent::Completed { elapsed_minutes } => completions.push(elapsed_minutes),
            }
        }

        assert_eq!(ticks, (0..60u32).rev().collect::<Vec<u32>>());
        assert_eq!(completions, vec![1]);
        assert!(!session.is_active());

        // Completion rewinds the breathing guide and lets its task exit
        let breath = session.breath();
        assert_eq!(breath.phase_index, 0);
        assert_eq!(breath.progress_percent, 0);
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(session.timers_running(), 0);

        let outcome = session.end();
        assert_eq!(
            outcome,
            SessionOutcome {
                minutes_credited: 1,
                completed: true
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_breath_cycles_while_active() {
        let session = start(1, "calm");

        time::sleep(Duration::from_millis(4500)).await;
        let breath = session.breath();
        assert_eq!(breath.phase_index, 1);
        assert_eq!(breath.label, "Hold");
        assert_eq!(session.seconds_remaining(), 56);
        assert_eq!(session.timers_running(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_end_credits_at_least_one_minute() {
        let session = start(5, "box");
        time::sleep(Duration::from_millis(10_500)).await;

        let outcome = session.end();
        assert_eq!(
            outcome,
            SessionOutcome {
                minutes_credited: 1,
                completed: false
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_end_credits_whole_minutes() {
        let session = start(5, "478");
        time::sleep(Duration::from_millis(150_500)).await;
        assert_eq!(session.end().minutes_credited, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_releases_both_timers() {
        let session = start(10, "calm");
        time::sleep(Duration::from_millis(9_300)).await;
        assert_ne!(session.breath().phase_index, 0);

        let runtime = session.liveness();
        session.end();

        // Aborted tasks release the shared runtime once the scheduler runs
        tokio::task::yield_now().await;
        time::sleep(Duration::from_millis(1)).await;
        assert!(runtime.upgrade().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_both_timers() {
        let session = start(20, "box");
        time::sleep(Duration::from_millis(2_500)).await;
        let runtime = session.liveness();

        {
            let shared = runtime.upgrade().unwrap();
            let guard = lock(&shared);
            assert!(guard.clock.is_running());
            assert!(guard.breath.is_active());
        }

        drop(session);
        tokio::task::yield_now().await;
        time::sleep(Duration::from_millis(1)).await;
        assert!(runtime.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_unknown_technique_is_rejected() {
        let config = SessionConfig::new(10, "wim_hof").unwrap();
        let result = ActiveSession::start(config, get_default_catalog());
        assert!(matches!(result, Err(Error::InvalidSession(_))));
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let config = SessionConfig::new(10, "calm").unwrap();
        let result = ActiveSession::start(config, get_default_catalog());
        assert!(matches!(result, Err(Error::Other(_))));
    }
}
