//! The task that drives a [`TimerEngine`].
//!
//! One tokio task owns the engine and multiplexes everything that can mutate
//! it: commands from [`TimerHandle`]s, the one-second decrement ticker, the
//! periodic reconciliation interval and the auto-start delay. Because only
//! this task touches the engine, a tick and a reconciliation can never
//! interleave.
//!
//! The ticker and the auto-start sleep are armed for a specific engine
//! generation and re-armed whenever the engine's generation moves on.

use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};

use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::settings::SettingsPatch;
use crate::stats::Statistics;
use crate::timer::TimerEngine;

/// A projection of engine state. Rendered after every handled command and
/// every timer callback.
pub trait View: Send {
    fn render(&mut self, snapshot: &Event);

    /// Called for each event before the following `render`.
    fn on_event(&mut self, _event: &Event) {}
}

enum Command {
    Toggle,
    Reset,
    UpdateWorkDuration {
        minutes: u32,
        reply: oneshot::Sender<Result<(), ValidationError>>,
    },
    UpdateSettings {
        patch: SettingsPatch,
        reply: oneshot::Sender<Result<(), ValidationError>>,
    },
    TestNotification,
    VisibilityRegained,
    FocusRegained,
    Snapshot(oneshot::Sender<Event>),
    Stats(oneshot::Sender<Statistics>),
    Shutdown,
}

/// Cloneable front door to a running [`TimerService`].
#[derive(Clone)]
pub struct TimerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl TimerHandle {
    pub fn toggle_timer(&self) {
        self.send(Command::Toggle);
    }

    pub fn reset_timer(&self) {
        self.send(Command::Reset);
    }

    pub fn test_notification(&self) {
        self.send(Command::TestNotification);
    }

    pub fn visibility_regained(&self) {
        self.send(Command::VisibilityRegained);
    }

    pub fn focus_regained(&self) {
        self.send(Command::FocusRegained);
    }

    /// Stop the service. The running session, if any, stays persisted.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    pub async fn update_work_duration(&self, minutes: u32) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::UpdateWorkDuration { minutes, reply });
        Ok(rx.await.map_err(|_| CoreError::ServiceStopped)??)
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::UpdateSettings { patch, reply });
        Ok(rx.await.map_err(|_| CoreError::ServiceStopped)??)
    }

    pub async fn snapshot(&self) -> Result<Event> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply));
        rx.await.map_err(|_| CoreError::ServiceStopped)
    }

    pub async fn get_stats(&self) -> Result<Statistics> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stats(reply));
        rx.await.map_err(|_| CoreError::ServiceStopped)
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            tracing::debug!("timer service already stopped");
        }
    }
}

pub struct TimerService<V> {
    engine: TimerEngine,
    view: V,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl<V: View + 'static> TimerService<V> {
    pub fn new(engine: TimerEngine, view: V) -> (Self, TimerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { engine, view, rx }, TimerHandle { tx })
    }

    /// Spawn the service on the current runtime. The join handle yields the
    /// engine back once the service stops.
    pub fn spawn(engine: TimerEngine, view: V) -> (TimerHandle, JoinHandle<TimerEngine>) {
        let (service, handle) = Self::new(engine, view);
        (handle, tokio::spawn(service.run()))
    }

    pub async fn run(mut self) -> TimerEngine {
        let timing = self.engine.timing().clone();
        let tick_period = timing.tick_interval();
        let reconcile_period = timing.reconcile_interval();

        let mut reconcile = time::interval_at(Instant::now() + reconcile_period, reconcile_period);
        reconcile.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticker: Option<(u64, Interval)> = None;
        let mut auto_start: Option<(u64, Pin<Box<Sleep>>)> = None;

        self.publish(Vec::new());

        loop {
            self.arm_ticker(&mut ticker, tick_period);
            self.arm_auto_start(&mut auto_start);

            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                generation = next_tick(&mut ticker) => {
                    let events = self.engine.on_tick(generation);
                    self.publish(events);
                }
                _ = reconcile.tick() => {
                    let events = self.engine.reconcile();
                    self.publish(events);
                }
                generation = auto_start_due(&mut auto_start) => {
                    auto_start = None;
                    let events = self.engine.fire_auto_start(generation).into_iter().collect();
                    self.publish(events);
                }
            }
        }

        tracing::debug!("timer service stopped");
        self.engine
    }

    fn handle(&mut self, command: Command) {
        let events = match command {
            Command::Toggle => self.engine.toggle_timer().into_iter().collect(),
            Command::Reset => self.engine.reset().into_iter().collect(),
            Command::UpdateWorkDuration { minutes, reply } => {
                match self.engine.update_work_duration(minutes) {
                    Ok(event) => {
                        let _ = reply.send(Ok(()));
                        vec![event]
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        Vec::new()
                    }
                }
            }
            Command::UpdateSettings { patch, reply } => match self.engine.update_settings(&patch) {
                Ok(event) => {
                    let _ = reply.send(Ok(()));
                    vec![event]
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    Vec::new()
                }
            },
            Command::TestNotification => {
                self.engine.test_notification();
                Vec::new()
            }
            Command::VisibilityRegained => self.engine.visibility_regained(),
            Command::FocusRegained => self.engine.focus_regained(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
                return;
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.engine.get_stats().clone());
                return;
            }
            Command::Shutdown => return,
        };
        self.publish(events);
    }

    fn publish(&mut self, events: Vec<Event>) {
        for event in &events {
            self.view.on_event(event);
        }
        let snapshot = self.engine.snapshot();
        self.view.render(&snapshot);
    }

    fn arm_ticker(&self, ticker: &mut Option<(u64, Interval)>, period: Duration) {
        let wanted = self.engine.loop_generation();
        if ticker.as_ref().map(|(generation, _)| *generation) == wanted {
            return;
        }
        *ticker = wanted.map(|generation| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // Suspension shows up as drift for reconciliation, not a burst of ticks.
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            (generation, interval)
        });
    }

    fn arm_auto_start(&self, slot: &mut Option<(u64, Pin<Box<Sleep>>)>) {
        let wanted = self.engine.pending_start();
        if slot.as_ref().map(|(generation, _)| *generation) == wanted.map(|p| p.generation) {
            return;
        }
        *slot = wanted.map(|pending| (pending.generation, Box::pin(time::sleep(pending.delay))));
    }
}

async fn next_tick(ticker: &mut Option<(u64, Interval)>) -> u64 {
    match ticker {
        Some((generation, interval)) => {
            interval.tick().await;
            *generation
        }
        None => std::future::pending().await,
    }
}

async fn auto_start_due(slot: &mut Option<(u64, Pin<Box<Sleep>>)>) -> u64 {
    match slot {
        Some((generation, sleep)) => {
            sleep.as_mut().await;
            *generation
        }
        None => std::future::pending().await,
    }
}
