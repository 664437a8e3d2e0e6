use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::handle::WatchdogHandle;
use crate::config::{Config, ExpiryAction};
use crate::error::{RuntimeError, WatchdogError};
use crate::events::{Bus, Event, EventKind};

/// Deadline monitor for registered tasks.
#[derive(Debug)]
pub struct Watchdog {
    timeout: Duration,
    check_interval: Duration,
    action: ExpiryAction,
    epoch: Instant,
    entries: RwLock<HashMap<String, Arc<AtomicU64>>>,
    bus: Bus,
}

impl Watchdog {
    /// Configures the watchdog from `cfg` and publishes `WatchdogInitialized`.
    pub fn init(cfg: &Config, bus: Bus) -> Arc<Self> {
        let wd = Arc::new(Self {
            timeout: cfg.watchdog_timeout,
            check_interval: cfg.check_interval(),
            action: cfg.expiry_action,
            epoch: Instant::now(),
            entries: RwLock::new(HashMap::new()),
            bus,
        });
        wd.bus
            .publish(Event::new(EventKind::WatchdogInitialized).with_timeout(wd.timeout));
        wd
    }

    /// Configured deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Registers `name`; its deadline starts now.
    pub async fn register(
        self: &Arc<Self>,
        name: impl Into<Arc<str>>,
    ) -> Result<WatchdogHandle, WatchdogError> {
        let name: Arc<str> = name.into();
        let last_reset = Arc::new(AtomicU64::new(self.now_ms()));

        {
            let mut entries = self.entries.write().await;
            if entries.contains_key(name.as_ref()) {
                return Err(WatchdogError::AlreadyRegistered(name.to_string()));
            }
            entries.insert(name.to_string(), Arc::clone(&last_reset));
        }

        self.bus
            .publish(Event::new(EventKind::WatchdogRegistered).with_task(Arc::clone(&name)));
        Ok(WatchdogHandle {
            name,
            last_reset,
            watchdog: Arc::clone(self),
        })
    }

    /// Returns true if `name` is currently watched.
    pub async fn is_registered(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }

    /// Returns sorted list of watched task names.
    pub async fn registered(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().await.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Time since `name` last reset, or `None` if it is not watched.
    pub async fn since_reset(&self, name: &str) -> Option<Duration> {
        let last = self.entries.read().await.get(name)?.load(Ordering::Acquire);
        Some(Duration::from_millis(self.now_ms().saturating_sub(last)))
    }

    /// Scans registrations every check interval until `token` is cancelled.
    ///
    /// On a missed deadline publishes `WatchdogExpired`, then:
    /// - [`ExpiryAction::Panic`] panics (unrecoverable fault);
    /// - [`ExpiryAction::Shutdown`] returns [`RuntimeError::WatchdogExpired`].
    pub async fn monitor(&self, token: CancellationToken) -> Result<(), RuntimeError> {
        let mut ticker = time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            let Some((task, elapsed)) = self.overdue().await else {
                continue;
            };
            self.bus.publish(
                Event::new(EventKind::WatchdogExpired)
                    .with_task(task.as_str())
                    .with_elapsed(elapsed)
                    .with_timeout(self.timeout),
            );
            match self.action {
                ExpiryAction::Panic => {
                    panic!("watchdog: task {task} silent for {elapsed:?} (timeout {:?})", self.timeout)
                }
                ExpiryAction::Shutdown => {
                    return Err(RuntimeError::WatchdogExpired {
                        task,
                        elapsed,
                        timeout: self.timeout,
                    });
                }
            }
        }
    }

    /// Most overdue registration, if any exceeded the deadline.
    async fn overdue(&self) -> Option<(String, Duration)> {
        let now = self.now_ms();
        let limit = self.timeout.as_millis().min(u128::from(u64::MAX)) as u64;

        self.entries
            .read()
            .await
            .iter()
            .map(|(name, last)| (name, now.saturating_sub(last.load(Ordering::Acquire))))
            .filter(|(_, elapsed)| *elapsed > limit)
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, elapsed)| (name.clone(), Duration::from_millis(elapsed)))
    }

    pub(super) async fn remove(&self, handle: &WatchdogHandle) -> Result<(), WatchdogError> {
        {
            let mut entries = self.entries.write().await;
            match entries.get(handle.name()) {
                Some(cell) if Arc::ptr_eq(cell, &handle.last_reset) => {
                    entries.remove(handle.name());
                }
                _ => return Err(WatchdogError::NotRegistered(handle.name().to_string())),
            }
        }
        self.bus.publish(
            Event::new(EventKind::WatchdogDeregistered).with_task(Arc::clone(&handle.name)),
        );
        Ok(())
    }

    pub(super) fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
    }
}
