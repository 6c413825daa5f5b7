//! Periodic eviction of participants that stopped sending heartbeats.

use anyhow::Context;
use sqlx::SqlitePool;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

use crate::{
    clock::SharedClock,
    config::SweepConfig,
    db::{self, Message, LEAVE_NOTICE},
};

pub struct Sweeper {
    db_pool: SqlitePool,
    clock: SharedClock,
    config: SweepConfig,
}

impl Sweeper {
    pub fn new(db_pool: SqlitePool, clock: SharedClock, config: SweepConfig) -> Sweeper {
        Sweeper { db_pool, clock, config }
    }

    /// One tick. Returns the names that were evicted.
    pub async fn sweep(&self) -> anyhow::Result<Vec<String>> {
        let now = self.clock.now();
        let window = i64::try_from(self.config.inactivity_window.as_millis()).unwrap_or(i64::MAX);
        let cutoff = db::unix_millis(now).saturating_sub(window);

        let stale = db::participants::find_stale(&self.db_pool, cutoff)
            .await
            .context("looking up inactive participants")?;
        if stale.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = stale.into_iter().map(|p| p.name).collect();
        db::participants::delete_many(&self.db_pool, &names)
            .await
            .context("removing inactive participants")?;

        let notices = names
            .iter()
            .map(|name| Message::status(name, LEAVE_NOTICE, now))
            .collect::<Result<Vec<_>, _>>()?;
        db::messages::insert_many(&self.db_pool, &notices)
            .await
            .context("posting departure notices")?;

        Ok(names)
    }

    /// Ticks every `interval`, first one a full interval after start, until
    /// `shutdown` flips to true or its sender goes away.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            match self.sweep().await {
                Ok(evicted) if evicted.is_empty() => tracing::trace!("sweep: nobody inactive"),
                Ok(evicted) => tracing::info!(count = evicted.len(), names = ?evicted, "evicted inactive participants"),
                Err(err) => tracing::error!(error = ?err, "sweep tick abandoned"),
            }
        }

        tracing::debug!("sweeper stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
