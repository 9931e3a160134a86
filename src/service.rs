//! Scheduler loop tying the announcer core to a dispatcher.
//!
//! One tokio interval drives the whole system. Each tick takes the shared
//! announcer lock, runs a selection pass, and hands any chosen announcement
//! to the dispatcher. Management operations (add/edit/delete from another
//! task) go through the same lock, so a snapshot-then-mutate selection pass
//! is never interleaved with an index-shifting edit.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::announcer::Announcer;
use crate::dispatch::{DeliveryOptions, Dispatcher};

/// Shared handle to the announcer; management surfaces clone this.
pub type SharedAnnouncer = Arc<Mutex<Announcer>>;

/// Run the announcement loop until ctrl-c.
///
/// The first emission happens one full interval after startup, matching the
/// cadence a recipient would expect from a freshly restarted daemon.
pub async fn run<D: Dispatcher>(
    announcer: SharedAnnouncer,
    mut dispatcher: D,
    interval: Duration,
    options: DeliveryOptions,
) -> Result<()> {
    info!(
        "Announcement loop started (every {}s)",
        interval.as_secs()
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick fires immediately; consume it so emissions
    // start one period in.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let chosen = announcer.lock().await.tick();
                match chosen {
                    Some(announcement) => dispatcher.deliver(&announcement, &options),
                    None => debug!("Nothing to announce this tick"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received; stopping announcement loop");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcer::{Announcement, MessageStore};
    use crate::config::Config;
    use tempfile::TempDir;

    struct CountingDispatcher {
        seen: Arc<std::sync::Mutex<Vec<Announcement>>>,
    }

    impl Dispatcher for CountingDispatcher {
        fn deliver(&mut self, announcement: &Announcement, _options: &DeliveryOptions) {
            self.seen.lock().unwrap().push(announcement.clone());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loop_emits_once_per_interval() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = Config::default();
        config.announcements = vec![crate::config::StaticAnnouncement {
            lines: vec!["tick".to_string()],
            sound: None,
        }];
        let announcer = Arc::new(Mutex::new(Announcer::new(
            &config,
            MessageStore::new(dir.path()),
        )));

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let handle = tokio::spawn(run(
            announcer.clone(),
            CountingDispatcher { seen: seen.clone() },
            Duration::from_secs(60),
            DeliveryOptions {
                prefix: String::new(),
                use_prefix: false,
            },
        ));

        // Nothing before the first interval elapses, then one per interval.
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(seen.lock().unwrap().is_empty());
        tokio::time::sleep(Duration::from_secs(126)).await;
        handle.abort();

        let delivered = seen.lock().unwrap();
        assert_eq!(delivered.len(), 3);
        assert_eq!(delivered[0].lines, vec!["tick".to_string()]);
    }
}
