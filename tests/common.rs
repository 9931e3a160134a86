//! Test utilities & fixtures shared by the integration tests.

use announcerd::config::{Config, StaticAnnouncement};

/// Build a config with the given single-line static announcements and
/// round-robin selection. Tests flip `settings.random` themselves when they
/// need the other mode.
pub fn config_with_statics(statics: &[&str]) -> Config {
    let mut config = Config::default();
    config.announcements = statics
        .iter()
        .map(|s| StaticAnnouncement {
            lines: vec![s.to_string()],
            sound: None,
        })
        .collect();
    config.settings.random = false;
    config.settings.sound = None;
    config
}

/// Collect the first line of each item in a pool snapshot, in order.
#[allow(dead_code)] // Not every integration test binary uses this helper.
pub fn first_lines(pool: &[announcerd::announcer::PoolItem]) -> Vec<String> {
    pool.iter().map(|item| item.lines[0].clone()).collect()
}
