//! Delivery boundary for chosen announcements.
//!
//! The core decides *what* to emit; a [`Dispatcher`] decides how it reaches
//! connected recipients. Transports (chat bridge, game server, mesh radio)
//! implement the trait. The crate ships [`LogDispatcher`], which writes
//! announcements to the log so the daemon is observable without any
//! transport wired up.

use log::info;

use crate::announcer::Announcement;
use crate::logutil::escape_log;

/// Presentation decisions the core resolves for the dispatcher.
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    /// Prepended to the first line only, when `use_prefix` is set.
    pub prefix: String,
    pub use_prefix: bool,
}

/// Delivers one resolved announcement to every connected recipient.
///
/// `announcement.sound` is already gated by the core: when present, the
/// dispatcher should play the cue near each recipient; when `None`, no
/// sound regardless of configuration.
pub trait Dispatcher {
    fn deliver(&mut self, announcement: &Announcement, options: &DeliveryOptions);
}

/// Dispatcher that logs each line instead of transmitting it.
pub struct LogDispatcher;

impl Dispatcher for LogDispatcher {
    fn deliver(&mut self, announcement: &Announcement, options: &DeliveryOptions) {
        for (i, line) in announcement.lines.iter().enumerate() {
            if i == 0 && options.use_prefix {
                info!("announce: {}{}", options.prefix, escape_log(line));
            } else {
                info!("announce: {}", escape_log(line));
            }
        }
        if let Some(sound) = &announcement.sound {
            info!("announce: sound cue '{}'", escape_log(sound));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Captures delivered announcements for assertions.
    pub struct RecordingDispatcher {
        pub delivered: Vec<(Vec<String>, Option<String>)>,
    }

    impl Dispatcher for RecordingDispatcher {
        fn deliver(&mut self, announcement: &Announcement, _options: &DeliveryOptions) {
            self.delivered
                .push((announcement.lines.clone(), announcement.sound.clone()));
        }
    }

    #[test]
    fn recording_dispatcher_sees_resolved_announcement() {
        let mut dispatcher = RecordingDispatcher { delivered: vec![] };
        let announcement = Announcement {
            lines: vec!["one".into(), "two".into()],
            sound: Some("bell".into()),
        };
        let options = DeliveryOptions {
            prefix: "[AA] ".into(),
            use_prefix: true,
        };
        dispatcher.deliver(&announcement, &options);
        assert_eq!(dispatcher.delivered.len(), 1);
        assert_eq!(dispatcher.delivered[0].1.as_deref(), Some("bell"));
    }
}
