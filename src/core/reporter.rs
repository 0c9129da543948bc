//! User-facing output channels.
//!
//! Build and watch code reports progress through the [`Reporter`] trait
//! rather than printing directly, so the engine can run quietly inside the
//! watch loop and tests can capture what would have been printed.
//!
//! [`ConsoleReporter`] is the default implementation: a `dpm` badge followed
//! by the message in the channel's color. The debug channel is off unless
//! `--verbose` was given or `DPM_DEBUG=1` is set.

use colored::Colorize;
use std::sync::Mutex;

use crate::constants::DEBUG_ENV_VAR;

/// Output capability handed to the build engine and watch loop.
pub trait Reporter: Send + Sync {
    /// Progress and status messages.
    fn info(&self, msg: &str);
    /// Recoverable problems, e.g. a dependency that was skipped.
    fn warn(&self, msg: &str);
    /// Failures surfaced to the user.
    fn error(&self, msg: &str);
    /// Completed operations.
    fn success(&self, msg: &str);
    /// Diagnostics, gated by verbosity.
    fn debug(&self, msg: &str);
}

/// Styled console reporter backed by ANSI colors.
pub struct ConsoleReporter {
    verbose: bool,
    quiet: bool,
}

impl ConsoleReporter {
    /// Create a reporter. `verbose` opens the debug channel, `quiet`
    /// silences everything except warnings and errors.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    fn badge() -> String {
        format!(
            "{} {}",
            " dpm ".bold().truecolor(218, 170, 149).on_truecolor(69, 70, 79),
            "›".truecolor(167, 167, 167)
        )
    }

    fn debug_enabled(&self) -> bool {
        self.verbose || std::env::var(DEBUG_ENV_VAR).is_ok_and(|v| v == "1" || v == "true")
    }
}

impl Reporter for ConsoleReporter {
    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", Self::badge(), msg.truecolor(88, 166, 255));
        }
    }

    fn warn(&self, msg: &str) {
        println!("{} {}", Self::badge(), msg.truecolor(255, 211, 61));
    }

    fn error(&self, msg: &str) {
        eprintln!("{} {}", Self::badge(), msg.truecolor(255, 106, 106));
    }

    fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", Self::badge(), msg.truecolor(63, 185, 80));
        }
    }

    fn debug(&self, msg: &str) {
        if self.debug_enabled() {
            println!("{} {}", Self::badge(), msg.truecolor(179, 146, 240));
        }
    }
}

/// Reporter channel, for captured messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Info,
    Warn,
    Error,
    Success,
    Debug,
}

/// Reporter that records messages instead of printing them.
///
/// Used by tests to assert on warnings and by any embedding that wants to
/// collect build output programmatically.
#[derive(Default)]
pub struct MemoryReporter {
    messages: Mutex<Vec<(Channel, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages in emission order.
    pub fn messages(&self) -> Vec<(Channel, String)> {
        self.messages.lock().expect("reporter lock poisoned").clone()
    }

    /// Captured messages on one channel.
    pub fn channel(&self, channel: Channel) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, channel: Channel, msg: &str) {
        self.messages
            .lock()
            .expect("reporter lock poisoned")
            .push((channel, msg.to_string()));
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, msg: &str) {
        self.push(Channel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Channel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Channel::Error, msg);
    }

    fn success(&self, msg: &str) {
        self.push(Channel::Success, msg);
    }

    fn debug(&self, msg: &str) {
        self.push(Channel::Debug, msg);
    }
}
