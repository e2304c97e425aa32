//! Operator notification for conditions that need a human's attention

use std::io::Write;

/// Capability used to flag terminal or restricted conditions
pub trait Notifier: Send + Sync {
    fn alert(&self, reason: &str);
}

/// Rings the terminal bell on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn alert(&self, reason: &str) {
        tracing::trace!("Alert: {}", reason);
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

/// Discards alerts; used with `--no-bell`
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn alert(&self, reason: &str) {
        tracing::trace!("Alert (silenced): {}", reason);
    }
}
