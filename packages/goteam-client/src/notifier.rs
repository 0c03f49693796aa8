use goteam_core::notify::Notifier;

/// Notifier for headless use: every message goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        log::warn!("[goteam.notify] {} {}", title, message);
    }
}
