/// User-visible, non-blocking messages (toasts in the browser UI).
///
/// The board context reports recoverable failures here; the UI layer decides
/// how to render them.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}
