//! User notification surface.
//!
//! Injected wherever a message must reach the user, so the loop and the
//! startup path never touch a global dialog handle and tests can run
//! headless.

/// Modal acknowledgment surface for startup errors and attendance events.
/// Both calls block until the user dismisses the dialog.
pub trait Notifier {
    fn alert(&self, title: &str, message: &str);
    fn info(&self, title: &str, message: &str);
}

/// Desktop dialog boxes via `rfd`.
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn alert(&self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }

    fn info(&self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// Headless fallback (`--quiet`): notifications go to the log instead of
/// pausing the loop on a dialog.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, title: &str, message: &str) {
        tracing::error!(title, "{message}");
    }

    fn info(&self, title: &str, message: &str) {
        tracing::info!(title, "{message}");
    }
}
