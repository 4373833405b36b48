//! Notification collaborator seam.
//!
//! The core calls the notifier at most once per unlock event; delivery
//! guarantees (push, email, retries) are the implementor's concern.

/// Delivers achievement unlock notifications to the user.
pub trait Notifier: Send + Sync {
    /// Announce one unlock. Called at most once per (user, achievement).
    fn notify(
        &self,
        user_id: &str,
        achievement_key: &str,
        title: &str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Ships unlock events to the tracing pipeline.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        user_id: &str,
        achievement_key: &str,
        title: &str,
        _message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(user_id, achievement_key, title, "achievement unlocked");
        Ok(())
    }
}

/// Discards everything. For tools that must not deliver.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(
        &self,
        _user_id: &str,
        _achievement_key: &str,
        _title: &str,
        _message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
