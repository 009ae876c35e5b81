use campus_result::Result;

use crate::Notification;

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractNotifications: Sync + Send {
    /// Insert a new notification into the database
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;

    /// Fetch a notification by its id
    async fn fetch_notification(&self, id: &str) -> Result<Notification>;

    /// Fetch a recipient's visible notifications, newest first
    async fn fetch_recent_notifications(
        &self,
        recipient: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>>;

    /// Mark a notification as read
    async fn mark_notification_read(&self, id: &str) -> Result<()>;

    /// Mark all of a recipient's notifications as read
    async fn mark_all_notifications_read(&self, recipient: &str) -> Result<()>;

    /// Dismiss a notification without deleting it
    async fn hide_notification(&self, id: &str) -> Result<()>;
}
