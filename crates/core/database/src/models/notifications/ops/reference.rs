use campus_result::Result;

use crate::{Notification, ReferenceDb};

use super::AbstractNotifications;

#[async_trait]
impl AbstractNotifications for ReferenceDb {
    /// Insert a new notification into the database
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        let mut notifications = self.notifications.lock().await;
        if notifications.contains_key(&notification.id) {
            Err(create_database_error!("insert", "notification"))
        } else {
            notifications.insert(notification.id.to_string(), notification.clone());
            Ok(())
        }
    }

    /// Fetch a notification by its id
    async fn fetch_notification(&self, id: &str) -> Result<Notification> {
        let notifications = self.notifications.lock().await;
        notifications
            .get(id)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch a recipient's visible notifications, newest first
    async fn fetch_recent_notifications(
        &self,
        recipient: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>> {
        let notifications = self.notifications.lock().await;
        let mut matched: Vec<Notification> = notifications
            .values()
            .filter(|notification| {
                notification.recipient == recipient && !notification.is_hidden
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.id.cmp(&a.id));
        matched.truncate(limit.unwrap_or(50) as usize);

        Ok(matched)
    }

    /// Mark a notification as read
    async fn mark_notification_read(&self, id: &str) -> Result<()> {
        let mut notifications = self.notifications.lock().await;
        if let Some(notification) = notifications.get_mut(id) {
            notification.is_read = true;
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }

    /// Mark all of a recipient's notifications as read
    async fn mark_all_notifications_read(&self, recipient: &str) -> Result<()> {
        let mut notifications = self.notifications.lock().await;
        for notification in notifications.values_mut() {
            if notification.recipient == recipient {
                notification.is_read = true;
            }
        }

        Ok(())
    }

    /// Dismiss a notification without deleting it
    async fn hide_notification(&self, id: &str) -> Result<()> {
        let mut notifications = self.notifications.lock().await;
        if let Some(notification) = notifications.get_mut(id) {
            notification.is_hidden = true;
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
