use bson::Document;
use mongodb::options::FindOptions;

use campus_result::Result;

use crate::{MongoDb, Notification};

use super::AbstractNotifications;

static COL: &str = "notifications";

#[async_trait]
impl AbstractNotifications for MongoDb {
    /// Insert a new notification into the database
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        query!(self, insert_one, COL, &notification).map(|_| ())
    }

    /// Fetch a notification by its id
    async fn fetch_notification(&self, id: &str) -> Result<Notification> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch a recipient's visible notifications, newest first
    async fn fetch_recent_notifications(
        &self,
        recipient: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>> {
        self.find_with_options(
            COL,
            doc! {
                "recipient": recipient,
                "is_hidden": {
                    "$ne": true
                }
            },
            FindOptions::builder()
                .limit(limit.unwrap_or(50))
                .sort(doc! {
                    "_id": -1_i32
                })
                .build(),
        )
        .await
        .map_err(|_| create_database_error!("find", COL))
    }

    /// Mark a notification as read
    async fn mark_notification_read(&self, id: &str) -> Result<()> {
        let result = self
            .col::<Document>(COL)
            .update_one(
                doc! {
                    "_id": id
                },
                doc! {
                    "$set": {
                        "is_read": true
                    }
                },
            )
            .await
            .map_err(|_| create_database_error!("update_one", COL))?;

        if result.matched_count == 0 {
            Err(create_error!(NotFound))
        } else {
            Ok(())
        }
    }

    /// Mark all of a recipient's notifications as read
    async fn mark_all_notifications_read(&self, recipient: &str) -> Result<()> {
        self.col::<Document>(COL)
            .update_many(
                doc! {
                    "recipient": recipient
                },
                doc! {
                    "$set": {
                        "is_read": true
                    }
                },
            )
            .await
            .map(|_| ())
            .map_err(|_| create_database_error!("update_many", COL))
    }

    /// Dismiss a notification without deleting it
    async fn hide_notification(&self, id: &str) -> Result<()> {
        let result = self
            .col::<Document>(COL)
            .update_one(
                doc! {
                    "_id": id
                },
                doc! {
                    "$set": {
                        "is_hidden": true
                    }
                },
            )
            .await
            .map_err(|_| create_database_error!("update_one", COL))?;

        if result.matched_count == 0 {
            Err(create_error!(NotFound))
        } else {
            Ok(())
        }
    }
}
