use campus_result::Result;
use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::Database;

auto_derived!(
    /// Notification delivered to a single user
    ///
    /// Records are produced by external event producers and expire 30 days
    /// after creation through a storage-level time-to-live index.
    pub struct Notification {
        /// Unique Id
        #[serde(rename = "_id")]
        pub id: String,
        /// Id of the user receiving this notification
        pub recipient: String,
        /// Id of the user whose action produced this notification
        #[serde(skip_serializing_if = "Option::is_none")]
        pub actor: Option<String>,

        /// What happened
        pub kind: NotificationKind,
        /// Record this notification points at
        #[serde(skip_serializing_if = "Option::is_none")]
        pub related: Option<RelatedRef>,
        /// Human readable summary
        pub message: String,

        /// Whether the recipient has read this notification
        #[serde(skip_serializing_if = "crate::if_false", default)]
        pub is_read: bool,
        /// Whether the recipient has dismissed this notification
        #[serde(skip_serializing_if = "crate::if_false", default)]
        pub is_hidden: bool,

        /// Stored as a real date so the expiry index can see it
        #[serde(with = "crate::util::time")]
        pub created_at: DateTime<Utc>,
    }

    /// Closed set of notification causes
    pub enum NotificationKind {
        FriendRequest,
        FriendAccept,
        PostLike,
        PostComment,
        NewMessage,
        Mention,
    }

    /// Reference to the record a notification points at
    pub struct RelatedRef {
        pub model: RelatedModel,
        pub id: String,
    }

    /// Closed set of models a notification may reference
    #[derive(Copy)]
    pub enum RelatedModel {
        User,
        Post,
        Comment,
        Conversation,
        Room,
        Group,
    }
);

impl RelatedModel {
    /// Collection holding the referenced record
    pub fn collection(&self) -> &'static str {
        match self {
            RelatedModel::User => "users",
            RelatedModel::Post => "posts",
            RelatedModel::Comment => "comments",
            RelatedModel::Conversation => "conversations",
            RelatedModel::Room => "rooms",
            RelatedModel::Group => "groups",
        }
    }
}

impl Notification {
    /// Store a new notification for a recipient
    pub async fn create(
        db: &Database,
        recipient: &str,
        actor: Option<String>,
        kind: NotificationKind,
        related: Option<RelatedRef>,
        message: String,
    ) -> Result<Notification> {
        let notification = Notification {
            id: Ulid::new().to_string(),
            recipient: recipient.to_string(),
            actor,
            kind,
            related,
            message,
            is_read: false,
            is_hidden: false,
            created_at: Utc::now(),
        };

        db.insert_notification(&notification).await?;

        Ok(notification)
    }

    /// Mark this notification as read
    pub async fn mark_read(&mut self, db: &Database) -> Result<()> {
        self.is_read = true;
        db.mark_notification_read(&self.id).await
    }

    /// Dismiss this notification without deleting it
    pub async fn hide(&mut self, db: &Database) -> Result<()> {
        self.is_hidden = true;
        db.hide_notification(&self.id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{Notification, NotificationKind, RelatedModel, RelatedRef};

    #[test]
    fn related_models_dispatch_to_their_collections() {
        assert_eq!(RelatedModel::Post.collection(), "posts");
        assert_eq!(RelatedModel::Conversation.collection(), "conversations");
    }

    #[async_std::test]
    async fn notifications_can_be_read_and_dismissed() {
        database_test!(|db| async move {
            let mut notification = Notification::create(
                &db,
                "01RECIPIENT",
                Some("01ACTOR".to_string()),
                NotificationKind::PostLike,
                Some(RelatedRef {
                    model: RelatedModel::Post,
                    id: "01POST".to_string(),
                }),
                "liked your post".to_string(),
            )
            .await
            .unwrap();

            notification.mark_read(&db).await.unwrap();

            let fetched = db.fetch_notification(&notification.id).await.unwrap();
            assert!(fetched.is_read);
            assert!(!fetched.is_hidden);

            notification.hide(&db).await.unwrap();
            let fetched = db.fetch_notification(&notification.id).await.unwrap();
            assert!(fetched.is_hidden);
        });
    }

    #[async_std::test]
    async fn dismissed_notifications_are_not_listed() {
        database_test!(|db| async move {
            let mut dismissed = Notification::create(
                &db,
                "01RECIPIENT",
                None,
                NotificationKind::FriendRequest,
                None,
                "sent you a friend request".to_string(),
            )
            .await
            .unwrap();
            dismissed.hide(&db).await.unwrap();

            let kept = Notification::create(
                &db,
                "01RECIPIENT",
                Some("01ACTOR".to_string()),
                NotificationKind::Mention,
                None,
                "mentioned you".to_string(),
            )
            .await
            .unwrap();

            // Another user's feed must stay separate
            Notification::create(
                &db,
                "01OTHER",
                None,
                NotificationKind::NewMessage,
                None,
                "sent a message".to_string(),
            )
            .await
            .unwrap();

            let feed = db
                .fetch_recent_notifications("01RECIPIENT", None)
                .await
                .unwrap();
            assert_eq!(feed.len(), 1);
            assert_eq!(feed[0].id, kept.id);
        });
    }

    #[async_std::test]
    async fn a_feed_can_be_read_in_bulk() {
        database_test!(|db| async move {
            for message in ["one", "two"] {
                Notification::create(
                    &db,
                    "01RECIPIENT",
                    None,
                    NotificationKind::PostComment,
                    None,
                    message.to_string(),
                )
                .await
                .unwrap();
            }

            db.mark_all_notifications_read("01RECIPIENT").await.unwrap();

            let feed = db
                .fetch_recent_notifications("01RECIPIENT", None)
                .await
                .unwrap();
            assert!(feed.iter().all(|notification| notification.is_read));
        });
    }
}
