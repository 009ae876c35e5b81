use campus_config::config;
use campus_result::{Error, ErrorType, Result};
use indexmap::IndexSet;
use iso8601_timestamp::{Duration, Timestamp};
use ulid::Ulid;

use crate::{AttachmentKind, Database, LastMessage, PartialConversation};

/// Text shown in conversation lists when a message has no content
pub static ATTACHMENT_PLACEHOLDER: &str = "Sent an attachment";

fn is_user_mode(mode: &SenderMode) -> bool {
    matches!(mode, SenderMode::User)
}

auto_derived!(
    /// Message within a conversation
    pub struct Message {
        /// Unique Id
        #[serde(rename = "_id")]
        pub id: String,
        /// Id of the conversation this message belongs to
        pub conversation: String,
        /// Id of the user or page that sent this message
        pub sender: String,
        /// Whether the sender was acting as themselves or as a page
        #[serde(skip_serializing_if = "is_user_mode", default)]
        pub sender_mode: SenderMode,

        /// Text content of this message
        #[serde(skip_serializing_if = "Option::is_none")]
        pub content: Option<String>,
        /// Attachments included with this message
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        pub attachments: Vec<Attachment>,

        /// Users who have seen this message
        #[serde(skip_serializing_if = "IndexSet::is_empty", default)]
        pub seen_by: IndexSet<String>,
        /// Whether this message was deleted by its sender
        #[serde(skip_serializing_if = "crate::if_false", default)]
        pub is_deleted: bool,
    }

    /// Identity a message was sent under
    #[derive(Copy, Default)]
    pub enum SenderMode {
        #[default]
        User,
        Page,
    }

    /// File embedded in a message
    pub struct Attachment {
        /// Original file name
        pub name: String,
        /// Where the file is served from
        pub url: String,
        /// Kind of file
        pub kind: AttachmentKind,
        /// Size in bytes
        pub size: usize,
    }

    /// New message contents before validation
    #[derive(Default)]
    pub struct DraftMessage {
        pub content: Option<String>,
        pub attachments: Vec<Attachment>,
        pub sender_mode: Option<SenderMode>,
    }

    /// Partial message for updates
    #[derive(Default)]
    pub struct PartialMessage {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub is_deleted: Option<bool>,
    }

    /// Optional fields on message object
    pub enum FieldsMessage {
        Content,
    }

    /// Sort order for message history queries
    #[derive(Copy)]
    pub enum MessageSort {
        Latest,
        Oldest,
    }

    /// Query against the message history of a conversation
    pub struct MessageQuery {
        /// Conversation to search in
        pub conversation: String,
        /// Only return messages before this id
        #[serde(skip_serializing_if = "Option::is_none")]
        pub before: Option<String>,
        /// Only return messages after this id
        #[serde(skip_serializing_if = "Option::is_none")]
        pub after: Option<String>,
        /// Maximum number of messages to return
        #[serde(skip_serializing_if = "Option::is_none")]
        pub limit: Option<i64>,
        /// Sort used for the result
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort: Option<MessageSort>,
    }
);

impl Message {
    /// Time this message was created, derived from its id
    pub fn timestamp(&self) -> Timestamp {
        Ulid::from_string(&self.id)
            .map(|ulid| {
                Timestamp::UNIX_EPOCH + Duration::milliseconds(ulid.timestamp_ms() as i64)
            })
            .unwrap_or_else(|_| Timestamp::now_utc())
    }

    /// Persist a new message and refresh the parent conversation summary
    ///
    /// The summary write is a separate step after the message commit, not a
    /// transaction: if it fails, the message stands and the cached summary
    /// lags until the next message refreshes it. Readers that need
    /// authoritative order must query the messages collection.
    pub async fn send(
        db: &Database,
        conversation_id: &str,
        sender: &str,
        draft: DraftMessage,
    ) -> Result<Message> {
        let content = draft
            .content
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty());

        if content.is_none() && draft.attachments.is_empty() {
            return Err(create_error!(EmptyMessage));
        }

        let limits = config().await.features.limits;

        if let Some(content) = &content {
            if content.chars().count() > limits.message_length {
                return Err(create_error!(PayloadTooLarge {
                    max: limits.message_length
                }));
            }
        }

        if draft.attachments.len() > limits.message_attachments {
            return Err(create_error!(TooManyAttachments {
                max: limits.message_attachments
            }));
        }

        let conversation = match db.fetch_conversation(conversation_id).await {
            Ok(conversation) => conversation,
            Err(Error {
                error_type: ErrorType::NotFound,
                ..
            }) => return Err(create_error!(UnknownConversation)),
            Err(err) => return Err(err),
        };

        let message = Message {
            id: Ulid::new().to_string(),
            conversation: conversation.id(),
            sender: sender.to_string(),
            sender_mode: draft.sender_mode.unwrap_or_default(),
            content,
            attachments: draft.attachments,
            seen_by: IndexSet::new(),
            is_deleted: false,
        };

        db.insert_message(&message).await?;

        let last_message = LastMessage {
            text: message
                .content
                .clone()
                .unwrap_or_else(|| ATTACHMENT_PLACEHOLDER.to_string()),
            sender: message.sender.clone(),
            created_at: message.timestamp(),
        };

        if let Err(err) = db
            .update_conversation(
                &message.conversation,
                &PartialConversation {
                    last_message: Some(last_message),
                    updated_at: Some(Timestamp::now_utc()),
                    ..Default::default()
                },
                vec![],
            )
            .await
        {
            // The message is durable; the summary lags until the next one lands.
            error!(
                "Failed to update conversation summary for {}: {:?}",
                message.conversation, err
            );
        }

        Ok(message)
    }

    /// Update message data
    pub async fn update(
        &mut self,
        db: &Database,
        partial: PartialMessage,
        remove: Vec<FieldsMessage>,
    ) -> Result<()> {
        for field in &remove {
            self.remove_field(field);
        }

        self.apply_options(partial.clone());

        db.update_message(&self.id, &partial, remove).await
    }

    /// Mark this message as deleted, keeping the record itself
    pub async fn delete(&mut self, db: &Database) -> Result<()> {
        self.update(
            db,
            PartialMessage {
                is_deleted: Some(true),
                ..Default::default()
            },
            vec![],
        )
        .await
    }

    /// Mark this message as seen by a user
    pub async fn mark_seen(&mut self, db: &Database, user_id: &str) -> Result<()> {
        if self.seen_by.insert(user_id.to_string()) {
            db.add_seen_by(&self.id, user_id).await?;
        }

        Ok(())
    }

    pub fn remove_field(&mut self, field: &FieldsMessage) {
        match field {
            FieldsMessage::Content => self.content = None,
        }
    }

    /// Apply partial message to message
    pub fn apply_options(&mut self, partial: PartialMessage) {
        if let Some(v) = partial.content {
            self.content = Some(v);
        }

        if let Some(v) = partial.is_deleted {
            self.is_deleted = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use campus_result::ErrorType;

    use crate::{
        Attachment, AttachmentKind, Conversation, DraftMessage, FieldsMessage, GroupTier, Message,
        MessageQuery, MessageSort, PartialMessage, TargetCriteria, ATTACHMENT_PLACEHOLDER,
    };

    fn scope() -> TargetCriteria {
        TargetCriteria {
            institution: "metropolitan".to_string(),
            department: "cse".to_string(),
            session: "2023-24".to_string(),
            section: Some("B".to_string()),
            sub_section: None,
        }
    }

    fn attachment() -> Attachment {
        Attachment {
            name: "notes.pdf".to_string(),
            url: "https://files.example/notes.pdf".to_string(),
            kind: AttachmentKind::Document,
            size: 48_213,
        }
    }

    #[async_std::test]
    async fn sending_updates_the_conversation_summary() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();
            let before = conversation.updated_at();

            let message = Message::send(
                &db,
                &conversation.id(),
                "01SENDER",
                DraftMessage {
                    content: Some("hello".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

            let fetched = db.fetch_conversation(&conversation.id()).await.unwrap();
            let summary = fetched.last_message().unwrap();
            assert_eq!(summary.text, "hello");
            assert_eq!(summary.sender, "01SENDER");
            assert_eq!(summary.created_at, message.timestamp());
            assert!(fetched.updated_at() >= before);
        });
    }

    #[async_std::test]
    async fn attachment_only_messages_use_a_placeholder() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();

            let message = Message::send(
                &db,
                &conversation.id(),
                "01SENDER",
                DraftMessage {
                    attachments: vec![attachment()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

            assert!(message.content.is_none());
            assert_eq!(message.attachments.len(), 1);

            let fetched = db.fetch_conversation(&conversation.id()).await.unwrap();
            assert_eq!(fetched.last_message().unwrap().text, ATTACHMENT_PLACEHOLDER);
        });
    }

    #[async_std::test]
    async fn empty_messages_are_rejected() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();

            let error = Message::send(
                &db,
                &conversation.id(),
                "01SENDER",
                DraftMessage {
                    content: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

            assert!(matches!(error.error_type, ErrorType::EmptyMessage));
        });
    }

    #[async_std::test]
    async fn unknown_conversations_are_rejected() {
        database_test!(|db| async move {
            let error = Message::send(
                &db,
                "01MISSING",
                "01SENDER",
                DraftMessage {
                    content: Some("hello".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

            assert!(matches!(error.error_type, ErrorType::UnknownConversation));
        });
    }

    #[async_std::test]
    async fn summaries_track_the_newest_message() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();

            for text in ["first", "second", "third"] {
                Message::send(
                    &db,
                    &conversation.id(),
                    "01SENDER",
                    DraftMessage {
                        content: Some(text.to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            }

            let fetched = db.fetch_conversation(&conversation.id()).await.unwrap();
            assert_eq!(fetched.last_message().unwrap().text, "third");
        });
    }

    #[async_std::test]
    async fn history_windows_respect_sort_and_limit() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();

            for text in ["first", "second", "third"] {
                Message::send(
                    &db,
                    &conversation.id(),
                    "01SENDER",
                    DraftMessage {
                        content: Some(text.to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();

                // Ids order by creation time at millisecond precision
                async_std::task::sleep(std::time::Duration::from_millis(2)).await;
            }

            let newest = db
                .fetch_messages(MessageQuery {
                    conversation: conversation.id(),
                    before: None,
                    after: None,
                    limit: Some(2),
                    sort: Some(MessageSort::Latest),
                })
                .await
                .unwrap();

            assert_eq!(newest.len(), 2);
            assert_eq!(newest[0].content.as_deref(), Some("third"));
            assert_eq!(newest[1].content.as_deref(), Some("second"));

            let after_first = db
                .fetch_messages(MessageQuery {
                    conversation: conversation.id(),
                    before: None,
                    after: Some(newest[1].id.clone()),
                    limit: None,
                    sort: Some(MessageSort::Oldest),
                })
                .await
                .unwrap();

            assert_eq!(after_first.len(), 1);
            assert_eq!(after_first[0].content.as_deref(), Some("third"));
        });
    }

    #[async_std::test]
    async fn deleting_keeps_a_flagged_record() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();

            let mut message = Message::send(
                &db,
                &conversation.id(),
                "01SENDER",
                DraftMessage {
                    content: Some("typo".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

            message.delete(&db).await.unwrap();

            let fetched = db.fetch_message(&message.id).await.unwrap();
            assert!(fetched.is_deleted);
            assert_eq!(fetched.content.as_deref(), Some("typo"));
        });
    }

    #[async_std::test]
    async fn edits_and_clears_apply_to_content() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();

            let mut message = Message::send(
                &db,
                &conversation.id(),
                "01SENDER",
                DraftMessage {
                    content: Some("teh notes".to_string()),
                    attachments: vec![attachment()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

            message
                .update(
                    &db,
                    PartialMessage {
                        content: Some("the notes".to_string()),
                        ..Default::default()
                    },
                    vec![],
                )
                .await
                .unwrap();

            let fetched = db.fetch_message(&message.id).await.unwrap();
            assert_eq!(fetched.content.as_deref(), Some("the notes"));

            message
                .update(&db, Default::default(), vec![FieldsMessage::Content])
                .await
                .unwrap();

            let fetched = db.fetch_message(&message.id).await.unwrap();
            assert!(fetched.content.is_none());
            assert_eq!(fetched.attachments.len(), 1);
        });
    }

    #[async_std::test]
    async fn messages_can_be_fetched_in_bulk() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();

            let mut ids = vec![];
            for text in ["first", "second"] {
                let message = Message::send(
                    &db,
                    &conversation.id(),
                    "01SENDER",
                    DraftMessage {
                        content: Some(text.to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
                ids.push(message.id);
            }

            let fetched = db.fetch_messages_by_id(&ids).await.unwrap();
            assert_eq!(fetched.len(), 2);
        });
    }

    #[async_std::test]
    async fn seen_markers_are_recorded_once() {
        database_test!(|db| async move {
            let (conversation, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(), "01SENDER")
                    .await
                    .unwrap();

            let mut message = Message::send(
                &db,
                &conversation.id(),
                "01SENDER",
                DraftMessage {
                    content: Some("hello".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

            message.mark_seen(&db, "01READER").await.unwrap();
            message.mark_seen(&db, "01READER").await.unwrap();

            let fetched = db.fetch_message(&message.id).await.unwrap();
            assert_eq!(fetched.seen_by.len(), 1);
            assert!(fetched.seen_by.contains("01READER"));
        });
    }
}
