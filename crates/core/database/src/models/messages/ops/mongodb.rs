use bson::Document;
use mongodb::options::FindOptions;

use campus_result::Result;

use crate::{
    FieldsMessage, IntoDocumentPath, Message, MessageQuery, MessageSort, MongoDb, PartialMessage,
};

use super::AbstractMessages;

static COL: &str = "messages";

#[async_trait]
impl AbstractMessages for MongoDb {
    /// Insert a new message into the database
    async fn insert_message(&self, message: &Message) -> Result<()> {
        query!(self, insert_one, COL, &message).map(|_| ())
    }

    /// Fetch a message by its id
    async fn fetch_message(&self, id: &str) -> Result<Message> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch multiple messages by given query
    async fn fetch_messages(&self, query: MessageQuery) -> Result<Vec<Message>> {
        let mut filter = doc! {
            "conversation": &query.conversation
        };

        // Apply message id window
        if let Some(doc) = match (&query.before, &query.after) {
            (Some(before), Some(after)) => Some(doc! {
                "$lt": before,
                "$gt": after
            }),
            (Some(before), _) => Some(doc! {
                "$lt": before
            }),
            (_, Some(after)) => Some(doc! {
                "$gt": after
            }),
            _ => None,
        } {
            filter.insert("_id", doc);
        }

        let limit = query.limit.unwrap_or(50);

        self.find_with_options(
            COL,
            filter,
            FindOptions::builder()
                .limit(limit)
                .sort(match query.sort.unwrap_or(MessageSort::Latest) {
                    // Sort by latest first
                    MessageSort::Latest => doc! {
                        "_id": -1_i32
                    },
                    // Sort by oldest first
                    MessageSort::Oldest => doc! {
                        "_id": 1_i32
                    },
                })
                .build(),
        )
        .await
        .map_err(|_| create_database_error!("find", COL))
    }

    /// Fetch multiple messages by given IDs
    async fn fetch_messages_by_id(&self, ids: &[String]) -> Result<Vec<Message>> {
        query!(
            self,
            find,
            COL,
            doc! {
                "_id": {
                    "$in": ids
                }
            }
        )
    }

    /// Update a given message with new information
    async fn update_message(
        &self,
        id: &str,
        message: &PartialMessage,
        remove: Vec<FieldsMessage>,
    ) -> Result<()> {
        query!(
            self,
            update_one_by_id,
            COL,
            id,
            message,
            remove.iter().map(|x| x as &dyn IntoDocumentPath).collect()
        )
        .map(|_| ())
    }

    /// Record that a user has seen a message
    async fn add_seen_by(&self, id: &str, user_id: &str) -> Result<()> {
        self.col::<Document>(COL)
            .update_one(
                doc! {
                    "_id": id
                },
                doc! {
                    "$addToSet": {
                        "seen_by": user_id
                    }
                },
            )
            .await
            .map(|_| ())
            .map_err(|_| create_database_error!("update_one", COL))
    }
}

impl IntoDocumentPath for FieldsMessage {
    fn as_path(&self) -> Option<&'static str> {
        Some(match self {
            FieldsMessage::Content => "content",
        })
    }
}
