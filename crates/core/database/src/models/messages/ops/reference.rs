use futures::future::try_join_all;

use campus_result::Result;

use crate::{FieldsMessage, Message, MessageQuery, MessageSort, PartialMessage, ReferenceDb};

use super::AbstractMessages;

#[async_trait]
impl AbstractMessages for ReferenceDb {
    /// Insert a new message into the database
    async fn insert_message(&self, message: &Message) -> Result<()> {
        let mut messages = self.messages.lock().await;
        if messages.contains_key(&message.id) {
            Err(create_database_error!("insert", "message"))
        } else {
            messages.insert(message.id.to_string(), message.clone());
            Ok(())
        }
    }

    /// Fetch a message by its id
    async fn fetch_message(&self, id: &str) -> Result<Message> {
        let messages = self.messages.lock().await;
        messages
            .get(id)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch multiple messages by given query
    async fn fetch_messages(&self, query: MessageQuery) -> Result<Vec<Message>> {
        let messages = self.messages.lock().await;
        let mut matched: Vec<Message> = messages
            .values()
            .filter(|message| {
                if message.conversation != query.conversation {
                    return false;
                }

                if let Some(before) = &query.before {
                    if message.id.as_str() >= before.as_str() {
                        return false;
                    }
                }

                if let Some(after) = &query.after {
                    if message.id.as_str() <= after.as_str() {
                        return false;
                    }
                }

                true
            })
            .cloned()
            .collect();

        // Ids order by creation time
        match query.sort.unwrap_or(MessageSort::Latest) {
            MessageSort::Latest => matched.sort_by(|a, b| b.id.cmp(&a.id)),
            MessageSort::Oldest => matched.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        matched.truncate(query.limit.unwrap_or(50) as usize);

        Ok(matched)
    }

    /// Fetch multiple messages by given IDs
    async fn fetch_messages_by_id(&self, ids: &[String]) -> Result<Vec<Message>> {
        try_join_all(ids.iter().map(|id| self.fetch_message(id))).await
    }

    /// Update a given message with new information
    async fn update_message(
        &self,
        id: &str,
        partial: &PartialMessage,
        remove: Vec<FieldsMessage>,
    ) -> Result<()> {
        let mut messages = self.messages.lock().await;
        if let Some(message) = messages.get_mut(id) {
            for field in remove {
                message.remove_field(&field);
            }

            message.apply_options(partial.clone());
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }

    /// Record that a user has seen a message
    async fn add_seen_by(&self, id: &str, user_id: &str) -> Result<()> {
        let mut messages = self.messages.lock().await;
        if let Some(message) = messages.get_mut(id) {
            message.seen_by.insert(user_id.to_string());
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
