use campus_result::Result;

use crate::{
    Conversation, FieldsConversation, GroupTier, PartialConversation, ReferenceDb, TargetCriteria,
};

use super::AbstractConversations;

#[async_trait]
impl AbstractConversations for ReferenceDb {
    /// Insert a new conversation in the database
    ///
    /// Mirrors the storage-level uniqueness constraint: inserting a scoped
    /// conversation into an occupied (tier, criteria) slot is rejected.
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<()> {
        let mut conversations = self.conversations.lock().await;
        if conversations.contains_key(&conversation.id()) {
            return Err(create_database_error!("insert", "conversation"));
        }

        if let (Some(tier), Some(criteria)) = (conversation.tier(), conversation.criteria()) {
            if conversations
                .values()
                .any(|existing| existing.tier() == Some(tier) && existing.criteria() == Some(criteria))
            {
                return Err(create_error!(AlreadyExists));
            }
        }

        conversations.insert(conversation.id(), conversation.clone());
        Ok(())
    }

    /// Fetch a conversation from the database
    async fn fetch_conversation(&self, id: &str) -> Result<Conversation> {
        let conversations = self.conversations.lock().await;
        conversations
            .get(id)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all conversations with the given ids
    async fn fetch_conversations<'a>(&self, ids: &'a [String]) -> Result<Vec<Conversation>> {
        let conversations = self.conversations.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| conversations.get(id).cloned())
            .collect())
    }

    /// Find the unique auto-derived conversation for a tier and scope
    async fn find_scoped_conversation(
        &self,
        tier: GroupTier,
        criteria: &TargetCriteria,
    ) -> Result<Conversation> {
        let conversations = self.conversations.lock().await;
        conversations
            .values()
            .find(|conversation| {
                conversation.tier() == Some(tier) && conversation.criteria() == Some(criteria)
            })
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Find the direct conversation between two users
    async fn find_dual_conversation(&self, user_a: &str, user_b: &str) -> Result<Conversation> {
        let conversations = self.conversations.lock().await;
        conversations
            .values()
            .find(|conversation| {
                matches!(conversation, Conversation::Dual { .. })
                    && conversation.contains_user(user_a)
                    && conversation.contains_user(user_b)
            })
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Find the support conversation between a page and a user
    async fn find_page_support_conversation(
        &self,
        page_id: &str,
        user_id: &str,
    ) -> Result<Conversation> {
        let conversations = self.conversations.lock().await;
        conversations
            .values()
            .find(|conversation| {
                matches!(
                    conversation,
                    Conversation::PageSupport { page, user, .. }
                        if page == page_id && user == user_id
                )
            })
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Update a conversation
    async fn update_conversation(
        &self,
        id: &str,
        partial: &PartialConversation,
        remove: Vec<FieldsConversation>,
    ) -> Result<()> {
        let mut conversations = self.conversations.lock().await;
        if let Some(conversation) = conversations.get_mut(id) {
            for field in &remove {
                conversation.remove_field(field);
            }

            conversation.apply_options(partial.clone());
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }

    /// Insert a user to a group
    async fn add_user_to_group(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        let mut conversations = self.conversations.lock().await;
        match conversations.get_mut(conversation_id) {
            Some(Conversation::Group { recipients, .. }) => {
                if !recipients.contains(&String::from(user_id)) {
                    recipients.push(String::from(user_id));
                }

                Ok(())
            }
            Some(_) => Err(create_error!(InvalidOperation)),
            None => Err(create_error!(NotFound)),
        }
    }

    /// Remove a user from a group
    async fn remove_user_from_group(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        let mut conversations = self.conversations.lock().await;
        match conversations.get_mut(conversation_id) {
            Some(Conversation::Group { recipients, .. }) => {
                recipients.retain(|member| member != user_id);
                Ok(())
            }
            Some(_) => Err(create_error!(InvalidOperation)),
            None => Err(create_error!(NotFound)),
        }
    }
}
