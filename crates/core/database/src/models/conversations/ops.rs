use campus_result::Result;

use crate::{Conversation, FieldsConversation, GroupTier, PartialConversation, TargetCriteria};

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractConversations: Sync + Send {
    /// Insert a new conversation into the database
    ///
    /// Scoped conversations are subject to the per-tier uniqueness
    /// constraint; an insert into an occupied slot fails with AlreadyExists.
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<()>;

    /// Fetch a conversation by its id
    async fn fetch_conversation(&self, id: &str) -> Result<Conversation>;

    /// Fetch multiple conversations by their ids
    async fn fetch_conversations<'a>(&self, ids: &'a [String]) -> Result<Vec<Conversation>>;

    /// Find the unique auto-derived conversation for a tier and scope
    async fn find_scoped_conversation(
        &self,
        tier: GroupTier,
        criteria: &TargetCriteria,
    ) -> Result<Conversation>;

    /// Find the direct conversation between two users
    async fn find_dual_conversation(&self, user_a: &str, user_b: &str) -> Result<Conversation>;

    /// Find the support conversation between a page and a user
    async fn find_page_support_conversation(
        &self,
        page_id: &str,
        user_id: &str,
    ) -> Result<Conversation>;

    /// Update a conversation with new information
    async fn update_conversation(
        &self,
        id: &str,
        conversation: &PartialConversation,
        remove: Vec<FieldsConversation>,
    ) -> Result<()>;

    /// Add a user to a group conversation
    async fn add_user_to_group(&self, conversation_id: &str, user_id: &str) -> Result<()>;

    /// Remove a user from a group conversation
    async fn remove_user_from_group(&self, conversation_id: &str, user_id: &str) -> Result<()>;
}
