use campus_result::Result;

use crate::{ChatMembership, FieldsChatMembership, MembershipCompositeKey, PartialChatMembership};

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractChatMemberships: Sync + Send {
    /// Insert a new membership into the database
    ///
    /// The composite (conversation, user) key is the primary key; inserting
    /// a second record for the same pair fails with AlreadyExists.
    async fn insert_membership(&self, membership: &ChatMembership) -> Result<()>;

    /// Fetch a membership by its composite id
    async fn fetch_membership(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ChatMembership>;

    /// Fetch all memberships in a conversation
    async fn fetch_conversation_memberships<'a>(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ChatMembership>>;

    /// Fetch all memberships held by a user
    async fn fetch_user_memberships<'a>(&self, user_id: &str) -> Result<Vec<ChatMembership>>;

    /// Fetch the number of members in a conversation
    async fn fetch_membership_count(&self, conversation_id: &str) -> Result<usize>;

    /// Update information for a membership
    async fn update_membership(
        &self,
        id: &MembershipCompositeKey,
        partial: &PartialChatMembership,
        remove: Vec<FieldsChatMembership>,
    ) -> Result<()>;
}
