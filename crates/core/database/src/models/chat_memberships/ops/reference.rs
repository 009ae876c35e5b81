use campus_result::Result;

use crate::{
    ChatMembership, FieldsChatMembership, MembershipCompositeKey, PartialChatMembership,
    ReferenceDb,
};

use super::AbstractChatMemberships;

#[async_trait]
impl AbstractChatMemberships for ReferenceDb {
    /// Insert a new membership into the database
    async fn insert_membership(&self, membership: &ChatMembership) -> Result<()> {
        let mut memberships = self.chat_memberships.lock().await;
        if memberships.contains_key(&membership.id) {
            Err(create_error!(AlreadyExists))
        } else {
            memberships.insert(membership.id.clone(), membership.clone());
            Ok(())
        }
    }

    /// Fetch a membership by its composite id
    async fn fetch_membership(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ChatMembership> {
        let memberships = self.chat_memberships.lock().await;
        memberships
            .get(&MembershipCompositeKey {
                conversation: conversation_id.to_string(),
                user: user_id.to_string(),
            })
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all memberships in a conversation
    async fn fetch_conversation_memberships<'a>(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ChatMembership>> {
        let memberships = self.chat_memberships.lock().await;
        Ok(memberships
            .values()
            .filter(|membership| membership.id.conversation == conversation_id)
            .cloned()
            .collect())
    }

    /// Fetch all memberships held by a user
    async fn fetch_user_memberships<'a>(&self, user_id: &str) -> Result<Vec<ChatMembership>> {
        let memberships = self.chat_memberships.lock().await;
        Ok(memberships
            .values()
            .filter(|membership| membership.id.user == user_id)
            .cloned()
            .collect())
    }

    /// Fetch the number of members in a conversation
    async fn fetch_membership_count(&self, conversation_id: &str) -> Result<usize> {
        let memberships = self.chat_memberships.lock().await;
        Ok(memberships
            .values()
            .filter(|membership| membership.id.conversation == conversation_id)
            .count())
    }

    /// Update information for a membership
    async fn update_membership(
        &self,
        id: &MembershipCompositeKey,
        partial: &PartialChatMembership,
        remove: Vec<FieldsChatMembership>,
    ) -> Result<()> {
        let mut memberships = self.chat_memberships.lock().await;
        if let Some(membership) = memberships.get_mut(id) {
            for field in remove {
                membership.remove_field(&field);
            }

            membership.apply_options(partial.clone());
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
