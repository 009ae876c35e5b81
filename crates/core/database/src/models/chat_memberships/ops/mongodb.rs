use campus_result::Result;

use crate::{
    is_duplicate_key, ChatMembership, FieldsChatMembership, IntoDocumentPath,
    MembershipCompositeKey, MongoDb, PartialChatMembership,
};

use super::AbstractChatMemberships;

static COL: &str = "chat_memberships";

#[async_trait]
impl AbstractChatMemberships for MongoDb {
    /// Insert a new membership into the database
    async fn insert_membership(&self, membership: &ChatMembership) -> Result<()> {
        self.col::<ChatMembership>(COL)
            .insert_one(membership)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_duplicate_key(&err) {
                    create_error!(AlreadyExists)
                } else {
                    create_database_error!("insert_one", COL)
                }
            })
    }

    /// Fetch a membership by its composite id
    async fn fetch_membership(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ChatMembership> {
        query!(
            self,
            find_one,
            COL,
            doc! {
                "_id.conversation": conversation_id,
                "_id.user": user_id
            }
        )?
        .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all memberships in a conversation
    async fn fetch_conversation_memberships<'a>(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ChatMembership>> {
        query!(
            self,
            find,
            COL,
            doc! {
                "_id.conversation": conversation_id
            }
        )
    }

    /// Fetch all memberships held by a user
    async fn fetch_user_memberships<'a>(&self, user_id: &str) -> Result<Vec<ChatMembership>> {
        query!(
            self,
            find,
            COL,
            doc! {
                "_id.user": user_id
            }
        )
    }

    /// Fetch the number of members in a conversation
    async fn fetch_membership_count(&self, conversation_id: &str) -> Result<usize> {
        self.count_documents(
            COL,
            doc! {
                "_id.conversation": conversation_id
            },
        )
        .await
        .map(|count| count as usize)
        .map_err(|_| create_database_error!("count_documents", COL))
    }

    /// Update information for a membership
    async fn update_membership(
        &self,
        id: &MembershipCompositeKey,
        partial: &PartialChatMembership,
        remove: Vec<FieldsChatMembership>,
    ) -> Result<()> {
        query!(
            self,
            update_one,
            COL,
            doc! {
                "_id.conversation": &id.conversation,
                "_id.user": &id.user
            },
            partial,
            remove.iter().map(|x| x as &dyn IntoDocumentPath).collect()
        )
        .map(|_| ())
    }
}

impl IntoDocumentPath for FieldsChatMembership {
    fn as_path(&self) -> Option<&'static str> {
        Some(match self {
            FieldsChatMembership::LastSeenAt => "last_seen_at",
        })
    }
}
