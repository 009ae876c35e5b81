use bson::Document;

use crate::{
    is_duplicate_key, Conversation, FieldsConversation, GroupTier, IntoDocumentPath, MongoDb,
    PartialConversation, TargetCriteria,
};
use campus_result::Result;

use super::AbstractConversations;

static COL: &str = "conversations";

#[async_trait]
impl AbstractConversations for MongoDb {
    /// Insert a new conversation in the database
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<()> {
        self.col::<Conversation>(COL)
            .insert_one(conversation)
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

    /// Fetch a conversation from the database
    async fn fetch_conversation(&self, id: &str) -> Result<Conversation> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all conversations with the given ids
    async fn fetch_conversations<'a>(&self, ids: &'a [String]) -> Result<Vec<Conversation>> {
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

    /// Find the unique auto-derived conversation for a tier and scope
    async fn find_scoped_conversation(
        &self,
        tier: GroupTier,
        criteria: &TargetCriteria,
    ) -> Result<Conversation> {
        let mut filter = doc! {
            "conversation_type": tier.conversation_type(),
            "criteria.institution": &criteria.institution,
            "criteria.department": &criteria.department,
            "criteria.session": &criteria.session,
        };

        if let Some(section) = &criteria.section {
            filter.insert("criteria.section", section);
        }

        if let Some(sub_section) = &criteria.sub_section {
            filter.insert("criteria.sub_section", sub_section);
        }

        query!(self, find_one, COL, filter)?.ok_or_else(|| create_error!(NotFound))
    }

    /// Find the direct conversation between two users
    async fn find_dual_conversation(&self, user_a: &str, user_b: &str) -> Result<Conversation> {
        query!(
            self,
            find_one,
            COL,
            doc! {
                "conversation_type": "Dual",
                "recipients": {
                    "$all": [ user_a, user_b ]
                }
            }
        )?
        .ok_or_else(|| create_error!(NotFound))
    }

    /// Find the support conversation between a page and a user
    async fn find_page_support_conversation(
        &self,
        page_id: &str,
        user_id: &str,
    ) -> Result<Conversation> {
        query!(
            self,
            find_one,
            COL,
            doc! {
                "conversation_type": "PageSupport",
                "page": page_id,
                "user": user_id
            }
        )?
        .ok_or_else(|| create_error!(NotFound))
    }

    /// Update a conversation
    async fn update_conversation(
        &self,
        id: &str,
        conversation: &PartialConversation,
        remove: Vec<FieldsConversation>,
    ) -> Result<()> {
        query!(
            self,
            update_one_by_id,
            COL,
            id,
            conversation,
            remove.iter().map(|x| x as &dyn IntoDocumentPath).collect()
        )
        .map(|_| ())
    }

    /// Insert a user to a group
    async fn add_user_to_group(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        self.col::<Document>(COL)
            .update_one(
                doc! {
                    "_id": conversation_id
                },
                doc! {
                    "$push": {
                        "recipients": user_id
                    }
                },
            )
            .await
            .map(|_| ())
            .map_err(|_| create_database_error!("update_one", COL))
    }

    /// Remove a user from a group
    async fn remove_user_from_group(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        self.col::<Document>(COL)
            .update_one(
                doc! {
                    "_id": conversation_id
                },
                doc! {
                    "$pull": {
                        "recipients": user_id
                    }
                },
            )
            .await
            .map(|_| ())
            .map_err(|_| create_database_error!("update_one", COL))
    }
}

impl IntoDocumentPath for FieldsConversation {
    fn as_path(&self) -> Option<&'static str> {
        Some(match self {
            FieldsConversation::LastMessage => "last_message",
        })
    }
}
