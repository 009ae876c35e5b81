use campus_result::{Error, ErrorType, Result};
use iso8601_timestamp::Timestamp;

use crate::Database;

auto_derived!(
    /// Composite primary key consisting of conversation and user id
    #[derive(Hash, Default)]
    pub struct MembershipCompositeKey {
        /// Conversation Id
        pub conversation: String,
        /// User Id
        pub user: String,
    }

    /// Role held within a conversation
    #[derive(Copy)]
    pub enum MembershipRole {
        Admin,
        Member,
    }

    /// Per-user state for one conversation
    pub struct ChatMembership {
        /// Unique membership id
        #[serde(rename = "_id")]
        pub id: MembershipCompositeKey,

        /// Role held within the conversation
        pub role: MembershipRole,

        /// Time at which this user joined the conversation
        pub joined_at: Timestamp,

        /// Whether notifications from this conversation are muted
        #[serde(skip_serializing_if = "crate::if_false", default)]
        pub is_muted: bool,
        /// Whether this conversation is archived for this user
        #[serde(skip_serializing_if = "crate::if_false", default)]
        pub is_archived: bool,
        /// Time the user last read this conversation
        #[serde(skip_serializing_if = "Option::is_none")]
        pub last_seen_at: Option<Timestamp>,
    }

    /// Partial membership for updates
    #[derive(Default)]
    pub struct PartialChatMembership {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub role: Option<MembershipRole>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub is_muted: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub is_archived: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub last_seen_at: Option<Timestamp>,
    }

    /// Optional fields on membership object
    pub enum FieldsChatMembership {
        LastSeenAt,
    }
);

impl Default for ChatMembership {
    fn default() -> Self {
        Self {
            id: Default::default(),
            role: MembershipRole::Member,
            joined_at: Timestamp::now_utc(),
            is_muted: false,
            is_archived: false,
            last_seen_at: None,
        }
    }
}

impl ChatMembership {
    /// Ensure a membership exists for (conversation, user), creating it with
    /// role Member on first contact
    ///
    /// Finding an existing record is not an error, and a creation race on
    /// the composite key is absorbed by re-fetching the winner.
    pub async fn ensure(
        db: &Database,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ChatMembership> {
        Self::ensure_with_role(db, conversation_id, user_id, MembershipRole::Member).await
    }

    pub(crate) async fn ensure_with_role(
        db: &Database,
        conversation_id: &str,
        user_id: &str,
        role: MembershipRole,
    ) -> Result<ChatMembership> {
        match db.fetch_membership(conversation_id, user_id).await {
            Ok(membership) => Ok(membership),
            Err(Error {
                error_type: ErrorType::NotFound,
                ..
            }) => {
                let membership = ChatMembership {
                    id: MembershipCompositeKey {
                        conversation: conversation_id.to_string(),
                        user: user_id.to_string(),
                    },
                    role,
                    ..Default::default()
                };

                match db.insert_membership(&membership).await {
                    Ok(()) => Ok(membership),
                    Err(Error {
                        error_type: ErrorType::AlreadyExists,
                        ..
                    }) => db.fetch_membership(conversation_id, user_id).await,
                    Err(err) => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Update membership state
    pub async fn update(
        &mut self,
        db: &Database,
        partial: PartialChatMembership,
        remove: Vec<FieldsChatMembership>,
    ) -> Result<()> {
        for field in &remove {
            self.remove_field(field);
        }

        self.apply_options(partial.clone());

        db.update_membership(&self.id, &partial, remove).await
    }

    /// Record that the user has read the conversation up to now
    pub async fn mark_seen(&mut self, db: &Database) -> Result<()> {
        self.update(
            db,
            PartialChatMembership {
                last_seen_at: Some(Timestamp::now_utc()),
                ..Default::default()
            },
            vec![],
        )
        .await
    }

    pub fn remove_field(&mut self, field: &FieldsChatMembership) {
        match field {
            FieldsChatMembership::LastSeenAt => self.last_seen_at = None,
        }
    }

    /// Apply partial membership to membership
    pub fn apply_options(&mut self, partial: PartialChatMembership) {
        if let Some(v) = partial.role {
            self.role = v;
        }

        if let Some(v) = partial.is_muted {
            self.is_muted = v;
        }

        if let Some(v) = partial.is_archived {
            self.is_archived = v;
        }

        if let Some(v) = partial.last_seen_at {
            self.last_seen_at = Some(v);
        }
    }
}
