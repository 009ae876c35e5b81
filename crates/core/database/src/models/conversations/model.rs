use campus_config::config;
use campus_result::{Error, ErrorType, Result};
use iso8601_timestamp::Timestamp;
use ulid::Ulid;

use crate::{ChatMembership, Database, MembershipRole};

auto_derived!(
    /// Conversation
    #[serde(tag = "conversation_type")]
    pub enum Conversation {
        /// Direct conversation between two users
        Dual {
            /// Unique Id
            #[serde(rename = "_id")]
            id: String,

            /// 2-tuple of user ids participating in the conversation
            recipients: Vec<String>,

            /// Snapshot of the most recent message
            #[serde(skip_serializing_if = "Option::is_none")]
            last_message: Option<LastMessage>,
            /// Time of the last activity in this conversation
            updated_at: Timestamp,
        },
        /// User-created group conversation
        Group {
            /// Unique Id
            #[serde(rename = "_id")]
            id: String,

            /// Display name of the group
            name: String,
            /// User id of the owner of the group
            owner: String,
            /// Array of user ids participating in the group
            recipients: Vec<String>,
            /// User ids holding elevated rights
            #[serde(skip_serializing_if = "Vec::is_empty", default)]
            admins: Vec<String>,

            /// Snapshot of the most recent message
            #[serde(skip_serializing_if = "Option::is_none")]
            last_message: Option<LastMessage>,
            /// Time of the last activity in this conversation
            updated_at: Timestamp,
        },
        /// Auto-derived chat covering a whole department batch
        BatchDepartmentChat {
            /// Unique Id
            #[serde(rename = "_id")]
            id: String,

            /// Institutional coordinates this chat is keyed on
            criteria: TargetCriteria,
            /// User ids holding elevated rights
            #[serde(skip_serializing_if = "Vec::is_empty", default)]
            admins: Vec<String>,

            /// Snapshot of the most recent message
            #[serde(skip_serializing_if = "Option::is_none")]
            last_message: Option<LastMessage>,
            /// Time of the last activity in this conversation
            updated_at: Timestamp,
        },
        /// Auto-derived chat for one section of a batch
        SectionChat {
            /// Unique Id
            #[serde(rename = "_id")]
            id: String,

            /// Institutional coordinates this chat is keyed on
            criteria: TargetCriteria,
            /// User ids holding elevated rights
            #[serde(skip_serializing_if = "Vec::is_empty", default)]
            admins: Vec<String>,

            /// Snapshot of the most recent message
            #[serde(skip_serializing_if = "Option::is_none")]
            last_message: Option<LastMessage>,
            /// Time of the last activity in this conversation
            updated_at: Timestamp,
        },
        /// Auto-derived chat for one sub-section of a section
        SubSectionChat {
            /// Unique Id
            #[serde(rename = "_id")]
            id: String,

            /// Institutional coordinates this chat is keyed on
            criteria: TargetCriteria,
            /// User ids holding elevated rights
            #[serde(skip_serializing_if = "Vec::is_empty", default)]
            admins: Vec<String>,

            /// Snapshot of the most recent message
            #[serde(skip_serializing_if = "Option::is_none")]
            last_message: Option<LastMessage>,
            /// Time of the last activity in this conversation
            updated_at: Timestamp,
        },
        /// Support conversation between a page and a single user
        PageSupport {
            /// Unique Id
            #[serde(rename = "_id")]
            id: String,

            /// Id of the page this conversation belongs to
            page: String,
            /// Id of the user being supported
            user: String,

            /// Snapshot of the most recent message
            #[serde(skip_serializing_if = "Option::is_none")]
            last_message: Option<LastMessage>,
            /// Time of the last activity in this conversation
            updated_at: Timestamp,
        },
    }
);

auto_derived!(
    /// Institutional coordinates identifying one auto-derived conversation
    #[derive(Hash, Default)]
    pub struct TargetCriteria {
        /// Institution Id
        pub institution: String,
        /// Department Id
        pub department: String,
        /// Academic session
        pub session: String,
        /// Section within the batch
        #[serde(skip_serializing_if = "Option::is_none")]
        pub section: Option<String>,
        /// Sub-section within the section
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sub_section: Option<String>,
    }

    /// Snapshot of the most recent message in a conversation
    ///
    /// This is a cache kept for conversation list views; the messages
    /// collection remains the source of truth and may run ahead of it.
    pub struct LastMessage {
        /// Text shown in the conversation list
        pub text: String,
        /// Id of the user or page that sent the message
        pub sender: String,
        /// Time the message was created
        pub created_at: Timestamp,
    }

    /// Hierarchical auto-group chat tiers
    #[derive(Copy)]
    pub enum GroupTier {
        BatchDepartment,
        Section,
        SubSection,
    }

    /// Partial conversation for updates
    #[derive(Default)]
    pub struct PartialConversation {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub owner: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub admins: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub last_message: Option<LastMessage>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub updated_at: Option<Timestamp>,
    }

    /// Optional fields on conversation object
    pub enum FieldsConversation {
        LastMessage,
    }
);

impl GroupTier {
    /// Tag value this tier is stored under
    pub fn conversation_type(&self) -> &'static str {
        match self {
            GroupTier::BatchDepartment => "BatchDepartmentChat",
            GroupTier::Section => "SectionChat",
            GroupTier::SubSection => "SubSectionChat",
        }
    }

    /// Validate a scope key and reduce it to the coordinates this tier is keyed on
    ///
    /// Coordinates deeper than the tier are dropped so that one caller shape
    /// serves all tiers; missing or blank required coordinates are rejected.
    pub fn criteria(&self, scope: TargetCriteria) -> Result<TargetCriteria> {
        fn require(value: &str, field: &str) -> Result<()> {
            if value.trim().is_empty() {
                Err(create_error!(MissingScopeField {
                    field: field.to_string()
                }))
            } else {
                Ok(())
            }
        }

        require(&scope.institution, "institution")?;
        require(&scope.department, "department")?;
        require(&scope.session, "session")?;

        let section = match self {
            GroupTier::BatchDepartment => None,
            GroupTier::Section | GroupTier::SubSection => match scope.section {
                Some(ref section) if !section.trim().is_empty() => Some(section.clone()),
                _ => {
                    return Err(create_error!(MissingScopeField {
                        field: "section".to_string()
                    }))
                }
            },
        };

        let sub_section = match self {
            GroupTier::SubSection => match scope.sub_section {
                Some(ref sub_section) if !sub_section.trim().is_empty() => {
                    Some(sub_section.clone())
                }
                _ => {
                    return Err(create_error!(MissingScopeField {
                        field: "sub_section".to_string()
                    }))
                }
            },
            _ => None,
        };

        Ok(TargetCriteria {
            institution: scope.institution,
            department: scope.department,
            session: scope.session,
            section,
            sub_section,
        })
    }
}

impl Conversation {
    /// Build a fresh auto-derived conversation for a tier and canonical criteria
    fn scoped(tier: GroupTier, criteria: TargetCriteria) -> Conversation {
        let id = Ulid::new().to_string();
        let updated_at = Timestamp::now_utc();

        match tier {
            GroupTier::BatchDepartment => Conversation::BatchDepartmentChat {
                id,
                criteria,
                admins: vec![],
                last_message: None,
                updated_at,
            },
            GroupTier::Section => Conversation::SectionChat {
                id,
                criteria,
                admins: vec![],
                last_message: None,
                updated_at,
            },
            GroupTier::SubSection => Conversation::SubSectionChat {
                id,
                criteria,
                admins: vec![],
                last_message: None,
                updated_at,
            },
        }
    }

    /// Resolve the single conversation for an institutional scope,
    /// creating it on first access
    ///
    /// Creation races are absorbed: a caller whose insert is rejected by the
    /// storage uniqueness constraint re-fetches and returns the winner, so
    /// every caller observes exactly one conversation per (tier, scope).
    /// A membership for the requesting user is ensured either way.
    pub async fn resolve_scoped(
        db: &Database,
        tier: GroupTier,
        scope: TargetCriteria,
        user_id: &str,
    ) -> Result<(Conversation, ChatMembership)> {
        let criteria = tier.criteria(scope)?;

        let conversation = match db.find_scoped_conversation(tier, &criteria).await {
            Ok(conversation) => conversation,
            Err(Error {
                error_type: ErrorType::NotFound,
                ..
            }) => {
                let conversation = Conversation::scoped(tier, criteria.clone());
                match db.insert_conversation(&conversation).await {
                    Ok(()) => conversation,
                    Err(Error {
                        error_type: ErrorType::AlreadyExists,
                        ..
                    }) => db.find_scoped_conversation(tier, &criteria).await?,
                    Err(err) => return Err(err),
                }
            }
            Err(err) => return Err(err),
        };

        let membership = ChatMembership::ensure(db, &conversation.id(), user_id).await?;

        Ok((conversation, membership))
    }

    /// Create a group conversation owned by `owner_id`
    pub async fn create_group(
        db: &Database,
        name: String,
        owner_id: &str,
        recipients: Vec<String>,
    ) -> Result<Conversation> {
        let max = config().await.features.limits.group_size;

        let mut members = recipients;
        if !members.iter().any(|member| member == owner_id) {
            members.insert(0, owner_id.to_string());
        }

        if members.len() > max {
            return Err(create_error!(GroupTooLarge { max }));
        }

        let conversation = Conversation::Group {
            id: Ulid::new().to_string(),
            name,
            owner: owner_id.to_string(),
            recipients: members.clone(),
            admins: vec![owner_id.to_string()],
            last_message: None,
            updated_at: Timestamp::now_utc(),
        };

        db.insert_conversation(&conversation).await?;

        for member in members {
            let role = if member == owner_id {
                MembershipRole::Admin
            } else {
                MembershipRole::Member
            };

            ChatMembership::ensure_with_role(db, &conversation.id(), &member, role).await?;
        }

        Ok(conversation)
    }

    /// Open the direct conversation between two users, creating it on first use
    pub async fn open_dual(db: &Database, user_a: &str, user_b: &str) -> Result<Conversation> {
        match db.find_dual_conversation(user_a, user_b).await {
            Ok(conversation) => Ok(conversation),
            Err(Error {
                error_type: ErrorType::NotFound,
                ..
            }) => {
                let conversation = Conversation::Dual {
                    id: Ulid::new().to_string(),
                    recipients: vec![user_a.to_string(), user_b.to_string()],
                    last_message: None,
                    updated_at: Timestamp::now_utc(),
                };

                db.insert_conversation(&conversation).await?;

                ChatMembership::ensure(db, &conversation.id(), user_a).await?;
                ChatMembership::ensure(db, &conversation.id(), user_b).await?;

                Ok(conversation)
            }
            Err(err) => Err(err),
        }
    }

    /// Open the support conversation between a page and a user,
    /// creating it on first use
    pub async fn open_page_support(
        db: &Database,
        page_id: &str,
        user_id: &str,
    ) -> Result<Conversation> {
        match db.find_page_support_conversation(page_id, user_id).await {
            Ok(conversation) => Ok(conversation),
            Err(Error {
                error_type: ErrorType::NotFound,
                ..
            }) => {
                let conversation = Conversation::PageSupport {
                    id: Ulid::new().to_string(),
                    page: page_id.to_string(),
                    user: user_id.to_string(),
                    last_message: None,
                    updated_at: Timestamp::now_utc(),
                };

                db.insert_conversation(&conversation).await?;

                ChatMembership::ensure(db, &conversation.id(), user_id).await?;

                Ok(conversation)
            }
            Err(err) => Err(err),
        }
    }

    /// Add a user to a group conversation
    pub async fn add_user_to_group(&mut self, db: &Database, user_id: &str) -> Result<()> {
        if let Conversation::Group { recipients, .. } = self {
            if recipients.contains(&String::from(user_id)) {
                return Err(create_error!(AlreadyInGroup));
            }

            recipients.push(String::from(user_id));
        }

        match &self {
            Conversation::Group { id, .. } => {
                db.add_user_to_group(id, user_id).await?;

                ChatMembership::ensure(db, id, user_id).await?;

                Ok(())
            }
            _ => Err(create_error!(InvalidOperation)),
        }
    }

    /// Remove a user from a group conversation
    ///
    /// The membership record is intentionally left in place; only the
    /// recipients list changes.
    pub async fn remove_user_from_group(&mut self, db: &Database, user_id: &str) -> Result<()> {
        match self {
            Conversation::Group {
                id,
                owner,
                recipients,
                ..
            } => {
                if user_id == owner {
                    // Ownership must move before the owner can leave
                    return Err(create_error!(InvalidOperation));
                }

                if !recipients.contains(&String::from(user_id)) {
                    return Err(create_error!(NotInGroup));
                }

                recipients.retain(|member| member != user_id);
                db.remove_user_from_group(id, user_id).await
            }
            _ => Err(create_error!(InvalidOperation)),
        }
    }

    /// Update conversation data
    pub async fn update(
        &mut self,
        db: &Database,
        partial: PartialConversation,
        remove: Vec<FieldsConversation>,
    ) -> Result<()> {
        for field in &remove {
            self.remove_field(field);
        }

        self.apply_options(partial.clone());

        db.update_conversation(&self.id(), &partial, remove).await
    }

    /// Get a reference to this conversation's id
    pub fn id(&self) -> String {
        match self {
            Conversation::Dual { id, .. }
            | Conversation::Group { id, .. }
            | Conversation::BatchDepartmentChat { id, .. }
            | Conversation::SectionChat { id, .. }
            | Conversation::SubSectionChat { id, .. }
            | Conversation::PageSupport { id, .. } => id.clone(),
        }
    }

    /// Tier this conversation was auto-derived for, if any
    pub fn tier(&self) -> Option<GroupTier> {
        match self {
            Conversation::BatchDepartmentChat { .. } => Some(GroupTier::BatchDepartment),
            Conversation::SectionChat { .. } => Some(GroupTier::Section),
            Conversation::SubSectionChat { .. } => Some(GroupTier::SubSection),
            _ => None,
        }
    }

    /// Institutional coordinates this conversation is keyed on, if any
    pub fn criteria(&self) -> Option<&TargetCriteria> {
        match self {
            Conversation::BatchDepartmentChat { criteria, .. }
            | Conversation::SectionChat { criteria, .. }
            | Conversation::SubSectionChat { criteria, .. } => Some(criteria),
            _ => None,
        }
    }

    /// Snapshot of the most recent message, if any has been cached
    pub fn last_message(&self) -> Option<&LastMessage> {
        match self {
            Conversation::Dual { last_message, .. }
            | Conversation::Group { last_message, .. }
            | Conversation::BatchDepartmentChat { last_message, .. }
            | Conversation::SectionChat { last_message, .. }
            | Conversation::SubSectionChat { last_message, .. }
            | Conversation::PageSupport { last_message, .. } => last_message.as_ref(),
        }
    }

    /// Time of the last activity in this conversation
    pub fn updated_at(&self) -> Timestamp {
        match self {
            Conversation::Dual { updated_at, .. }
            | Conversation::Group { updated_at, .. }
            | Conversation::BatchDepartmentChat { updated_at, .. }
            | Conversation::SectionChat { updated_at, .. }
            | Conversation::SubSectionChat { updated_at, .. }
            | Conversation::PageSupport { updated_at, .. } => *updated_at,
        }
    }

    /// Check whether a user is listed as a recipient
    pub fn contains_user(&self, user_id: &str) -> bool {
        match self {
            Conversation::Dual { recipients, .. } | Conversation::Group { recipients, .. } => {
                recipients.contains(&String::from(user_id))
            }
            _ => false,
        }
    }

    /// Remove a field from conversation object
    pub fn remove_field(&mut self, field: &FieldsConversation) {
        match field {
            FieldsConversation::LastMessage => match self {
                Conversation::Dual { last_message, .. }
                | Conversation::Group { last_message, .. }
                | Conversation::BatchDepartmentChat { last_message, .. }
                | Conversation::SectionChat { last_message, .. }
                | Conversation::SubSectionChat { last_message, .. }
                | Conversation::PageSupport { last_message, .. } => {
                    last_message.take();
                }
            },
        }
    }

    /// Apply partial conversation to conversation
    pub fn apply_options(&mut self, partial: PartialConversation) {
        match self {
            Conversation::Dual {
                last_message,
                updated_at,
                ..
            }
            | Conversation::Group {
                last_message,
                updated_at,
                ..
            }
            | Conversation::BatchDepartmentChat {
                last_message,
                updated_at,
                ..
            }
            | Conversation::SectionChat {
                last_message,
                updated_at,
                ..
            }
            | Conversation::SubSectionChat {
                last_message,
                updated_at,
                ..
            }
            | Conversation::PageSupport {
                last_message,
                updated_at,
                ..
            } => {
                if let Some(v) = partial.last_message {
                    last_message.replace(v);
                }

                if let Some(v) = partial.updated_at {
                    *updated_at = v;
                }
            }
        }

        match self {
            Conversation::Group {
                name,
                owner,
                admins,
                ..
            } => {
                if let Some(v) = partial.name {
                    *name = v;
                }

                if let Some(v) = partial.owner {
                    *owner = v;
                }

                if let Some(v) = partial.admins {
                    *admins = v;
                }
            }
            Conversation::BatchDepartmentChat { admins, .. }
            | Conversation::SectionChat { admins, .. }
            | Conversation::SubSectionChat { admins, .. } => {
                if let Some(v) = partial.admins {
                    *admins = v;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use campus_result::ErrorType;

    use crate::{
        Conversation, DraftMessage, FieldsConversation, GroupTier, MembershipRole, Message,
        PartialConversation, TargetCriteria,
    };

    fn scope(section: Option<&str>, sub_section: Option<&str>) -> TargetCriteria {
        TargetCriteria {
            institution: "metropolitan".to_string(),
            department: "cse".to_string(),
            session: "2023-24".to_string(),
            section: section.map(String::from),
            sub_section: sub_section.map(String::from),
        }
    }

    #[test]
    fn section_tier_requires_a_section() {
        let error = GroupTier::Section.criteria(scope(None, None)).unwrap_err();
        assert!(
            matches!(error.error_type, ErrorType::MissingScopeField { field } if field == "section")
        );
    }

    #[test]
    fn sub_section_tier_requires_a_sub_section() {
        let error = GroupTier::SubSection
            .criteria(scope(Some("A"), None))
            .unwrap_err();
        assert!(
            matches!(error.error_type, ErrorType::MissingScopeField { field } if field == "sub_section")
        );
    }

    #[test]
    fn blank_coordinates_are_rejected() {
        let mut key = scope(None, None);
        key.department = "   ".to_string();

        let error = GroupTier::BatchDepartment.criteria(key).unwrap_err();
        assert!(
            matches!(error.error_type, ErrorType::MissingScopeField { field } if field == "department")
        );
    }

    #[test]
    fn batch_tier_drops_deeper_coordinates() {
        let criteria = GroupTier::BatchDepartment
            .criteria(scope(Some("A"), Some("A1")))
            .unwrap();

        assert!(criteria.section.is_none());
        assert!(criteria.sub_section.is_none());
    }

    #[async_std::test]
    async fn resolving_one_scope_twice_yields_one_conversation() {
        database_test!(|db| async move {
            let (first, _) = Conversation::resolve_scoped(
                &db,
                GroupTier::BatchDepartment,
                scope(None, None),
                "01USERA",
            )
            .await
            .unwrap();

            let (second, _) = Conversation::resolve_scoped(
                &db,
                GroupTier::BatchDepartment,
                scope(None, None),
                "01USERB",
            )
            .await
            .unwrap();

            assert_eq!(first.id(), second.id());
        });
    }

    #[async_std::test]
    async fn distinct_scopes_resolve_to_distinct_conversations() {
        database_test!(|db| async move {
            let (section_a, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(Some("A"), None), "01USER")
                    .await
                    .unwrap();

            let (section_b, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(Some("B"), None), "01USER")
                    .await
                    .unwrap();

            assert_ne!(section_a.id(), section_b.id());
        });
    }

    #[async_std::test]
    async fn tiers_do_not_share_conversations() {
        database_test!(|db| async move {
            let (batch, _) = Conversation::resolve_scoped(
                &db,
                GroupTier::BatchDepartment,
                scope(Some("A"), None),
                "01USER",
            )
            .await
            .unwrap();

            let (section, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(Some("A"), None), "01USER")
                    .await
                    .unwrap();

            assert_ne!(batch.id(), section.id());
        });
    }

    #[async_std::test]
    async fn lost_creation_race_lands_on_the_winner() {
        database_test!(|db| async move {
            let criteria = GroupTier::Section.criteria(scope(Some("A"), None)).unwrap();

            let winner = Conversation::scoped(GroupTier::Section, criteria.clone());
            db.insert_conversation(&winner).await.unwrap();

            // A direct insert into the occupied slot is rejected by the
            // storage layer...
            let loser = Conversation::scoped(GroupTier::Section, criteria);
            let error = db.insert_conversation(&loser).await.unwrap_err();
            assert!(matches!(error.error_type, ErrorType::AlreadyExists));

            // ...while resolution absorbs the conflict and returns the winner.
            let (resolved, _) =
                Conversation::resolve_scoped(&db, GroupTier::Section, scope(Some("A"), None), "01USER")
                    .await
                    .unwrap();
            assert_eq!(resolved.id(), winner.id());
        });
    }

    #[async_std::test]
    async fn resolving_twice_creates_one_membership() {
        database_test!(|db| async move {
            for _ in 0..2 {
                Conversation::resolve_scoped(
                    &db,
                    GroupTier::SubSection,
                    scope(Some("A"), Some("A1")),
                    "01USER",
                )
                .await
                .unwrap();
            }

            let memberships = db.fetch_user_memberships("01USER").await.unwrap();
            assert_eq!(memberships.len(), 1);
            assert_eq!(memberships[0].role, MembershipRole::Member);
        });
    }

    #[async_std::test]
    async fn group_creation_enrols_all_members() {
        database_test!(|db| async move {
            let group = Conversation::create_group(
                &db,
                "Study Group".to_string(),
                "01OWNER",
                vec!["01FRIEND".to_string()],
            )
            .await
            .unwrap();

            let owner = db.fetch_membership(&group.id(), "01OWNER").await.unwrap();
            assert_eq!(owner.role, MembershipRole::Admin);

            let friend = db.fetch_membership(&group.id(), "01FRIEND").await.unwrap();
            assert_eq!(friend.role, MembershipRole::Member);
        });
    }

    #[async_std::test]
    async fn opening_a_dual_conversation_is_idempotent() {
        database_test!(|db| async move {
            let first = Conversation::open_dual(&db, "01USERA", "01USERB").await.unwrap();
            let second = Conversation::open_dual(&db, "01USERA", "01USERB").await.unwrap();

            assert_eq!(first.id(), second.id());
            assert!(first.contains_user("01USERB"));
        });
    }

    #[async_std::test]
    async fn conversations_can_be_fetched_in_bulk() {
        database_test!(|db| async move {
            let (batch, _) = Conversation::resolve_scoped(
                &db,
                GroupTier::BatchDepartment,
                scope(None, None),
                "01USER",
            )
            .await
            .unwrap();

            let dual = Conversation::open_dual(&db, "01USER", "01FRIEND").await.unwrap();

            let fetched = db
                .fetch_conversations(&[batch.id(), dual.id()])
                .await
                .unwrap();
            assert_eq!(fetched.len(), 2);
        });
    }

    #[async_std::test]
    async fn page_support_conversations_are_per_user() {
        database_test!(|db| async move {
            let first = Conversation::open_page_support(&db, "01PAGE", "01USERA")
                .await
                .unwrap();
            let again = Conversation::open_page_support(&db, "01PAGE", "01USERA")
                .await
                .unwrap();
            let other = Conversation::open_page_support(&db, "01PAGE", "01USERB")
                .await
                .unwrap();

            assert_eq!(first.id(), again.id());
            assert_ne!(first.id(), other.id());
        });
    }

    #[async_std::test]
    async fn groups_can_be_renamed() {
        database_test!(|db| async move {
            let mut group = Conversation::create_group(
                &db,
                "Study Group".to_string(),
                "01OWNER",
                vec![],
            )
            .await
            .unwrap();

            group
                .update(
                    &db,
                    PartialConversation {
                        name: Some("Exam Prep".to_string()),
                        ..Default::default()
                    },
                    vec![],
                )
                .await
                .unwrap();

            let fetched = db.fetch_conversation(&group.id()).await.unwrap();
            assert!(matches!(fetched, Conversation::Group { name, .. } if name == "Exam Prep"));
        });
    }

    #[async_std::test]
    async fn cached_summaries_can_be_cleared() {
        database_test!(|db| async move {
            let (mut conversation, _) = Conversation::resolve_scoped(
                &db,
                GroupTier::BatchDepartment,
                scope(None, None),
                "01USER",
            )
            .await
            .unwrap();

            Message::send(
                &db,
                &conversation.id(),
                "01USER",
                DraftMessage {
                    content: Some("hello".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

            conversation
                .update(
                    &db,
                    Default::default(),
                    vec![FieldsConversation::LastMessage],
                )
                .await
                .unwrap();

            let fetched = db.fetch_conversation(&conversation.id()).await.unwrap();
            assert!(fetched.last_message().is_none());
        });
    }

    #[async_std::test]
    async fn leaving_a_group_keeps_the_membership_record() {
        database_test!(|db| async move {
            let mut group = Conversation::create_group(
                &db,
                "Study Group".to_string(),
                "01OWNER",
                vec!["01FRIEND".to_string()],
            )
            .await
            .unwrap();

            group.remove_user_from_group(&db, "01FRIEND").await.unwrap();
            assert!(!group.contains_user("01FRIEND"));

            let fetched = db.fetch_conversation(&group.id()).await.unwrap();
            assert!(!fetched.contains_user("01FRIEND"));

            // Read state survives for the departed user
            assert!(db.fetch_membership(&group.id(), "01FRIEND").await.is_ok());
        });
    }
}
