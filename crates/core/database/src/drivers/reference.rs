use std::{collections::HashMap, sync::Arc};

use futures::lock::Mutex;

use crate::{ChatMembership, Conversation, MembershipCompositeKey, Message, Notification, Resource};

database_derived!(
    /// Reference implementation
    #[derive(Default)]
    pub struct ReferenceDb {
        pub conversations: Arc<Mutex<HashMap<String, Conversation>>>,
        pub chat_memberships: Arc<Mutex<HashMap<MembershipCompositeKey, ChatMembership>>>,
        pub messages: Arc<Mutex<HashMap<String, Message>>>,
        pub notifications: Arc<Mutex<HashMap<String, Notification>>>,
        pub resources: Arc<Mutex<HashMap<String, Resource>>>,
    }
);
