mod chat_memberships;
mod conversations;
mod messages;
mod migrations;
mod notifications;
mod resources;

pub use chat_memberships::*;
pub use conversations::*;
pub use messages::*;
pub use migrations::*;
pub use notifications::*;
pub use resources::*;

use crate::{Database, ReferenceDb};

#[cfg(feature = "mongodb")]
use crate::MongoDb;

pub trait AbstractDatabase:
    Sync
    + Send
    + chat_memberships::AbstractChatMemberships
    + conversations::AbstractConversations
    + messages::AbstractMessages
    + migrations::AbstractMigrations
    + notifications::AbstractNotifications
    + resources::AbstractResources
{
}

impl AbstractDatabase for ReferenceDb {}

#[cfg(feature = "mongodb")]
impl AbstractDatabase for MongoDb {}

impl std::ops::Deref for Database {
    type Target = dyn AbstractDatabase;

    fn deref(&self) -> &Self::Target {
        match &self {
            Database::Reference(dummy) => dummy,
            #[cfg(feature = "mongodb")]
            Database::MongoDb(mongo) => mongo,
        }
    }
}
