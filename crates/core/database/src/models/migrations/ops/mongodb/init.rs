use super::scripts::LATEST_REVISION;

use crate::mongodb::bson::doc;
use crate::MongoDb;

/// Seconds a notification lives before the expiry index removes it
pub const NOTIFICATION_EXPIRY_SECONDS: i32 = 30 * 24 * 60 * 60;

pub async fn create_database(db: &MongoDb) {
    info!("Creating database.");
    let db = db.db();

    db.create_collection("conversations")
        .await
        .expect("Failed to create conversations collection.");

    db.create_collection("chat_memberships")
        .await
        .expect("Failed to create chat_memberships collection.");

    db.create_collection("messages")
        .await
        .expect("Failed to create messages collection.");

    db.create_collection("notifications")
        .await
        .expect("Failed to create notifications collection.");

    db.create_collection("resources")
        .await
        .expect("Failed to create resources collection.");

    db.create_collection("migrations")
        .await
        .expect("Failed to create migrations collection.");

    // One conversation per institutional scope per tier; the partial filter
    // scopes each uniqueness rule to its own conversation type.
    db.run_command(doc! {
        "createIndexes": "conversations",
        "indexes": [
            {
                "key": {
                    "criteria.institution": 1_i32,
                    "criteria.department": 1_i32,
                    "criteria.session": 1_i32,
                },
                "name": "batch_department_scope",
                "unique": true,
                "partialFilterExpression": {
                    "conversation_type": "BatchDepartmentChat"
                }
            },
            {
                "key": {
                    "criteria.institution": 1_i32,
                    "criteria.department": 1_i32,
                    "criteria.session": 1_i32,
                    "criteria.section": 1_i32,
                },
                "name": "section_scope",
                "unique": true,
                "partialFilterExpression": {
                    "conversation_type": "SectionChat"
                }
            },
            {
                "key": {
                    "criteria.institution": 1_i32,
                    "criteria.department": 1_i32,
                    "criteria.session": 1_i32,
                    "criteria.section": 1_i32,
                    "criteria.sub_section": 1_i32,
                },
                "name": "sub_section_scope",
                "unique": true,
                "partialFilterExpression": {
                    "conversation_type": "SubSectionChat"
                }
            },
            {
                "key": {
                    "recipients": 1_i32
                },
                "name": "recipients"
            }
        ]
    })
    .await
    .expect("Failed to create conversations indexes.");

    db.run_command(doc! {
        "createIndexes": "chat_memberships",
        "indexes": [
            {
                "key": {
                    "_id.conversation": 1_i32,
                    "_id.user": 1_i32,
                },
                "name": "compound_id"
            },
            {
                "key": {
                    "_id.user": 1_i32,
                },
                "name": "user_id"
            }
        ]
    })
    .await
    .expect("Failed to create chat_memberships indexes.");

    db.run_command(doc! {
        "createIndexes": "messages",
        "indexes": [
            {
                "key": {
                    "conversation": 1_i32,
                    "_id": 1_i32
                },
                "name": "conversation_id_compound"
            },
            {
                "key": {
                    "sender": 1_i32
                },
                "name": "sender"
            }
        ]
    })
    .await
    .expect("Failed to create messages indexes.");

    db.run_command(doc! {
        "createIndexes": "notifications",
        "indexes": [
            {
                "key": {
                    "recipient": 1_i32,
                    "_id": -1_i32
                },
                "name": "recipient_feed"
            },
            {
                "key": {
                    "created_at": 1_i32
                },
                "name": "expiry",
                "expireAfterSeconds": NOTIFICATION_EXPIRY_SECONDS
            }
        ]
    })
    .await
    .expect("Failed to create notifications indexes.");

    db.run_command(doc! {
        "createIndexes": "resources",
        "indexes": [
            {
                "key": {
                    "target.model": 1_i32,
                    "target.id": 1_i32
                },
                "name": "target"
            },
            {
                "key": {
                    "uploader": 1_i32
                },
                "name": "uploader"
            }
        ]
    })
    .await
    .expect("Failed to create resources indexes.");

    db.collection("migrations")
        .insert_one(doc! {
            "_id": 0_i32,
            "revision": LATEST_REVISION
        })
        .await
        .expect("Failed to save migration info.");

    info!("Created database.");
}
