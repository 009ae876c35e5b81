use serde::{Deserialize, Serialize};

use crate::mongodb::bson::{doc, from_document, Document};
use crate::MongoDb;

use super::init::NOTIFICATION_EXPIRY_SECONDS;

#[derive(Serialize, Deserialize)]
struct MigrationInfo {
    _id: i32,
    revision: i32,
}

pub const LATEST_REVISION: i32 = 2; // MUST BE +1 to last migration

pub async fn migrate_database(db: &MongoDb) {
    let migrations = db.col::<Document>("migrations");
    let data = migrations
        .find_one(doc! {})
        .await
        .expect("Failed to fetch migration data.");

    if let Some(doc) = data {
        let info: MigrationInfo =
            from_document(doc).expect("Failed to read migration information.");

        let revision = run_migrations(db, info.revision).await;

        migrations
            .update_one(
                doc! {
                    "_id": info._id
                },
                doc! {
                    "$set": {
                        "revision": revision
                    }
                },
            )
            .await
            .expect("Failed to commit migration information.");

        info!("Migration complete. Currently at revision {}.", revision);
    } else {
        panic!("Database was configured incorrectly, possibly because initialisation failed.")
    }
}

pub async fn run_migrations(db: &MongoDb, revision: i32) -> i32 {
    info!("Starting database migration.");

    if revision <= 0 {
        info!("Running migration [revision 0]: Test migration system.");
    }

    if revision <= 1 {
        info!("Running migration [revision 1 / 2025-06-14]: Expire notifications after 30 days.");

        db.db()
            .run_command(doc! {
                "createIndexes": "notifications",
                "indexes": [
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
            .expect("Failed to create notification expiry index.");
    }

    // Reminder: update LATEST_REVISION when adding new migrations.
    LATEST_REVISION
}
