use bson::to_bson;

use campus_result::Result;

use crate::{MongoDb, Resource, TargetRef};

use super::AbstractResources;

static COL: &str = "resources";

#[async_trait]
impl AbstractResources for MongoDb {
    /// Insert a new resource into the database
    async fn insert_resource(&self, resource: &Resource) -> Result<()> {
        query!(self, insert_one, COL, &resource).map(|_| ())
    }

    /// Fetch a resource by its id
    async fn fetch_resource(&self, id: &str) -> Result<Resource> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all resources attached to a target
    async fn fetch_target_resources<'a>(&self, target: &TargetRef) -> Result<Vec<Resource>> {
        query!(
            self,
            find,
            COL,
            doc! {
                "target.model": to_bson(&target.model)
                    .map_err(|_| create_database_error!("to_bson", COL))?,
                "target.id": &target.id
            }
        )
    }

    /// Delete a resource by its id
    async fn delete_resource(&self, id: &str) -> Result<()> {
        query!(self, delete_one_by_id, COL, id).map(|_| ())
    }
}
