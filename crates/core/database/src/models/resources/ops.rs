use campus_result::Result;

use crate::{Resource, TargetRef};

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractResources: Sync + Send {
    /// Insert a new resource into the database
    async fn insert_resource(&self, resource: &Resource) -> Result<()>;

    /// Fetch a resource by its id
    async fn fetch_resource(&self, id: &str) -> Result<Resource>;

    /// Fetch all resources attached to a target
    async fn fetch_target_resources<'a>(&self, target: &TargetRef) -> Result<Vec<Resource>>;

    /// Delete a resource by its id
    async fn delete_resource(&self, id: &str) -> Result<()>;
}
