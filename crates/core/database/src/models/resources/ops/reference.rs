use campus_result::Result;

use crate::{ReferenceDb, Resource, TargetRef};

use super::AbstractResources;

#[async_trait]
impl AbstractResources for ReferenceDb {
    /// Insert a new resource into the database
    async fn insert_resource(&self, resource: &Resource) -> Result<()> {
        let mut resources = self.resources.lock().await;
        if resources.contains_key(&resource.id) {
            Err(create_database_error!("insert", "resource"))
        } else {
            resources.insert(resource.id.to_string(), resource.clone());
            Ok(())
        }
    }

    /// Fetch a resource by its id
    async fn fetch_resource(&self, id: &str) -> Result<Resource> {
        let resources = self.resources.lock().await;
        resources
            .get(id)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all resources attached to a target
    async fn fetch_target_resources<'a>(&self, target: &TargetRef) -> Result<Vec<Resource>> {
        let resources = self.resources.lock().await;
        Ok(resources
            .values()
            .filter(|resource| &resource.target == target)
            .cloned()
            .collect())
    }

    /// Delete a resource by its id
    async fn delete_resource(&self, id: &str) -> Result<()> {
        let mut resources = self.resources.lock().await;
        if resources.remove(id).is_some() {
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
