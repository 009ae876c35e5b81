use campus_config::config;
use campus_result::Result;
use ulid::Ulid;

use crate::Database;

auto_derived!(
    /// Kind of stored file
    #[derive(Copy)]
    pub enum AttachmentKind {
        Image,
        Video,
        Audio,
        Document,
        Archive,
        Other,
    }

    /// Closed set of models a resource may be attached to
    #[derive(Copy)]
    pub enum TargetModel {
        Room,
        Group,
    }

    /// Reference to the record a resource belongs to
    pub struct TargetRef {
        pub model: TargetModel,
        pub id: String,
    }

    /// Stored file reference
    pub struct Resource {
        /// Unique Id
        #[serde(rename = "_id")]
        pub id: String,
        /// Original file name
        pub name: String,
        /// Where the file is served from
        pub url: String,
        /// Kind of file
        pub kind: AttachmentKind,
        /// Size in bytes
        pub size: usize,
        /// Id of the user who uploaded the file
        pub uploader: String,
        /// Record this resource belongs to
        pub target: TargetRef,
        /// Post this resource originated from, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        pub post: Option<String>,
    }
);

impl TargetModel {
    /// Collection holding the owning record
    pub fn collection(&self) -> &'static str {
        match self {
            TargetModel::Room => "rooms",
            TargetModel::Group => "groups",
        }
    }
}

impl Resource {
    /// Store a new resource reference
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &Database,
        uploader: &str,
        target: TargetRef,
        name: String,
        url: String,
        kind: AttachmentKind,
        size: usize,
        post: Option<String>,
    ) -> Result<Resource> {
        let max = config().await.features.limits.resource_size;
        if size > max {
            return Err(create_error!(FailedValidation {
                error: format!("resource exceeds maximum size of {max} bytes")
            }));
        }

        let resource = Resource {
            id: Ulid::new().to_string(),
            name,
            url,
            kind,
            size,
            uploader: uploader.to_string(),
            target,
            post,
        };

        db.insert_resource(&resource).await?;

        Ok(resource)
    }

    /// Delete this resource reference
    pub async fn delete(&self, db: &Database) -> Result<()> {
        db.delete_resource(&self.id).await
    }
}

#[cfg(test)]
mod tests {
    use campus_result::ErrorType;

    use crate::{AttachmentKind, Resource, TargetModel, TargetRef};

    fn room_target() -> TargetRef {
        TargetRef {
            model: TargetModel::Room,
            id: "01ROOM".to_string(),
        }
    }

    #[test]
    fn target_models_dispatch_to_their_collections() {
        assert_eq!(TargetModel::Room.collection(), "rooms");
        assert_eq!(TargetModel::Group.collection(), "groups");
    }

    #[async_std::test]
    async fn resources_are_listed_per_target() {
        database_test!(|db| async move {
            Resource::create(
                &db,
                "01UPLOADER",
                room_target(),
                "syllabus.pdf".to_string(),
                "https://files.example/syllabus.pdf".to_string(),
                AttachmentKind::Document,
                102_400,
                None,
            )
            .await
            .unwrap();

            Resource::create(
                &db,
                "01UPLOADER",
                TargetRef {
                    model: TargetModel::Group,
                    id: "01GROUP".to_string(),
                },
                "cover.png".to_string(),
                "https://files.example/cover.png".to_string(),
                AttachmentKind::Image,
                52_100,
                Some("01POST".to_string()),
            )
            .await
            .unwrap();

            let room_files = db.fetch_target_resources(&room_target()).await.unwrap();
            assert_eq!(room_files.len(), 1);
            assert_eq!(room_files[0].name, "syllabus.pdf");
        });
    }

    #[async_std::test]
    async fn oversized_resources_are_rejected() {
        database_test!(|db| async move {
            let error = Resource::create(
                &db,
                "01UPLOADER",
                room_target(),
                "lecture.mp4".to_string(),
                "https://files.example/lecture.mp4".to_string(),
                AttachmentKind::Video,
                usize::MAX,
                None,
            )
            .await
            .unwrap_err();

            assert!(matches!(error.error_type, ErrorType::FailedValidation { .. }));
        });
    }

    #[async_std::test]
    async fn deleted_resources_disappear() {
        database_test!(|db| async move {
            let resource = Resource::create(
                &db,
                "01UPLOADER",
                room_target(),
                "syllabus.pdf".to_string(),
                "https://files.example/syllabus.pdf".to_string(),
                AttachmentKind::Document,
                102_400,
                None,
            )
            .await
            .unwrap();

            resource.delete(&db).await.unwrap();

            assert!(db.fetch_resource(&resource.id).await.is_err());
        });
    }
}
