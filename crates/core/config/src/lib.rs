use cached::proc_macro::cached;
use config::{Config, File, FileFormat};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG_BUILDER: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new({
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../Campus.toml"),
            FileFormat::Toml,
        ));

        if std::path::Path::new("Campus.toml").exists() {
            builder = builder.add_source(File::new("Campus.toml", FileFormat::Toml));
        }

        builder.build().unwrap()
    })
});

#[derive(Deserialize, Debug, Clone)]
pub struct Database {
    pub mongodb: String,
    pub database_name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FeaturesLimits {
    /// Maximum length of a message in characters
    pub message_length: usize,
    /// Maximum number of attachments on a single message
    pub message_attachments: usize,
    /// Maximum number of members in a group conversation
    pub group_size: usize,
    /// Maximum size of an uploaded resource in bytes
    pub resource_size: usize,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Features {
    pub limits: FeaturesLimits,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub database: Database,
    pub features: Features,
}

pub async fn init() {
    println!(
        ":: Campus Configuration ::\n\x1b[32m{:?}\x1b[0m",
        config().await
    );
}

pub async fn read() -> Config {
    CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 30)]
pub async fn config() -> Settings {
    read().await.try_deserialize::<Settings>().unwrap()
}

#[cfg(feature = "test")]
#[cfg(test)]
mod tests {
    use crate::init;

    #[async_std::test]
    async fn it_works() {
        init().await;
    }
}
