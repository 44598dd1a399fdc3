//! Server configuration from command-line flags and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::corpus::DEFAULT_EXTENSIONS;
use crate::db::Database;

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the images to review
    #[arg(long, env = "SWIPE_IMAGES_DIR", default_value = "../test_image")]
    pub images_dir: PathBuf,

    /// Directory holding one `<image>.txt` result file per image
    #[arg(long, env = "SWIPE_RESULTS_DIR", default_value = "../test_result")]
    pub results_dir: PathBuf,

    /// SQLite database for labels and progress (defaults to the user data dir)
    #[arg(long, env = "SWIPE_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Static frontend served for paths outside /api and /images
    #[arg(long, env = "SWIPE_FRONTEND_DIR")]
    pub frontend_dir: Option<PathBuf>,

    /// Image file extensions to include, comma-separated
    #[arg(
        long,
        env = "SWIPE_IMAGE_EXTENSIONS",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect::<Vec<_>>()
    )]
    pub image_extensions: Vec<String>,

    /// How long a storage call may wait on a locked database
    #[arg(long, env = "SWIPE_STORAGE_TIMEOUT_MS", default_value = "5000")]
    pub storage_timeout_ms: u64,

    #[arg(long, env = "SWIPE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "SWIPE_PORT", default_value = "8080")]
    pub port: u16,
}

impl ServerConfig {
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn open_database(&self) -> Result<Database> {
        let path = match &self.db_path {
            Some(path) => path.clone(),
            None => Database::default_path()?,
        };
        tracing::info!("Using database at {}", path.display());
        let db = Database::open_with_timeout(path, self.storage_timeout())?;
        db.migrate()?;
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn parses_extension_list_and_timeout() {
        let wrapper = Wrapper::parse_from([
            "swipe",
            "--images-dir",
            "/data/img",
            "--image-extensions",
            "jpg,webp",
            "--storage-timeout-ms",
            "250",
        ]);

        assert_eq!(wrapper.config.images_dir, PathBuf::from("/data/img"));
        assert_eq!(wrapper.config.image_extensions, vec!["jpg", "webp"]);
        assert_eq!(wrapper.config.storage_timeout(), Duration::from_millis(250));
    }
}
