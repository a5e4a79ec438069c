use log::info;
use std::io;
use std::path::{Path, PathBuf};

const STAGING_DIR_NAME: &str = "weather_etl";

/// `<system cache dir>/weather_etl`, if the platform has a cache directory.
pub fn default_staging_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join(STAGING_DIR_NAME))
}

/// Creates `path` if missing. Fails if it exists but is not a directory.
pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists but is not a directory", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating staging directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}
