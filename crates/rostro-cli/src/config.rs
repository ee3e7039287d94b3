use rostro_engine::Settings;
use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Path to the SQLite enrollment database.
    pub db_path: PathBuf,
    /// Pipeline parameters for the verification path.
    pub settings: Settings,
}

impl Config {
    /// Load configuration from `ROSTRO_*` environment variables with
    /// defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("rostro");

        let db_path = std::env::var("ROSTRO_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("enrollments.db"));

        let defaults = Settings::default();
        Self {
            db_path,
            settings: Settings {
                sample_side: env_u32("ROSTRO_SAMPLE_SIDE", defaults.sample_side),
                block_side: env_u32("ROSTRO_BLOCK_SIDE", defaults.block_side),
                max_distance: env_f32("ROSTRO_MAX_DISTANCE", defaults.max_distance),
                threshold: env_f32("ROSTRO_THRESHOLD", defaults.threshold),
            },
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
