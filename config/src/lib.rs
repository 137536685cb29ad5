pub mod paths;
pub mod profile;
pub mod settings;

pub use paths::PathManager;
pub use profile::{Profile, RoleStart};
pub use settings::{Settings, VoiceSettings};

/// Load environment variables from .env files.
/// First loads from ~/.env (home directory), then from ./.env (project directory).
/// Project directory values take precedence over home directory values.
/// Call this before parsing CLI args to ensure env vars are available.
pub fn load_env_file() {
    if let Some(home) = dirs::home_dir() {
        let home_env_path = home.join(".env");
        dotenv::from_path(home_env_path).ok();
    }

    // dotenv::dotenv() loads from current directory's .env
    dotenv::dotenv().ok();
}
