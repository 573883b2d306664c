use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// SDK directory; engine settings live in `<sdk_path>/models/`.
    pub sdk_path: PathBuf,
    /// Flat gallery used by `enroll` and `search` when none is given.
    pub gallery_path: PathBuf,
    /// Number of candidates `search` returns when `-k` is not given.
    pub search_limit: usize,
}

impl Config {
    /// Load configuration from `JANUS_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("janus");

        let sdk_path = std::env::var("JANUS_SDK_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.clone());

        let gallery_path = std::env::var("JANUS_GALLERY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("gallery.bin"));

        Self {
            sdk_path,
            gallery_path,
            search_limit: env_usize("JANUS_SEARCH_LIMIT", 10),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
