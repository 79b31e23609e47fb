/// Server settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: String,
    pub seed_demo: bool,
}

pub const DEFAULT_DB_PATH: &str = "trustshop.db";

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig { db_path: DEFAULT_DB_PATH.to_string(), seed_demo: false }
    }
}

impl AppConfig {
    /// Loads `.env` if there is one, then reads `TRUSTSHOP_*` variables.
    #[cfg(feature = "ssr")]
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            leptos::logging::log!("[CONFIG] Loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            db_path: lookup("TRUSTSHOP_DB_PATH")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.db_path),
            seed_demo: lookup("TRUSTSHOP_SEED_DEMO").is_some_and(|v| is_truthy(&v)),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
