use clap::Parser;

/// Process configuration. Every field can be set by flag or environment
/// variable; there is no runtime reload.
#[derive(Parser, Debug, Clone)]
#[command(name = "amoria-server")]
#[command(about = "Amoria conversation-core server")]
pub struct Settings {
    #[arg(long, env = "AMORIA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "AMORIA_PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "AMORIA_DB", default_value = "amoria.db")]
    pub db: String,

    /// HS256 secret used to validate bearer tokens. Token issuance lives
    /// in the account service, not here.
    #[arg(long, env = "AMORIA_JWT_SECRET")]
    pub jwt_secret: String,

    /// Optional JSON file with character definitions; built-in defaults
    /// are used when absent.
    #[arg(long, env = "AMORIA_CHARACTERS")]
    pub characters: Option<String>,

    #[arg(long, env = "AMORIA_POOL_SIZE")]
    pub pool_size: Option<u32>,

    #[arg(long, env = "SAFE_ENGINE_API_KEY", default_value = "")]
    pub safe_api_key: String,

    #[arg(long, env = "SAFE_ENGINE_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub safe_base_url: String,

    #[arg(long, env = "SAFE_ENGINE_MODEL", default_value = "gpt-4o-mini")]
    pub safe_model: String,

    #[arg(long, env = "ADULT_ENGINE_API_KEY", default_value = "")]
    pub adult_api_key: String,

    #[arg(long, env = "ADULT_ENGINE_BASE_URL", default_value = "https://api.x.ai/v1")]
    pub adult_base_url: String,

    #[arg(long, env = "ADULT_ENGINE_MODEL", default_value = "grok-3")]
    pub adult_model: String,
}

impl Settings {
    /// max(4, 4·CPU), capped at 32.
    pub fn effective_pool_size(&self) -> u32 {
        self.pool_size.unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(1);
            (4 * cpus).max(4).min(32)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_override_wins() {
        let settings = Settings::parse_from([
            "amoria-server",
            "--jwt-secret",
            "s",
            "--pool-size",
            "7",
        ]);
        assert_eq!(settings.effective_pool_size(), 7);
    }

    #[test]
    fn pool_size_default_is_bounded() {
        let settings = Settings::parse_from(["amoria-server", "--jwt-secret", "s"]);
        let size = settings.effective_pool_size();
        assert!((4..=32).contains(&size));
    }
}
