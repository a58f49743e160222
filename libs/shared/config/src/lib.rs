use std::env;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStoreKind {
    Supabase,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub server_port: u16,
    pub record_store: RecordStoreKind,
    pub serialize_slot_bookings: bool,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or_else(|| {
                    warn!("SERVER_PORT not set or invalid, using default 3000");
                    3000
                }),
            record_store: match env::var("RECORD_STORE").as_deref() {
                Ok("memory") => RecordStoreKind::Memory,
                Ok("supabase") | Err(_) => RecordStoreKind::Supabase,
                Ok(other) => {
                    warn!("Unknown RECORD_STORE '{}', using supabase", other);
                    RecordStoreKind::Supabase
                }
            },
            serialize_slot_bookings: env::var("SERIALIZE_SLOT_BOOKINGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok()
                .filter(|origin| !origin.is_empty()),
        };

        if config.record_store == RecordStoreKind::Supabase && !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
