use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub auth: AuthSettings,
}

/// Token and credential settings.
///
/// Everything except the signing secret has a sensible default, so a
/// minimal configuration file only needs to provide `auth.secret`.
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub secret: String,
    /// Lifetime of access tokens, in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
    /// Lifetime of refresh tokens, in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    /// bcrypt work factor used when hashing new passwords.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_access_token_expiry() -> i64 {
    600
}

fn default_refresh_token_expiry() -> i64 {
    86_400
}

fn default_issuer() -> String {
    "marquee-movie-api".to_string()
}

fn default_audience() -> String {
    "marquee-users".to_string()
}

fn default_bcrypt_cost() -> u32 {
    12
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .build()?;
    settings.try_deserialize::<Settings>()
}
