use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Token lifetime in seconds.
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// Accepted `aud` values for incoming ID tokens.
    pub client_ids: Vec<String>,
    pub tokeninfo_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub base_url: String,
    pub sender: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub google: GoogleConfig,
    pub mail: MailConfig,
    pub upload_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "tradehub".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "tradehub-users".into()),
            ttl_seconds: std::env::var("TOKEN_EXPIRES_IN")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(360000),
        };
        let google = GoogleConfig {
            client_ids: std::env::var("GOOGLE_CLIENT_IDS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| {
                    vec![
                        "547688133294-d6796j2jnlg52re5hu06u7lm2r4a4bpo.apps.googleusercontent.com"
                            .into(),
                        "547688133294-5mes9stlriso8hk7ed2i2s1e1h3olc6c.apps.googleusercontent.com"
                            .into(),
                    ]
                }),
            tokeninfo_url: std::env::var("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/tokeninfo".into()),
        };
        let mail = MailConfig {
            base_url: std::env::var("MAIL_BASE_URL")
                .unwrap_or_else(|_| "https://api.postmarkapp.com".into()),
            sender: std::env::var("MAIL_SENDER").unwrap_or_else(|_| "noreply@tradehub.app".into()),
            token: std::env::var("MAIL_TOKEN").unwrap_or_default(),
        };
        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| ".sandbox".into());

        Ok(Self {
            database_url,
            jwt,
            google,
            mail,
            upload_dir,
        })
    }
}
