use core_config::{app_info, env_required, server::ServerConfig, AppInfo, FromEnv};

pub use core_config::Environment;

/// Application-specific configuration.
///
/// Provider settings are not part of it: each facade loads its own when
/// [`crate::state::AppState`] is built.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Operator address for unhandled-error reports (`ERROR_NOTIFICATION_EMAIL`).
    pub error_notification_email: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let error_notification_email = env_required("ERROR_NOTIFICATION_EMAIL")?;

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            error_notification_email,
        })
    }
}
