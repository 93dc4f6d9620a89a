use crate::api;
use crate::api::email::{EmailSender, LogEmailSender, SmtpEmailSender};
use crate::api::handlers::auth::{AuthConfig, AuthState, NoopRateLimiter};
use crate::cli::actions::Action;
use anyhow::{Context, Result};
use std::sync::Arc;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            access_secret,
            access_expiry_secs,
            refresh_secret,
            refresh_expiry_secs,
            smtp_url,
            smtp_from,
        } => {
            // Fail early on malformed connection strings.
            Url::parse(&dsn).context("Invalid database connection string")?;

            let config = AuthConfig::new(access_secret, refresh_secret)
                .with_access_expiry_secs(access_expiry_secs)
                .with_refresh_expiry_secs(refresh_expiry_secs);

            let mailer: Arc<dyn EmailSender> = match smtp_url {
                Some(url) => Arc::new(
                    SmtpEmailSender::new(&url, &smtp_from)
                        .context("Failed to build SMTP transport")?,
                ),
                None => Arc::new(LogEmailSender),
            };

            let state = Arc::new(AuthState::new(config, Arc::new(NoopRateLimiter)));

            api::new(port, dsn, state, mailer).await?;
        }
    }

    Ok(())
}
