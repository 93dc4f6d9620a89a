pub mod server;

use secrecy::SecretString;

/// Actions resolved from the command line.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        access_secret: SecretString,
        access_expiry_secs: i64,
        refresh_secret: SecretString,
        refresh_expiry_secs: i64,
        smtp_url: Option<String>,
        smtp_from: String,
    },
}
