use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::AccessError;

/// The single admin account. Stored as plaintext; the secret wrapper only
/// keeps the password out of `Debug` output and logs.
#[derive(Clone, Debug)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: SecretString::from(password.into()) }
    }

    fn matches(&self, candidate: &Credential) -> bool {
        self.username == candidate.username
            && self.password.expose_secret() == candidate.password.expose_secret()
    }
}

#[derive(Clone, Debug)]
pub struct AccessGate {
    path: PathBuf,
}

impl AccessGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.storage.credentials_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_credentials(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces whatever account is stored at `path` with `credential`:
    /// username on the first line, password on the second.
    pub fn signup(path: impl AsRef<Path>, credential: &Credential) -> Result<(), AccessError> {
        let path = path.as_ref();
        let body =
            format!("{}\n{}\n", credential.username, credential.password.expose_secret());
        fs::write(path, body)
            .map_err(|source| AccessError::Write { path: path.to_path_buf(), source })?;

        info!(
            event_name = "access.signup",
            path = %path.display(),
            username = %credential.username,
            "admin credentials stored"
        );
        Ok(())
    }

    /// `Ok(false)` when nothing has been stored yet or either field differs.
    pub fn login(&self, candidate: &Credential) -> Result<bool, AccessError> {
        let Some(stored) = self.stored()? else {
            warn!(
                event_name = "access.login",
                path = %self.path.display(),
                "credentials file missing"
            );
            return Ok(false);
        };

        let granted = stored.matches(candidate);
        info!(
            event_name = "access.login",
            username = %candidate.username,
            granted,
            "login attempt"
        );
        Ok(granted)
    }

    pub fn stored(&self) -> Result<Option<Credential>, AccessError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AccessError::Read { path: self.path.clone(), source });
            }
        };

        let mut lines = raw.lines();
        let username = lines.next().unwrap_or_default();
        let password = lines.next().unwrap_or_default();
        Ok(Some(Credential::new(username, password)))
    }
}
