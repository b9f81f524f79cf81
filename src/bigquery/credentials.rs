//! Credential selection for the BigQuery client.
//!
//! An explicit key file wins. Without one, the gcloud application default
//! credentials file is used when present, then the library's default chain
//! (`GOOGLE_APPLICATION_CREDENTIALS`, then the metadata server).

use crate::error::{BqError, BqResult};
use gcp_bigquery_client::Client;
use gcp_bigquery_client::client_builder::ClientBuilder;
use gcp_bigquery_client::error::BQError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const GCLOUD_ADC_FILE: &str = "application_default_credentials.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Service account key file
    ServiceAccountKey(PathBuf),
    /// User credentials, as written by `gcloud auth application-default login`
    AuthorizedUser(PathBuf),
    /// Whatever the environment provides
    ApplicationDefault,
}

#[derive(Deserialize)]
struct KeyFileHeader {
    #[serde(rename = "type")]
    kind: String,
}

impl Credentials {
    /// Pick credentials for an optional explicit key file.
    pub fn resolve(explicit: Option<&Path>) -> BqResult<Self> {
        Self::resolve_with(explicit, gcloud_adc_file())
    }

    fn resolve_with(explicit: Option<&Path>, gcloud_file: Option<PathBuf>) -> BqResult<Self> {
        if let Some(path) = explicit {
            return Self::from_key_file(path);
        }
        match gcloud_file.filter(|p| p.is_file()) {
            Some(path) => Self::from_key_file(&path),
            None => Ok(Self::ApplicationDefault),
        }
    }

    /// Classify a key file by its `type` field.
    pub fn from_key_file(path: &Path) -> BqResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BqError::configuration(format!(
                "Cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        let header: KeyFileHeader = serde_json::from_str(&raw).map_err(|e| {
            BqError::configuration(format!(
                "Credentials file {} is not a key file: {}",
                path.display(),
                e
            ))
        })?;

        match header.kind.as_str() {
            "service_account" => Ok(Self::ServiceAccountKey(path.to_path_buf())),
            "authorized_user" => Ok(Self::AuthorizedUser(path.to_path_buf())),
            other => Err(BqError::configuration(format!(
                "Unsupported credential type '{}' in {}",
                other,
                path.display()
            ))),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceAccountKey(_) => "service_account",
            Self::AuthorizedUser(_) => "authorized_user",
            Self::ApplicationDefault => "application_default",
        }
    }

    /// The key file in use, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ServiceAccountKey(path) | Self::AuthorizedUser(path) => Some(path),
            Self::ApplicationDefault => None,
        }
    }

    /// Authenticate and build a library client.
    pub async fn build(&self) -> Result<Client, BQError> {
        let builder = ClientBuilder::new();
        match self {
            Self::ServiceAccountKey(path) => {
                builder
                    .build_from_service_account_key_file(&path.to_string_lossy())
                    .await
            }
            Self::AuthorizedUser(path) => {
                builder
                    .build_from_authorized_user_authenticator(path)
                    .await
            }
            Self::ApplicationDefault => builder.build_from_application_default_credentials().await,
        }
    }
}

/// Location of the gcloud application default credentials file.
fn gcloud_adc_file() -> Option<PathBuf> {
    let dir = match std::env::var_os("CLOUDSDK_CONFIG") {
        Some(dir) => PathBuf::from(dir),
        None if cfg!(windows) => PathBuf::from(std::env::var_os("APPDATA")?).join("gcloud"),
        None => PathBuf::from(std::env::var_os("HOME")?)
            .join(".config")
            .join("gcloud"),
    };
    Some(dir.join(GCLOUD_ADC_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_key(dir: &Path, name: &str, kind: &str) -> PathBuf {
        let path = dir.join(name);
        let body = json!({ "type": kind, "client_email": "svc@proj.iam.gserviceaccount.com" });
        std::fs::write(&path, body.to_string()).unwrap();
        path
    }

    #[test]
    fn test_explicit_service_account_file() {
        let dir = tempfile::tempdir().unwrap();
        let key = write_key(dir.path(), "sa.json", "service_account");

        let creds = Credentials::resolve_with(Some(&key), None).unwrap();
        assert_eq!(creds, Credentials::ServiceAccountKey(key.clone()));
        assert_eq!(creds.kind(), "service_account");
        assert_eq!(creds.path(), Some(key.as_path()));
    }

    #[test]
    fn test_explicit_file_wins_over_gcloud_file() {
        let dir = tempfile::tempdir().unwrap();
        let key = write_key(dir.path(), "sa.json", "service_account");
        let user = write_key(dir.path(), GCLOUD_ADC_FILE, "authorized_user");

        let creds = Credentials::resolve_with(Some(&key), Some(user)).unwrap();
        assert_eq!(creds, Credentials::ServiceAccountKey(key));
    }

    #[test]
    fn test_gcloud_user_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let user = write_key(dir.path(), GCLOUD_ADC_FILE, "authorized_user");

        let creds = Credentials::resolve_with(None, Some(user.clone())).unwrap();
        assert_eq!(creds, Credentials::AuthorizedUser(user));
    }

    #[test]
    fn test_falls_back_to_default_chain() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(GCLOUD_ADC_FILE);

        let creds = Credentials::resolve_with(None, Some(missing)).unwrap();
        assert_eq!(creds, Credentials::ApplicationDefault);
        assert!(creds.path().is_none());

        let creds = Credentials::resolve_with(None, None).unwrap();
        assert_eq!(creds.kind(), "application_default");
    }

    #[test]
    fn test_unreadable_key_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");

        let err = Credentials::resolve_with(Some(&missing), None).unwrap_err();
        assert_eq!(err.error_type(), "ConfigurationError");
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_rejects_unknown_credential_type() {
        let dir = tempfile::tempdir().unwrap();
        let key = write_key(dir.path(), "ext.json", "external_account");

        let err = Credentials::from_key_file(&key).unwrap_err();
        assert!(err.to_string().contains("external_account"));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(Credentials::from_key_file(&garbage).is_err());
    }
}
