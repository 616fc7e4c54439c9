use crate::utils::error::{GatewayError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// 呼叫 REST API 所需的專案與 bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub project: String,
    pub access_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project", &self.project)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct KeyFile {
    project_id: Option<String>,
    access_token: Option<String>,
    client_email: Option<String>,
}

/// 憑證來源：金鑰檔路徑，以及環境變數的覆寫值
#[derive(Debug, Clone, Default)]
pub struct CredentialSource {
    pub key_path: Option<PathBuf>,
    pub access_token: Option<String>,
    pub project: Option<String>,
}

impl CredentialSource {
    pub fn resolve(&self) -> Result<Credentials> {
        let key_file = match &self.key_path {
            Some(path) => Some(read_key_file(path)?),
            None => None,
        };

        if let Some(email) = key_file.as_ref().and_then(|k| k.client_email.as_deref()) {
            tracing::debug!("🔑 Using service account {}", email);
        }

        let project = self
            .project
            .clone()
            .or_else(|| key_file.as_ref().and_then(|k| k.project_id.clone()))
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| GatewayError::MissingConfigError {
                field: "GEE_PROJECT (or project_id in the service account key)".to_string(),
            })?;

        let access_token = self
            .access_token
            .clone()
            .or_else(|| key_file.and_then(|k| k.access_token))
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GatewayError::MissingConfigError {
                field: "GEE_ACCESS_TOKEN (or access_token in the service account key)".to_string(),
            })?;

        Ok(Credentials {
            project,
            access_token,
        })
    }
}

fn read_key_file(path: &Path) -> Result<KeyFile> {
    if !path.exists() {
        return Err(GatewayError::ConfigError {
            message: format!("Credential file not found: {}", path.display()),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let key: KeyFile = serde_json::from_str(&content)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn key_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_from_key_file() {
        let file = key_file(
            r#"{"project_id": "forest-watch", "access_token": "ya29.abc", "client_email": "svc@forest-watch.iam"}"#,
        );
        let source = CredentialSource {
            key_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let creds = source.resolve().unwrap();
        assert_eq!(creds.project, "forest-watch");
        assert_eq!(creds.access_token, "ya29.abc");
    }

    #[test]
    fn test_env_overrides_key_file() {
        let file = key_file(r#"{"project_id": "from-file", "access_token": "file-token"}"#);
        let source = CredentialSource {
            key_path: Some(file.path().to_path_buf()),
            access_token: Some("env-token".to_string()),
            project: Some("env-project".to_string()),
        };

        let creds = source.resolve().unwrap();
        assert_eq!(creds.project, "env-project");
        assert_eq!(creds.access_token, "env-token");
    }

    #[test]
    fn test_missing_token_is_error() {
        let file = key_file(r#"{"project_id": "p"}"#);
        let source = CredentialSource {
            key_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(
            source.resolve(),
            Err(GatewayError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_error() {
        let source = CredentialSource {
            key_path: Some(PathBuf::from("/nonexistent/key.json")),
            ..Default::default()
        };
        assert!(matches!(source.resolve(), Err(GatewayError::ConfigError { .. })));
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials {
            project: "p".to_string(),
            access_token: "secret".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}
