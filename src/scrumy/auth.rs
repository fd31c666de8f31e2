//! Scrumy Authentication
//!
//! Scrumy uses HTTP basic auth with the project name as the user and the
//! project password as the secret.

use std::fmt;

/// Environment variable holding the default project
pub const PROJECT_ENV: &str = "SCRUMY_PROJECT";

/// Environment variable holding the project password
pub const PASSWORD_ENV: &str = "SCRUMY_PASSWORD";

/// Project/password pair sent with every request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub project: String,
    password: String,
}

impl Credentials {
    pub fn new(project: &str, password: &str) -> Self {
        Self {
            project: project.to_string(),
            password: password.to_string(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// Security: never print the password, even in debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project", &self.project)
            .field("password", &"********")
            .finish()
    }
}

/// Validate a Scrumy project name
/// Project names become URL path segments, so only URL-safe characters are allowed
pub fn validate_project(project: &str) -> bool {
    !project.is_empty()
        && project
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Read the default project from the environment
pub fn get_default_project() -> Option<String> {
    if let Ok(project) = std::env::var(PROJECT_ENV) {
        if validate_project(&project) {
            return Some(project);
        }
        tracing::warn!("Ignoring invalid {} value", PROJECT_ENV);
    }
    None
}

/// Read the project password from the environment
pub fn get_default_password() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty())
}
