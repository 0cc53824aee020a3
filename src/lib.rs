//! Diagnostic probe for the Azure App Service "list function secrets" management API.
//!
//! The probe acquires a bearer token (from the Azure CLI, a service principal or a fixed value),
//! calls `listsecrets` for a single function and reports which documented response fields
//! came back unpopulated.
//!
//! # Examples
//!
//! ```no_run
//! use function_secrets_probe::{Credential, WebSiteManagementClient};
//!
//! # async fn run() -> Result<(), function_secrets_probe::ProbeError> {
//! let client = WebSiteManagementClient::new("00000000-0000-0000-0000-000000000000", Credential::bearer("token"));
//! let secrets = client.list_function_secrets("my-rg", "my-site", "my-function").await?;
//! println!("{:?}", secrets.name());
//! # Ok(())
//! # }
//! ```

mod client;
mod command;
mod credential;
mod function;
mod probe;
mod report;

pub use client::{WebSiteManagementClient, PUBLIC_ENDPOINT};
pub use command::AzureCli;
pub use credential::{
    AzureCliTokenSource, ClientSecretTokenSource, Credential, StaticTokenSource, TokenSource,
};
pub use function::FunctionSecrets;
pub use oauth2::{AccessToken, ClientSecret};
pub use probe::{run_probe, ProbeOptions, ProbeTarget};
pub use report::{diagnose, Diagnostic, Reporter};

use thiserror::Error;

/// Broad category of a `ProbeError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The external CLI could not be run or exited unsuccessfully.
    ExternalTool,
    /// A token could not be acquired or was rejected.
    Authentication,
    /// The management API call failed or returned something unreadable.
    RemoteApi,
    /// Local configuration or output problems.
    Local,
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("`{program}` was not found on PATH")]
    CommandNotFound { program: String },
    #[error("`{program}` exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to run `{program}`")]
    CommandIo {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("authorization failed: {0:#}")]
    AuthorizationError(anyhow::Error),
    #[error("management API returned {status}: {code}: {message}")]
    ApiError {
        status: u16,
        code: String,
        message: String,
    },
    #[error("request to the management API failed")]
    RequestError(#[from] reqwest::Error),
    #[error("failed to parse management API response")]
    ParsingError(#[from] serde_json::Error),
    #[error("invalid URL")]
    UrlError(#[from] url::ParseError),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("failed to write output")]
    OutputError(#[from] std::io::Error),
}

impl ProbeError {
    pub fn class(&self) -> FaultClass {
        match self {
            ProbeError::CommandNotFound { .. }
            | ProbeError::CommandFailed { .. }
            | ProbeError::CommandIo { .. } => FaultClass::ExternalTool,
            ProbeError::AuthorizationError(_) => FaultClass::Authentication,
            ProbeError::ApiError { .. }
            | ProbeError::RequestError(_)
            | ProbeError::ParsingError(_) => FaultClass::RemoteApi,
            ProbeError::UrlError(_) | ProbeError::ConfigError(_) | ProbeError::OutputError(_) => {
                FaultClass::Local
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_classes() {
        let not_found = ProbeError::CommandNotFound { program: "az".to_owned() };
        assert_eq!(not_found.class(), FaultClass::ExternalTool);
        assert!(not_found.to_string().contains("`az`"));

        let auth = ProbeError::AuthorizationError(anyhow::anyhow!("token expired"));
        assert_eq!(auth.class(), FaultClass::Authentication);
        assert!(auth.to_string().contains("token expired"));

        let api = ProbeError::ApiError {
            status: 404,
            code: "ResourceNotFound".to_owned(),
            message: "gone".to_owned(),
        };
        assert_eq!(api.class(), FaultClass::RemoteApi);
        assert_eq!(api.to_string(), "management API returned 404: ResourceNotFound: gone");

        assert_eq!(ProbeError::ConfigError("x".to_owned()).class(), FaultClass::Local);
    }
}
