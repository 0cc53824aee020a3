use crate::ProbeError;
use log::debug;
use std::io::ErrorKind;
use tokio::process::Command;

const DEFAULT_PROGRAM: &str = "az";

/// Runs Azure CLI commands against the caller's existing `az login` session.
///
/// # Examples
///
/// ```no_run
/// use function_secrets_probe::AzureCli;
/// # async fn run() -> Result<(), function_secrets_probe::ProbeError> {
/// let cli = AzureCli::new();
/// let subscription_id = cli.subscription_id().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AzureCli {
    program: String,
}

impl Default for AzureCli {
    fn default() -> Self {
        AzureCli::new()
    }
}

impl AzureCli {
    pub fn new() -> Self {
        AzureCli::with_program(DEFAULT_PROGRAM)
    }

    /// Uses `program` instead of `az` from `PATH`.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_owned(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs the program with `args` and returns its trimmed standard output.
    ///
    /// Empty output from a successful run is returned as an empty string.
    pub async fn run(&self, args: &[&str]) -> Result<String, ProbeError> {
        debug!("Running `{} {}`", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ProbeError::CommandNotFound {
                    program: self.program.clone(),
                },
                _ => ProbeError::CommandIo {
                    program: self.program.clone(),
                    source: e,
                },
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    /// Id of the subscription selected in the CLI session.
    pub async fn subscription_id(&self) -> Result<String, ProbeError> {
        self.run(&["account", "show", "--query", "id", "-o", "tsv"]).await
    }

    /// Access token for the CLI session, optionally scoped to `resource`.
    pub async fn access_token(&self, resource: Option<&str>) -> Result<String, ProbeError> {
        let mut args = vec!["account", "get-access-token", "--query", "accessToken", "-o", "tsv"];
        if let Some(resource) = resource {
            args.push("--resource");
            args.push(resource);
        }
        self.run(&args).await
    }
}
