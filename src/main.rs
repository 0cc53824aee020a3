use clap::{Parser, ValueEnum};
use function_secrets_probe::{
    run_probe, AccessToken, AzureCli, AzureCliTokenSource, ClientSecret, ClientSecretTokenSource,
    Credential, ProbeError, ProbeOptions, ProbeTarget, StaticTokenSource, TokenSource,
    PUBLIC_ENDPOINT,
};
use log::{debug, info};
use std::convert::Infallible;
use std::io;
use std::process;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AuthMode {
    /// Use the signed-in Azure CLI session
    Cli,
    /// Use a service principal's client secret
    ClientSecret,
}

/// Lists a function's secrets once and reports fields the management API left unpopulated.
#[derive(Debug, Parser)]
#[command(name = "function-secrets-probe", version, about)]
struct Args {
    #[arg(long, env = "PROBE_RESOURCE_GROUP")]
    resource_group: String,

    #[arg(long = "site", env = "PROBE_SITE_NAME")]
    site_name: String,

    #[arg(long = "function", env = "PROBE_FUNCTION_NAME")]
    function_name: String,

    /// Defaults to the subscription selected in the Azure CLI
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    subscription_id: Option<String>,

    #[arg(long, value_enum, env = "PROBE_AUTH", default_value = "cli")]
    auth: AuthMode,

    #[arg(long, env = "AZURE_TENANT_ID")]
    tenant_id: Option<String>,

    #[arg(long, env = "AZURE_CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true, value_parser = parse_client_secret)]
    client_secret: Option<ClientSecret>,

    /// Use this token instead of acquiring one
    #[arg(long, env = "AZURE_ACCESS_TOKEN", hide_env_values = true, value_parser = parse_access_token)]
    access_token: Option<AccessToken>,

    #[arg(long, env = "AZ_PATH", default_value = "az")]
    az_path: String,

    #[arg(long, env = "AZURE_MANAGEMENT_ENDPOINT", default_value = PUBLIC_ENDPOINT)]
    endpoint: String,

    #[arg(long, env = "PROBE_API_VERSION")]
    api_version: Option<String>,

    /// Print the access token instead of a redacted placeholder
    #[arg(long)]
    show_secrets: bool,
}

fn parse_client_secret(value: &str) -> Result<ClientSecret, Infallible> {
    Ok(ClientSecret::new(value.to_owned()))
}

fn parse_access_token(value: &str) -> Result<AccessToken, Infallible> {
    Ok(AccessToken::new(value.to_owned()))
}

fn required<T: Clone>(value: &Option<T>, flag: &str) -> Result<T, ProbeError> {
    value
        .clone()
        .ok_or_else(|| ProbeError::ConfigError(format!("{} is required for --auth client-secret", flag)))
}

/// Token resource for a non-public management endpoint.
fn token_resource(endpoint: &str) -> Option<String> {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint == PUBLIC_ENDPOINT {
        None
    } else {
        Some(format!("{}/", endpoint))
    }
}

fn token_source(args: &Args) -> Result<Box<dyn TokenSource>, ProbeError> {
    let cli = AzureCli::with_program(&args.az_path);

    if let Some(token) = &args.access_token {
        debug!("Using the supplied access token");
        let credential = Credential::bearer_token(token.clone());
        let source: Box<dyn TokenSource> = match &args.subscription_id {
            Some(id) => Box::new(StaticTokenSource::new(id, credential)),
            None => Box::new(AzureCliTokenSource::new(cli).with_credential(credential)),
        };
        return Ok(source);
    }

    let resource = token_resource(&args.endpoint);
    match args.auth {
        AuthMode::Cli => {
            debug!("Using the Azure CLI session via `{}`", args.az_path);
            let mut source = AzureCliTokenSource::new(cli);
            if let Some(id) = &args.subscription_id {
                source = source.with_subscription_id(id);
            }
            if let Some(resource) = &resource {
                source = source.with_resource(resource);
            }
            Ok(Box::new(source))
        }
        AuthMode::ClientSecret => {
            debug!("Using client secret credentials");
            let mut source = ClientSecretTokenSource::new(
                &required(&args.tenant_id, "--tenant-id")?,
                &required(&args.client_id, "--client-id")?,
                required(&args.client_secret, "--client-secret")?,
                &required(&args.subscription_id, "--subscription-id")?,
            );
            if let Some(resource) = &resource {
                source = source.with_resource(resource);
            }
            Ok(Box::new(source))
        }
    }
}

async fn run(args: &Args) -> Result<(), ProbeError> {
    let source = token_source(args)?;
    let target = ProbeTarget::new(&args.resource_group, &args.site_name, &args.function_name);
    let options = ProbeOptions {
        endpoint: args.endpoint.clone(),
        api_version: args.api_version.clone(),
        show_secrets: args.show_secrets,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let diagnostics = run_probe(source.as_ref(), &target, &options, &mut out).await?;
    info!("Probe finished with {} diagnostic(s)", diagnostics.len());
    Ok(())
}

/// The error and its sources on one line.
fn error_report(err: ProbeError) -> String {
    format!("{:#}", anyhow::Error::from(err))
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let args = Args::parse();
    if let Err(err) = run(&args).await {
        eprintln!("Error: {}", error_report(err));
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec![
            "function-secrets-probe",
            "--resource-group",
            "funcRestSpecTest",
            "--site",
            "testfuncx8b7a",
            "--function",
            "testfunc",
        ];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn debug_output_hides_secrets() {
        let args = args(&[
            "--auth",
            "client-secret",
            "--client-secret",
            "s3cr3t",
            "--access-token",
            "t0k3n",
        ]);
        let printed = format!("{:?}", args);
        assert!(!printed.contains("s3cr3t"));
        assert!(!printed.contains("t0k3n"));
        assert!(printed.contains("funcRestSpecTest"));
    }

    #[test]
    fn token_resource_only_for_other_clouds() {
        assert_eq!(token_resource("https://management.azure.com"), None);
        assert_eq!(token_resource("https://management.azure.com/"), None);
        assert_eq!(
            token_resource("https://management.chinacloudapi.cn/").as_deref(),
            Some("https://management.chinacloudapi.cn/")
        );
    }

    #[test]
    fn errors_are_reported_with_their_sources() {
        let err = ProbeError::CommandIo {
            program: "az".to_owned(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert_eq!(error_report(err), "failed to run `az`: permission denied");

        let err = ProbeError::CommandNotFound { program: "az".to_owned() };
        assert_eq!(error_report(err), "`az` was not found on PATH");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cli_token_targets_a_custom_endpoint() {
        let args = args(&["--az-path", "echo", "--endpoint", "https://management.chinacloudapi.cn/"]);
        let credential = token_source(&args).unwrap().credential().await.unwrap();
        assert!(credential
            .token()
            .secret()
            .ends_with("--resource https://management.chinacloudapi.cn/"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cli_token_for_the_public_cloud_has_no_resource() {
        let args = args(&["--az-path", "echo"]);
        let credential = token_source(&args).unwrap().credential().await.unwrap();
        assert_eq!(
            credential.token().secret(),
            "account get-access-token --query accessToken -o tsv"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn access_token_without_subscription_uses_the_cli_subscription() {
        let args = args(&["--az-path", "echo", "--access-token", "tok"]);
        let source = token_source(&args).unwrap();
        assert_eq!(source.credential().await.unwrap().token().secret(), "tok");
        assert_eq!(
            source.subscription_id().await.unwrap(),
            "account show --query id -o tsv"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn access_token_with_subscription_skips_the_cli() {
        let args = args(&[
            "--az-path",
            "false",
            "--access-token",
            "tok",
            "--subscription-id",
            "abc-123",
        ]);
        let source = token_source(&args).unwrap();
        assert_eq!(source.credential().await.unwrap().token().secret(), "tok");
        assert_eq!(source.subscription_id().await.unwrap(), "abc-123");
    }

    #[test]
    fn client_secret_mode_needs_all_credentials() {
        let args = Args::parse_from([
            "function-secrets-probe",
            "--resource-group",
            "rg",
            "--site",
            "site",
            "--function",
            "fn",
            "--auth",
            "client-secret",
            "--tenant-id",
            "t",
        ]);
        let err = token_source(&args).err().unwrap();
        assert!(err.to_string().contains("--client-id"));
    }

    #[test]
    fn defaults() {
        let args = args(&[]);
        assert_eq!(args.auth, AuthMode::Cli);
        assert_eq!(args.az_path, "az");
        assert!(!args.show_secrets);
    }
}
