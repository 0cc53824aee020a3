use crate::{Diagnostic, ProbeError, Reporter, TokenSource, WebSiteManagementClient, PUBLIC_ENDPOINT};
use log::debug;
use std::io::Write;

/// The function whose secrets are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub resource_group: String,
    pub site_name: String,
    pub function_name: String,
}

impl ProbeTarget {
    pub fn new(resource_group: &str, site_name: &str, function_name: &str) -> Self {
        Self {
            resource_group: resource_group.to_owned(),
            site_name: site_name.to_owned(),
            function_name: function_name.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub endpoint: String,
    pub api_version: Option<String>,
    pub show_secrets: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            endpoint: PUBLIC_ENDPOINT.to_owned(),
            api_version: None,
            show_secrets: false,
        }
    }
}

/// Acquires a credential from `source`, lists the target's secrets once and writes the
/// report to `out`.
///
/// The subscription and token lines are written before the call is made.
pub async fn run_probe<S, W>(
    source: &S,
    target: &ProbeTarget,
    options: &ProbeOptions,
    out: &mut W,
) -> Result<Vec<Diagnostic>, ProbeError>
where
    S: TokenSource + ?Sized,
    W: Write,
{
    let mut reporter = Reporter::new(out, options.show_secrets);
    reporter.starting()?;

    let subscription_id = source.subscription_id().await?;
    let credential = source.credential().await?;
    reporter.header(&subscription_id, &credential)?;

    let mut client =
        WebSiteManagementClient::new_with_endpoint(&subscription_id, credential, &options.endpoint);
    if let Some(api_version) = &options.api_version {
        client = client.with_api_version(api_version);
    }
    debug!("Probing {:?} with api-version {}", target, client.api_version());

    let secrets = client
        .list_function_secrets(&target.resource_group, &target.site_name, &target.function_name)
        .await?;
    Ok(reporter.report(&secrets)?)
}
