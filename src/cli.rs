use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

use crate::client::ClientMode;
use crate::config::{default_kubeconfig_path, MalformedPolicy, Settings};

#[derive(Parser, Debug)]
#[command(name = "min-versions-controller")]
#[command(about = "Label nodes with runtime versions and pin pods to nodes meeting their minimums")]
#[command(version)]
pub struct Args {
    /// Path to a YAML settings file
    #[arg(short, long, value_name = "FILE", env = "MIN_VERSIONS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use a local kubeconfig instead of the in-cluster service account
    #[arg(long)]
    pub dev: bool,

    /// Kubeconfig to use in dev mode (defaults to $KUBECONFIG or ~/.kube/config)
    #[arg(long, value_name = "FILE")]
    pub kubeconfig: Option<PathBuf>,

    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Override the webhook bind address
    #[arg(long, value_name = "ADDR")]
    pub listen_addr: Option<String>,

    /// Override the webhook port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Override the webhook TLS certificate
    #[arg(long, value_name = "FILE")]
    pub cert_file: Option<PathBuf>,

    /// Override the webhook TLS key
    #[arg(long, value_name = "FILE")]
    pub key_file: Option<PathBuf>,

    /// Serve the webhook over plain HTTP (TLS terminated elsewhere)
    #[arg(long)]
    pub no_tls: bool,

    /// What to do with pods whose minimum-version labels cannot be parsed
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_malformed: Option<MalformedPolicy>,

    /// Do not run the node controller
    #[arg(long, conflicts_with = "no_webhook")]
    pub no_controller: bool,

    /// Do not run the admission webhook
    #[arg(long)]
    pub no_webhook: bool,

    /// Print the effective settings and exit
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Args {
    /// Default log filter for the `-v` count
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Where the Kubernetes client should take its credentials from
    pub fn client_mode(&self) -> ClientMode {
        if self.dev || self.kubeconfig.is_some() {
            let path = self
                .kubeconfig
                .clone()
                .unwrap_or_else(default_kubeconfig_path);
            ClientMode::Local(path)
        } else {
            ClientMode::InCluster
        }
    }

    /// Apply command-line overrides on top of file settings
    pub fn apply_overrides(&self, settings: &mut Settings) {
        let webhook = &mut settings.webhook;
        if let Some(ref addr) = self.listen_addr {
            webhook.listen_addr = addr.clone();
        }
        if let Some(port) = self.port {
            webhook.port = port;
        }
        if let Some(ref cert) = self.cert_file {
            webhook.cert_file = cert.clone();
        }
        if let Some(ref key) = self.key_file {
            webhook.key_file = key.clone();
        }
        if self.no_tls {
            webhook.tls = false;
        }
        if let Some(policy) = self.on_malformed {
            webhook.on_malformed = policy;
        }
    }
}

// ============================================================================
// SBIO: Pure display logic (no I/O - returns formatted strings)
// ============================================================================

/// Describe what the process would run with. Pure function.
pub fn format_dry_run(settings: &Settings, args: &Args) -> String {
    let mut output = String::new();

    output.push_str("min-versions-controller - Dry Run Mode\n\n");
    match args.client_mode() {
        ClientMode::InCluster => output.push_str("Client: in-cluster\n"),
        ClientMode::Local(path) => {
            output.push_str(&format!("Client: kubeconfig {}\n", path.display()))
        }
    }
    output.push_str(&format!(
        "Node controller: {}\n",
        if args.no_controller { "disabled" } else { "enabled" }
    ));
    output.push_str(&format!(
        "Admission webhook: {}\n\n",
        if args.no_webhook { "disabled" } else { "enabled" }
    ));

    match serde_yaml::to_string(settings) {
        Ok(yaml) => output.push_str(&yaml),
        Err(e) => output.push_str(&format!("<settings not printable: {}>\n", e)),
    }

    output
}
