use std::process;
use std::sync::Arc;

use clap::Parser;
use futures::future::pending;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use min_versions_controller::cli::{format_dry_run, Args, LogFormat};
use min_versions_controller::client::{make_client, ClientMode, KubeNodeWriter};
use min_versions_controller::config::{
    load_settings_file, ControllerSettings, Settings, WebhookSettings,
};
use min_versions_controller::controller::{self, ControllerContext};
use min_versions_controller::webhook::{self, WebhookState};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    match args.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }

    // Load settings, then apply command-line overrides
    let mut settings = match args.config {
        Some(ref path) => match load_settings_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Failed to load settings file {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Settings::default(),
    };
    args.apply_overrides(&mut settings);

    if args.dry_run {
        println!("{}", format_dry_run(&settings, &args));
        return;
    }

    if let Err(e) = run(args, settings).await {
        error!("Error running app: {:#}", e);
        process::exit(1);
    }
}

async fn run(args: Args, settings: Settings) -> anyhow::Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("a rustls crypto provider was already installed");
    }

    let controller_task = async {
        if args.no_controller {
            pending().await
        } else {
            run_controller(args.client_mode(), settings.controller.clone()).await
        }
    };
    let webhook_task = async {
        if args.no_webhook {
            pending().await
        } else {
            run_webhook(&settings.webhook).await
        }
    };

    info!("min-versions-controller started");

    // Whichever side stops first takes the process down with it.
    tokio::select! {
        result = controller_task => result,
        result = webhook_task => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}

async fn run_controller(mode: ClientMode, settings: ControllerSettings) -> anyhow::Result<()> {
    let client = make_client(&mode).await?;
    let writer = Arc::new(KubeNodeWriter::new(client.clone()));
    let ctx = Arc::new(ControllerContext::new(writer, settings));
    controller::run(client, ctx).await;
    anyhow::bail!("node controller stopped")
}

async fn run_webhook(settings: &WebhookSettings) -> anyhow::Result<()> {
    let state = WebhookState::new(settings.on_malformed);
    webhook::serve(settings, state).await?;
    anyhow::bail!("webhook server stopped")
}
