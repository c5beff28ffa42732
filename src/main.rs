// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{to_params, Cli, Commands};
use gigya_sdk::config::{SdkConfig, LOG_FORMAT_ENV};
use gigya_sdk::transport::HttpTransport;
use gigya_sdk::{ApiClient, SdkError, SigningContext};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    // Install the ring crypto provider for rustls before any TLS operation.
    // A provider installed earlier is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error_code = e.error_code(), "{e}");
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, SdkError> {
    let config = SdkConfig::load(cli.properties.as_deref())?;
    let transport = match cli.proxy.as_deref() {
        Some(proxy) => HttpTransport::with_proxy(proxy)?,
        None => HttpTransport::new()?,
    };
    let mut client = ApiClient::with_transport(
        &config.credentials(),
        config.api_domain.clone(),
        Arc::new(transport),
        SigningContext::shared(),
    )?
    .timeout(Duration::from_millis(cli.timeout_ms));
    if cli.insecure_http {
        client = client.use_https(false);
    }
    info!(mode = %client.mode(), domain = %client.domain(), "Client ready");

    match cli.command {
        Commands::Call { method, params } => {
            let response = client.send(&method, to_params(&params)).await?;
            println!("{}", response.body);
            if response.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Verify { token } => {
            let uid = client.verify_token(&token).await?;
            println!("{uid}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
