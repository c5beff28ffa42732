// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use gigya_sdk::params::Params;

#[derive(Parser, Debug)]
#[command(name = "gigya-sdk", version, about = "Signed Gigya API calls from the command line")]
pub struct Cli {
    /// Properties file with credentials (environment variables win)
    #[arg(long, global = true, env = "GIGYA_PROPERTIES")]
    pub properties: Option<PathBuf>,

    /// Send Basic and Anonymous calls over plain HTTP
    #[arg(long, global = true, default_value_t = false)]
    pub insecure_http: bool,

    /// HTTP(S) proxy for all requests, e.g. http://proxy:3128
    #[arg(long, global = true, env = "GIGYA_PROXY")]
    pub proxy: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true, default_value_t = 30_000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Call an API method and print the JSON response
    Call {
        /// Method name, e.g. accounts.getAccountInfo
        method: String,

        /// Parameters as key=value
        #[arg(value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Verify a platform-issued token and print its subject
    Verify {
        token: String,
    },
}

fn parse_param(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{arg}'")),
    }
}

pub fn to_params(pairs: &[(String, String)]) -> Params {
    pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_arguments_parse() {
        let cli = Cli::try_parse_from([
            "gigya-sdk",
            "--timeout-ms",
            "5000",
            "call",
            "accounts.getAccountInfo",
            "UID=abc",
            "include=profile,data",
        ])
        .unwrap();
        assert_eq!(cli.timeout_ms, 5000);
        assert!(!cli.insecure_http);

        let Commands::Call { method, params } = cli.command else {
            panic!("expected call");
        };
        assert_eq!(method, "accounts.getAccountInfo");
        let params = to_params(&params);
        assert_eq!(params.get_string("UID", ""), "abc");
        assert_eq!(params.get_string("include", ""), "profile,data");
    }

    #[test]
    fn plain_http_is_opt_in() {
        let cli = Cli::try_parse_from(["gigya-sdk", "call", "getUserInfo", "--insecure-http"]).unwrap();
        assert!(cli.insecure_http);
        assert!(Cli::try_parse_from(["gigya-sdk", "call", "getUserInfo", "--https"]).is_err());
    }

    #[test]
    fn proxy_flag_is_global() {
        let cli = Cli::try_parse_from([
            "gigya-sdk",
            "verify",
            "a.b.c",
            "--proxy",
            "http://proxy.internal:3128",
        ])
        .unwrap();
        assert_eq!(cli.proxy.as_deref(), Some("http://proxy.internal:3128"));
    }

    #[test]
    fn param_without_equals_is_rejected() {
        assert!(Cli::try_parse_from(["gigya-sdk", "call", "getUserInfo", "UID"]).is_err());
        assert!(parse_param("=x").is_err());
        assert_eq!(parse_param("a=b=c").unwrap(), ("a".into(), "b=c".into()));
    }

    #[test]
    fn verify_takes_a_token() {
        let cli = Cli::try_parse_from(["gigya-sdk", "verify", "a.b.c"]).unwrap();
        assert!(!cli.insecure_http);
        assert!(matches!(cli.command, Commands::Verify { token } if token == "a.b.c"));
    }
}
