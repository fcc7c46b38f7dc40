// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line and environment configuration.
//!
//! Every flag can also be supplied through the environment variable named next
//! to it. Durations use Go-style strings such as `500ms`, `3s` or `1h30m`.

use crate::adguard::AdGuardConfig;
use crate::constants::{
    DEFAULT_ADGUARD_TIMEOUT, DEFAULT_PRELOAD_TIMEOUT, DEFAULT_STATIC_TTL, DEFAULT_SYNC_INTERVAL,
    DEFAULT_THROTTLE,
};
use crate::duration::parse_duration;
use anyhow::{Context as _, Result};
use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Reflect Kubernetes Ingress hosts into AdGuard Home DNS rewrites
#[derive(Parser, Clone)]
#[command(name = "kube-adguard-ingress", version, about, long_about = None)]
pub struct Config {
    /// Path to kubeconfig for local setup
    #[arg(short = 'c', long = "kube-config", env = "KUBE_CONFIG")]
    pub kube_config: Option<PathBuf>,

    /// Kubernetes API server URL, overrides the one from kubeconfig
    #[arg(short = 'u', long = "kube-url", env = "KUBE_URL")]
    pub kube_url: Option<String>,

    /// Minimal interval between two reconciliations
    #[arg(long, env = "THROTTLE", default_value = DEFAULT_THROTTLE, value_parser = parse_duration)]
    pub throttle: Duration,

    /// Interval at which every known Ingress is re-evaluated
    #[arg(long, env = "SYNC_INTERVAL", default_value = DEFAULT_SYNC_INTERVAL, value_parser = parse_duration)]
    pub sync_interval: Duration,

    /// Deadline for the initial Ingress listing
    #[arg(long, env = "TIMEOUT", default_value = DEFAULT_PRELOAD_TIMEOUT, value_parser = parse_duration)]
    pub timeout: Duration,

    /// AdGuard Home base URL
    #[arg(long, env = "ADGUARD_URL")]
    pub adguard_url: String,

    /// AdGuard Home user
    #[arg(long, env = "ADGUARD_USER")]
    pub adguard_user: String,

    /// AdGuard Home password
    #[arg(long, env = "ADGUARD_PASSWORD", hide_env_values = true)]
    pub adguard_password: String,

    /// Timeout of a single AdGuard API request
    #[arg(long, env = "ADGUARD_TIMEOUT", default_value = DEFAULT_ADGUARD_TIMEOUT, value_parser = parse_duration)]
    pub adguard_timeout: Duration,

    /// YAML file with static records
    #[arg(long, env = "STATIC_PATH")]
    pub static_path: Option<PathBuf>,

    /// How long the static file content is cached
    #[arg(long, env = "STATIC_TTL", default_value = DEFAULT_STATIC_TTL, value_parser = parse_duration)]
    pub static_ttl: Duration,

    /// Address to serve Prometheus metrics on; disabled when unset
    #[arg(long, env = "METRICS_BIND_ADDRESS")]
    pub metrics_bind_address: Option<SocketAddr>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("kube_config", &self.kube_config)
            .field("kube_url", &self.kube_url)
            .field("throttle", &self.throttle)
            .field("sync_interval", &self.sync_interval)
            .field("timeout", &self.timeout)
            .field("adguard", &self.adguard_config())
            .field("static_path", &self.static_path)
            .field("static_ttl", &self.static_ttl)
            .field("metrics_bind_address", &self.metrics_bind_address)
            .finish()
    }
}

impl Config {
    /// Connection parameters for the AdGuard client.
    #[must_use]
    pub fn adguard_config(&self) -> AdGuardConfig {
        AdGuardConfig {
            url: self.adguard_url.clone(),
            user: self.adguard_user.clone(),
            password: self.adguard_password.clone(),
            timeout: self.adguard_timeout,
        }
    }

    /// Build the Kubernetes client configuration.
    ///
    /// Reads `--kube-config` when given, otherwise infers it (in-cluster service
    /// account or the default kubeconfig). `--kube-url` replaces the cluster URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the kubeconfig cannot be read or the URL is invalid.
    pub async fn kube_config(&self) -> Result<kube::Config> {
        let mut config = match &self.kube_config {
            Some(path) => {
                debug!(path = %path.display(), "Loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .context("failed to load kubeconfig")?
            }
            None => kube::Config::infer()
                .await
                .context("failed to infer Kubernetes configuration")?,
        };

        if let Some(url) = &self.kube_url {
            config.cluster_url = url
                .parse()
                .with_context(|| format!("invalid Kubernetes URL: {url}"))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
