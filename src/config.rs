use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use crate::vhost::VirtualHosts;

/// Command line arguments.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Virtual-hosting static file server")]
pub struct Args {
    /// Port to listen on (all interfaces)
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Full listen address, overrides --port
    #[arg(long, env = "LISTEN")]
    pub listen: Option<String>,

    /// Path to the virtual hosts YAML file
    #[arg(long = "vh-config", default_value = "virtual_hosts.yaml")]
    pub vh_config: PathBuf,

    /// Directory containing every host's docroot
    #[arg(long, default_value = "docroot_dirs")]
    pub docroot: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub virtual_hosts: VirtualHosts,
}

/// On-disk layout of the virtual hosts file.
#[derive(Debug, Deserialize)]
pub struct VirtualHostsFile {
    #[serde(default)]
    pub virtual_hosts: Vec<VirtualHostEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualHostEntry {
    #[serde(rename = "hostName")]
    pub host_name: String,
    #[serde(rename = "docRoot")]
    pub doc_root: String,
}

impl Args {
    pub fn listen_addr(&self) -> String {
        self.listen
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", self.port))
    }
}

impl Config {
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let virtual_hosts = load_virtual_hosts(&args.vh_config, &args.docroot)?;
        Ok(Self {
            listen_addr: args.listen_addr(),
            virtual_hosts,
        })
    }
}

/// Parses the YAML text of a virtual hosts file.
pub fn parse_virtual_hosts(yaml: &str) -> anyhow::Result<Vec<VirtualHostEntry>> {
    let file: VirtualHostsFile =
        serde_yaml::from_str(yaml).context("Failed to parse virtual hosts YAML")?;
    Ok(file.virtual_hosts)
}

/// Reads `config_path` and maps every host onto `docroot_dir/<docRoot>`.
///
/// Relative paths are anchored at the current directory. Every docroot must
/// exist and be a directory.
pub fn load_virtual_hosts(config_path: &Path, docroot_dir: &Path) -> anyhow::Result<VirtualHosts> {
    let yaml = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read configuration file {}", config_path.display()))?;
    let entries = parse_virtual_hosts(&yaml)
        .with_context(|| format!("Invalid configuration file {}", config_path.display()))?;

    let base = std::path::absolute(docroot_dir)
        .with_context(|| format!("Cannot resolve docroot directory {}", docroot_dir.display()))?;

    let mut hosts = VirtualHosts::new();
    for entry in entries {
        let root = base.join(&entry.doc_root);
        if let Some(previous) = hosts.insert(entry.host_name.clone(), &root) {
            tracing::warn!(
                host = %entry.host_name,
                previous = %previous.display(),
                "Duplicate virtual host, keeping the last entry"
            );
        }
    }

    hosts.verify()?;
    Ok(hosts)
}
