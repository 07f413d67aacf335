pub mod clients;
pub mod config;
pub mod error;
pub mod nodes;
pub mod output;
pub mod release;

use std::{env, time::Duration};

use anstyle::{AnsiColor, Effects};
use anyhow::Result;
use aws_config::{BehaviorVersion, meta::region::RegionProviderChain};
use aws_types::region::Region;
use clap::{Args, Parser, Subcommand, builder::styling::Styles};
use clap_verbosity_flag::Verbosity;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};

pub use error::Error;

use crate::{
  clients::{RealK8sClients, RealSsmClients},
  nodes::NodeQueue,
  release::SystemClock,
};

const STYLES: Styles = Styles::styled()
  .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
  .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
  .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
  .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(author, about, version)]
#[command(propagate_version = true, styles = STYLES)]
pub struct Cli {
  #[command(subcommand)]
  pub commands: Commands,

  #[clap(flatten)]
  pub verbose: Verbosity,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  #[command(name = "nodes")]
  Inventory(Inventory),
  #[command(arg_required_else_help = true)]
  Cordon(Cordon),
  #[command(arg_required_else_help = true)]
  Drain(Drain),
  #[command(name = "release")]
  Lookup(Lookup),
}

/// List the nodes in the cluster
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Inventory {
  #[arg(short, long, value_enum, default_value_t)]
  pub format: output::Format,

  /// Write to file instead of stdout
  #[arg(short, long)]
  pub output: Option<String>,
}

/// Mark a node as unschedulable
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Cordon {
  /// The name of the node to cordon
  #[arg(short, long, alias = "node-name")]
  pub node: String,
}

/// Cordon a node and evict its pods
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Drain {
  /// The name of the node to drain
  #[arg(short, long, alias = "node-name")]
  pub node: String,

  /// Path to a configuration file (defaults to `.eksrefresh.yaml` when present)
  #[arg(short, long)]
  pub config: Option<String>,

  #[arg(short, long, value_enum, default_value_t)]
  pub format: output::Format,
}

/// Look up the latest recommended EKS optimized AMI release version
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Lookup {
  /// The Kubernetes version of the cluster
  #[arg(short, long, env = "EKS_VERSION")]
  pub eks_version: String,

  /// The CPU architecture of the nodes; anything other than `arm64` selects x86_64
  #[arg(short, long, env = "NODE_ARCHITECTURE", default_value = "amd64")]
  pub architecture: String,

  /// The AWS region to query
  #[arg(short, long)]
  pub region: Option<String>,

  #[arg(short, long, value_enum, default_value_t)]
  pub format: output::Format,

  /// Write to file instead of stdout
  #[arg(short, long)]
  pub output: Option<String>,
}

/// Print the nodes currently in the cluster
pub async fn inventory(args: &Inventory) -> Result<()> {
  let k8s_client = RealK8sClients::new().await?;
  let queue = nodes::list_nodes(&k8s_client, NodeQueue::new()).await;

  output::output(&queue, &args.format, &args.output)?;

  Ok(())
}

pub async fn cordon(args: &Cordon) -> Result<()> {
  let k8s_client = RealK8sClients::new().await?;
  nodes::cordon_node(&k8s_client, &args.node).await?;

  println!("node/{} cordoned", args.node);
  Ok(())
}

pub async fn drain(args: &Drain) -> Result<()> {
  let config = config::load(args.config.as_deref())?;
  let k8s_client = RealK8sClients::new().await?;

  let spinner = ProgressBar::new_spinner();
  spinner.enable_steady_tick(Duration::from_millis(120));
  spinner.set_message(format!("Draining node/{}", args.node));

  let result = nodes::cordon_and_drain(&k8s_client, &args.node, &config.drain).await;
  spinner.finish_and_clear();

  let summary = result?;
  output::output(&summary, &args.format, &None)?;

  Ok(())
}

pub async fn lookup(args: &Lookup) -> Result<()> {
  let aws_config = get_config(&args.region).await?;
  let ssm_client = RealSsmClients::new(&aws_config);

  let record = release::get_release(&ssm_client, &SystemClock, &args.eks_version, &args.architecture).await?;
  output::output(&record, &args.format, &args.output)?;

  Ok(())
}

/// Get the configuration to authn/authz with AWS that will be used across AWS clients
async fn get_config(region: &Option<String>) -> Result<aws_config::SdkConfig> {
  let aws_region = match region {
    Some(region) => Some(Region::new(region.to_owned())),
    None => env::var("AWS_REGION").ok().map(Region::new),
  };

  let region_provider = RegionProviderChain::first_try(aws_region).or_default_provider();

  Ok(
    aws_config::defaults(BehaviorVersion::latest())
      .region(region_provider)
      .load()
      .await,
  )
}
