//! Moor - Move package deployment pipeline
//!
//! Usage:
//!   moor deploy token                 # publish + configure a spoke token
//!   moor deploy manager               # publish + configure a spoke manager
//!   moor publish --variant token      # publish only, print the record
//!   moor configure token ...          # configure an already-published package
//!   moor mint <pkg> <treasury> 100    # mint demo coins

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moor_core::deploy::{
    ConfigureManagerStep, ConfigureTokenStep, Pipeline, PublishStep, RoleMap, chained_roles,
    manager_roles, roles, token_roles,
};
use moor_core::prelude::*;

#[derive(Parser)]
#[command(name = "moor")]
#[command(about = "Publish and configure Move packages", long_about = None)]
struct Cli {
    /// Ledger network (mainnet, testnet, devnet, localnet); overrides settings
    #[arg(long, global = true)]
    network: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Which package bundle a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    Token,
    Manager,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and publish a package, printing the deployment record
    Publish {
        /// Package variant, selects which role objects to extract
        #[arg(long, value_enum, default_value = "token")]
        variant: Variant,

        /// Move package directory (default: settings, then current dir)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Recipient of the upgrade capability (default: sender address)
        #[arg(long)]
        recipient: Option<String>,

        /// On failure, print an empty record instead of exiting nonzero
        #[arg(long)]
        degrade: bool,
    },

    /// Publish and configure in one run
    Deploy {
        /// Package variant to deploy
        #[arg(value_enum)]
        variant: Variant,

        /// Move package directory (default: settings, then current dir)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Token bundles only: also configure the bundled manager module
        #[arg(long)]
        with_manager: bool,
    },

    /// Configure an already-published package with explicit object ids
    Configure {
        /// Package variant, selects the entry point and argument order
        #[arg(value_enum)]
        variant: Variant,

        /// Published package id (empty after a degraded publish is accepted
        /// and will fail at the ledger)
        package_id: String,

        /// Administrative capability object id
        admin: String,

        /// Witness carrier object id
        witness: String,

        /// Treasury capability object id (token variant)
        #[arg(long)]
        treasury: Option<String>,
    },

    /// Mint demo coins against a published token package
    Mint {
        /// Published package id
        package_id: String,

        /// Treasury capability object id
        treasury: String,

        /// Amount to mint
        amount: u64,

        /// Recipient address (default: sender address)
        #[arg(long)]
        recipient: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moor=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let project_root = std::env::current_dir().context("cannot determine working directory")?;
    let mut settings = Settings::load(&project_root)?;
    if let Some(name) = &cli.network {
        settings.network = Network::parse(name)?;
    }

    let signer = settings.signer()?;
    tracing::debug!(network = ?settings.network, address = %signer.address(), "signer ready");
    let client = RpcClient::new(settings.network, signer)?;

    match cli.command {
        Commands::Publish {
            variant,
            path,
            recipient,
            degrade,
        } => run_publish(&client, &settings, variant, path, recipient, degrade).await,
        Commands::Deploy {
            variant,
            path,
            with_manager,
        } => run_deploy(&client, &settings, variant, path, with_manager).await,
        Commands::Configure {
            variant,
            package_id,
            admin,
            witness,
            treasury,
        } => run_configure(&client, &settings, variant, &package_id, &admin, &witness, treasury)
            .await,
        Commands::Mint {
            package_id,
            treasury,
            amount,
            recipient,
        } => run_mint(&client, &package_id, &treasury, amount, recipient).await,
    }
}

fn compile(settings: &Settings, path: Option<PathBuf>) -> Result<DeploymentArtifact> {
    let path = path
        .or_else(|| settings.package_path.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(MoveBuilder::new().compile(&path)?)
}

fn role_specs(variant: Variant, with_manager: bool) -> Vec<moor_core::deploy::RoleSpec> {
    match (variant, with_manager) {
        (Variant::Token, true) => chained_roles(),
        (Variant::Token, false) => token_roles(),
        (Variant::Manager, _) => manager_roles(),
    }
}

async fn run_publish(
    client: &RpcClient,
    settings: &Settings,
    variant: Variant,
    path: Option<PathBuf>,
    recipient: Option<String>,
    degrade: bool,
) -> Result<()> {
    let artifact = compile(settings, path)?;
    let recipient = recipient.unwrap_or_else(|| client.signer_address().to_string());
    let specs = role_specs(variant, false);
    let publisher = Publisher::new(client);

    let record = if degrade {
        publisher.publish_or_empty(artifact, &recipient, &specs).await
    } else {
        publisher.publish(artifact, &recipient, &specs).await?
    };

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn run_deploy(
    client: &RpcClient,
    settings: &Settings,
    variant: Variant,
    path: Option<PathBuf>,
    with_manager: bool,
) -> Result<()> {
    if with_manager && variant != Variant::Token {
        anyhow::bail!("--with-manager only applies to token deployments");
    }

    let artifact = compile(settings, path)?;
    let recipient = client.signer_address().to_string();
    let specs = role_specs(variant, with_manager);

    let mut pipeline = Pipeline::new().step(PublishStep::new(
        Publisher::new(client),
        artifact,
        recipient,
        specs,
    ));
    match variant {
        Variant::Token => {
            pipeline = pipeline.step(ConfigureTokenStep::new(
                Configurator::new(client),
                token_params(settings)?,
            ));
            if with_manager {
                pipeline = pipeline.step(ConfigureManagerStep::chained(
                    Configurator::new(client),
                    manager_params(settings)?,
                ));
            }
        }
        Variant::Manager => {
            pipeline = pipeline.step(ConfigureManagerStep::new(
                Configurator::new(client),
                manager_params(settings)?,
            ));
        }
    }

    let mut role_map = RoleMap::new();
    let reports = pipeline.run(&mut role_map).await?;

    for report in &reports {
        match &report.digest {
            Some(digest) => println!("{}: {digest}", report.step),
            None => println!("{}: ok", report.step),
        }
    }
    for (role, id) in role_map.entries() {
        println!("  {role}: {id}");
    }
    Ok(())
}

async fn run_configure(
    client: &RpcClient,
    settings: &Settings,
    variant: Variant,
    package_id: &str,
    admin: &str,
    witness: &str,
    treasury: Option<String>,
) -> Result<()> {
    let configurator = Configurator::new(client);
    let record = match variant {
        Variant::Token => {
            let treasury =
                treasury.context("token configuration requires --treasury <object-id>")?;
            configurator
                .configure_token(package_id, admin, witness, &treasury, &token_params(settings)?)
                .await?
        }
        Variant::Manager => {
            configurator
                .configure_manager(package_id, admin, witness, &manager_params(settings)?)
                .await?
        }
    };

    println!("digest: {}", record.digest);
    match record.config_id {
        Some(id) => println!("{}: {id}", roles::CONFIGURATION_HANDLE),
        None => println!("{}: <not found>", roles::CONFIGURATION_HANDLE),
    }
    Ok(())
}

async fn run_mint(
    client: &RpcClient,
    package_id: &str,
    treasury: &str,
    amount: u64,
    recipient: Option<String>,
) -> Result<()> {
    let recipient = recipient.unwrap_or_else(|| client.signer_address().to_string());
    let digest = moor_core::deploy::mint::mint(client, package_id, treasury, amount, &recipient)
        .await?;
    println!("digest: {digest}");
    Ok(())
}

fn token_params(settings: &Settings) -> Result<TokenParams> {
    Ok(TokenParams {
        storage: settings.require_storage()?.to_string(),
        version: settings.version,
        token_id: settings.require_token_id()?.to_string(),
        sources: settings.sources.clone(),
        destinations: settings.destinations.clone(),
    })
}

fn manager_params(settings: &Settings) -> Result<ManagerParams> {
    Ok(ManagerParams {
        storage: settings.require_storage()?.to_string(),
        manager_config: settings
            .manager_config
            .clone()
            .context("manager configuration requires MOOR_MANAGER_CONFIG or `manager_config`")?,
        version: settings.version,
        token_id: settings.require_token_id()?.to_string(),
    })
}
