use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Clone, Parser)]
#[command(name = "pacotes")]
#[command(about = "Entitlement desk for pre-paid service-session packages")]
pub struct CliConfig {
    /// Directory holding one JSON document per tenant
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    /// Tenant (professional) every operation is scoped to
    #[arg(long)]
    pub tenant: Option<Uuid>,

    /// TOML configuration file; its values replace the flags above
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the active catalog packages
    Catalog,
    /// Show a customer's entitlements (booking view by default)
    Entitlements {
        customer: Uuid,
        #[arg(long, help = "Include expired purchases")]
        all: bool,
    },
    /// Purchase one or more catalog packages for a customer
    Purchase {
        customer: Uuid,
        #[arg(required = true)]
        packages: Vec<Uuid>,
    },
    /// Renew a previously held package by its catalog name
    Renew {
        customer: Uuid,
        package_name: String,
    },
    /// Delete one purchase and its balance rows
    DeletePackage { id: Uuid },
    /// Cascade-delete every purchase of a customer
    DeleteCustomer { customer: Uuid },
    /// Write a sample catalog and customer for trying the tool out
    SeedDemo,
}

impl ConfigProvider for CliConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn verbose(&self) -> bool {
        self.verbose
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("data_dir", &self.data_dir)?;
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        Ok(())
    }
}
