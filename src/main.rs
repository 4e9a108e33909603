use clap::Parser;
use pacotes::domain::model::{display_date, display_price, PackageServiceSpec, Service};
use pacotes::domain::ports::ConfigProvider;
use pacotes::utils::{logger, validation, validation::Validate};
use pacotes::{
    CatalogPackage, CatalogReader, CliConfig, Command, EntitlementEngine, ErrorSeverity,
    JsonStore, TenantId,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // A config file replaces the flag-level settings; flags remain the
    // quick path for one-off invocations.
    let (data_dir, tenant, verbose) = match &cli.config {
        Some(path) => {
            let file = pacotes::TomlConfig::from_file(path)?;
            file.validate()?;
            let verbose = cli.verbose || file.verbose();
            (file.data_dir().to_string(), Some(file.tenant()), verbose)
        }
        None => (cli.data_dir.clone(), cli.tenant, cli.verbose),
    };

    logger::init_cli_logger(verbose);
    tracing::info!("Starting pacotes CLI");

    if let Err(e) = cli.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let tenant = match validation::validate_required_field("tenant", &tenant) {
        Ok(tenant) => *tenant,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Pass --tenant or point --config at a studio config file.");
            std::process::exit(1);
        }
    };

    let store = JsonStore::new(&data_dir);
    let engine = EntitlementEngine::new(store.clone(), store.clone());

    if let Err(e) = run(&engine, &store, tenant, cli.command).await {
        tracing::error!("Operation failed: {} ({:?})", e, e.severity());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 3,
            ErrorSeverity::Critical => 4,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(
    engine: &EntitlementEngine<JsonStore, JsonStore>,
    store: &JsonStore,
    tenant: TenantId,
    command: Command,
) -> pacotes::Result<()> {
    match command {
        Command::Catalog => {
            let packages = store.list_active_packages(tenant).await?;
            if packages.is_empty() {
                println!("No active packages in the catalog.");
            }
            for package in packages {
                let expiry = package
                    .expires_after_days
                    .map(|d| format!("{} days", d))
                    .unwrap_or_else(|| "never expires".to_string());
                println!(
                    "{}  {}  R$ {}  ({}, {} services)",
                    package.id,
                    package.name,
                    display_price(package.price),
                    expiry,
                    package.services.len()
                );
            }
        }

        Command::Entitlements { customer, all } => {
            let mut loaded = engine.load_entitlements(tenant, &[customer]).await?;
            let entitlements = loaded.remove(0);
            let views: Vec<_> = if all {
                entitlements.entitlements.iter().collect()
            } else {
                entitlements.active()
            };

            if views.is_empty() {
                println!("No entitlements for customer {}.", customer);
            }
            for view in views {
                let name = view
                    .package
                    .as_ref()
                    .map(|p| p.name.as_str())
                    .unwrap_or("(package unavailable)");
                let expiration = view
                    .purchase
                    .expiration_date
                    .map(display_date)
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{}  {}  purchased {}  expires {}  [{}]",
                    view.purchase.id,
                    name,
                    display_date(view.purchase.purchase_date),
                    expiration,
                    view.status.as_str()
                );
                for line in &view.services {
                    println!("    {}: {} sessions left", line.service_name, line.sessions_remaining);
                }
            }
        }

        Command::Purchase { customer, packages } => {
            let results = engine.purchase_many(tenant, customer, &packages).await;
            let mut first_error = None;
            let mut successes = 0;

            for (package_id, result) in results {
                match result {
                    Ok(purchase) => {
                        successes += 1;
                        println!("✅ Purchased package {} (purchase {})", package_id, purchase.id);
                    }
                    Err(e) => {
                        println!("❌ Package {}: {}", package_id, e.user_friendly_message());
                        first_error.get_or_insert(e);
                    }
                }
            }

            // Partial success is fine for a batch; only a fully failed batch
            // surfaces as an error exit.
            if successes == 0 {
                if let Some(e) = first_error {
                    return Err(e);
                }
            }
        }

        Command::Renew {
            customer,
            package_name,
        } => {
            let purchase = engine.renew(tenant, customer, &package_name).await?;
            println!(
                "✅ Renewed '{}' for customer {} (purchase {})",
                package_name, customer, purchase.id
            );
        }

        Command::DeletePackage { id } => {
            engine.delete_package(tenant, id).await?;
            println!("✅ Deleted purchase {}", id);
        }

        Command::DeleteCustomer { customer } => {
            engine.delete_customer_entitlements(tenant, customer).await?;
            println!("✅ Deleted all purchases of customer {}", customer);
        }

        Command::SeedDemo => {
            let (customer, package) = seed_demo(store, tenant).await?;
            println!("✅ Seeded demo data.");
            println!("   customer: {}", customer);
            println!("   package:  {} (\"10 sessions\")", package);
        }
    }

    Ok(())
}

async fn seed_demo(store: &JsonStore, tenant: TenantId) -> pacotes::Result<(Uuid, Uuid)> {
    let massage = Uuid::new_v4();
    let facial = Uuid::new_v4();
    let customer = Uuid::new_v4();
    let package = Uuid::new_v4();

    store
        .seed_service(
            tenant,
            Service {
                id: massage,
                name: "Massage".to_string(),
                price: Decimal::new(8000, 2),
                duration_minutes: 60,
                active: true,
            },
        )
        .await?;
    store
        .seed_service(
            tenant,
            Service {
                id: facial,
                name: "Facial".to_string(),
                price: Decimal::new(12000, 2),
                duration_minutes: 45,
                active: true,
            },
        )
        .await?;
    store
        .seed_package(
            tenant,
            CatalogPackage {
                id: package,
                name: "10 sessions".to_string(),
                price: Decimal::new(50000, 2),
                expires_after_days: Some(30),
                services: vec![
                    PackageServiceSpec {
                        service_id: massage,
                        quantity: 10,
                    },
                    PackageServiceSpec {
                        service_id: facial,
                        quantity: 2,
                    },
                ],
                active: true,
            },
        )
        .await?;
    store.seed_customer(tenant, customer).await?;

    Ok((customer, package))
}
