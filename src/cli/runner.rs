//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, ServiceSelection};
use crate::config::{load_config, GatewayConfig, Service};
use crate::entity::{
    EntitySchema, INTELLIGENCE_MODEL, PHYSICAL_MACHINE, SYMPTOM_ACTION_CASE, TAL, UE,
    VIRTUAL_MACHINE, VM_NETWORK,
};
use crate::error::{Error, Result, ResultExt};
use crate::gateway;
use crate::server::{build_app, serve};
use serde_json::{json, Value};
use tracing::info;

/// Entities read from the topology database
const TOPOLOGY_ENTITIES: &[&EntitySchema] = &[&PHYSICAL_MACHINE, &VIRTUAL_MACHINE, &VM_NETWORK, &UE];

/// Entities read from the TAL database
const TAL_ENTITIES: &[&EntitySchema] = &[&SYMPTOM_ACTION_CASE, &TAL, &INTELLIGENCE_MODEL];

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Serve {
                service,
                host,
                port,
            } => self.serve(*service, host.as_deref(), *port).await,
            Commands::Check => self.check().await,
            Commands::Services => self.services(),
        }
    }

    /// Configuration file, or defaults when none was given
    fn load_config(&self) -> Result<GatewayConfig> {
        match &self.cli.config {
            Some(path) => load_config(path),
            None => {
                info!("no config file given, using defaults");
                Ok(GatewayConfig::default())
            }
        }
    }

    async fn serve(&self, selection: ServiceSelection, host: Option<&str>, port: Option<u16>) -> Result<()> {
        let config = self.load_config()?;
        let services = selection.services(&config.server.exclude);
        if services.is_empty() {
            return Err(Error::config("every service is excluded, nothing to serve"));
        }

        let mut mounts = Vec::with_capacity(services.len());
        for service in services {
            let router = gateway::router(service, &config)
                .await
                .with_context(|| format!("cannot start the {} service", service.name()))?;
            mounts.push((config.server.base_path(service), router));
        }

        let app = build_app(mounts);
        let host = host.unwrap_or(&config.server.host);
        serve(app, host, port.unwrap_or(config.server.port)).await
    }

    /// Validate the configuration, then attach every configured database
    ///
    /// Attaching loads each table's columns, so a table that lacks a
    /// declared column is reported here rather than on first request.
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        self.output_message(&json!({
            "type": "LOG",
            "log": {"level": "INFO", "message": "Configuration is valid"}
        }));

        let databases = [
            ("topology_database", config.topology_database.as_ref(), TOPOLOGY_ENTITIES),
            ("tal_database", config.tal_database.as_ref(), TAL_ENTITIES),
        ];

        let mut failed = None;
        for (name, database, entities) in databases {
            let Some(database) = database else {
                continue;
            };
            match gateway::attach(database, entities).await {
                Ok(_) => self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "database": name,
                        "status": "SUCCEEDED",
                        "message": format!("Attached {} entities", entities.len())
                    }
                })),
                Err(e) => {
                    self.output_message(&json!({
                        "type": "CONNECTION_STATUS",
                        "connectionStatus": {
                            "database": name,
                            "status": "FAILED",
                            "message": format!("Attach failed: {e}")
                        }
                    }));
                    failed.get_or_insert(e);
                }
            }
        }

        match failed {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn services(&self) -> Result<()> {
        let config = self.load_config()?;
        let services: Vec<Value> = Service::ALL
            .into_iter()
            .map(|service| {
                json!({
                    "name": service.name(),
                    "base_path": config.server.base_path(service),
                    "excluded": config.server.exclude.contains(&service),
                })
            })
            .collect();
        self.output_message(&json!({ "type": "SERVICES", "services": services }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
