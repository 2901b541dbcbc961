mod args_parse;
mod data_sources;
mod manager;
mod service;
mod service_configuration;


use std::{fs::read_to_string, path::Path, time::Duration};

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    args_parse::Args,
    data_sources::DockerServiceDataSource,
    manager::Manager,
    service_configuration::{LoadConfiguration, ServiceConfiguration},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Parse command line arguments
    let args = Args::parse()?;

    // Load the configuration from the specified YAML file
    let config_content = read_to_string(Path::new(&args.config_file))?;
    let load_config: LoadConfiguration = serde_yaml::from_str(&config_content)?;

    // Attempt to transform LoadConfiguration into ServiceConfiguration
    let mut service_config: ServiceConfiguration = load_config.try_into()?;

    // If `docker_endpoint` is provided via command-line args, override the value from the config file
    if let Some(docker_endpoint) = args.docker_endpoint {
        service_config.docker_endpoint = docker_endpoint;
    }

    // If `interval` is provided via command-line args, override the value from the config file
    if let Some(interval) = args.interval {
        service_config.interval = Duration::from_secs(interval);
    }

    info!(
        cluster = %service_config.cluster.name,
        interval = service_config.interval.as_secs(),
        "starting cluster manager"
    );

    let data_source = DockerServiceDataSource::new(&service_config.docker_endpoint)
        .context("failed to initialize the Docker service data source")?;

    let manager = Manager::new(service_config, Box::new(data_source));
    manager.run().await;

    Ok(())
}
