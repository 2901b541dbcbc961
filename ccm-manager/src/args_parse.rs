use anyhow::{Context, Result};
use std::env;

pub(crate) struct Args {
    pub(crate) config_file: String,
    pub(crate) docker_endpoint: Option<String>,
    pub(crate) interval: Option<u64>,
}

impl Args {
    fn show_usage() {
        println!("CCM Manager Usage:");
        println!("  --config-file        Path to config file (required)");
        println!("  --docker-endpoint    Docker Engine API endpoint used for service discovery");
        println!("  --interval           Seconds between reconciliation passes");
    }

    pub(crate) fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();

        if args.len() <= 1 {
            Self::show_usage();
            return Err(anyhow::anyhow!("No arguments provided"));
        }

        let mut config_file = None;
        let mut docker_endpoint = None;
        let mut interval = None;

        let mut args_iter = args.iter().skip(1);
        while let Some(arg) = args_iter.next() {
            match arg.as_str() {
                "--config-file" => {
                    config_file = args_iter.next().map(|s| s.to_string());
                }
                "--docker-endpoint" => {
                    docker_endpoint = args_iter.next().map(|s| s.to_string());
                }
                "--interval" => {
                    interval = match args_iter.next() {
                        Some(value) => Some(
                            value
                                .parse::<u64>()
                                .context(format!("Failed to parse interval: {}", value))?,
                        ),
                        None => None,
                    };
                }
                _ => return Err(anyhow::anyhow!("Unknown argument: {}", arg)),
            }
        }

        Ok(Args {
            config_file: config_file
                .ok_or_else(|| anyhow::anyhow!("Missing required --config-file"))?,
            docker_endpoint,
            interval,
        })
    }
}
