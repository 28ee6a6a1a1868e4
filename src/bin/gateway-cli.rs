use std::path::PathBuf;

use clap::{Parser, Subcommand};

use campus_gateway::auth::TokenVerifier;
use campus_gateway::config::load_config;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Offline helpers for the campus gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration (environment overrides applied)
    CheckConfig {
        path: Option<PathBuf>,
    },
    /// Verify a bearer token and print its claims
    VerifyToken {
        #[arg(short, long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,

        #[arg(short, long, env = "ISSUER")]
        issuer: Option<String>,

        token: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { path } => {
            let mut config = load_config(path.as_deref())?;
            config.auth.secret = "<redacted>".to_string();
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::VerifyToken {
            secret,
            issuer,
            token,
        } => {
            let verifier = TokenVerifier::new(secret.as_bytes(), issuer.as_deref());
            match verifier.verify(&token) {
                Ok(claims) => println!("{}", serde_json::to_string_pretty(&claims)?),
                Err(e) => {
                    eprintln!("Error: token rejected: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
