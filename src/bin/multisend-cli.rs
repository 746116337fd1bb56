use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "multisend-cli")]
#[command(about = "Management CLI for the EVM mass-send service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Owner identity sent as `x-owner-id`.
    #[arg(short, long, env = "MULTISEND_OWNER")]
    owner: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// List configured networks
    Networks,
    /// List your wallets
    Wallets,
    /// Import a wallet; the private key is read from an environment variable
    Import {
        #[arg(long)]
        network: String,
        #[arg(long, default_value = "")]
        name: String,
        /// Environment variable holding the hex private key
        #[arg(long, default_value = "WALLET_PRIVATE_KEY")]
        key_env: String,
    },
    /// Delete a wallet (transfer history is kept)
    Delete { id: String },
    /// Refresh cached balances
    Refresh,
    /// Send from one wallet
    Send {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        to: String,
        /// Amount in native units, e.g. 0.25
        #[arg(long)]
        amount: String,
    },
    /// List your transfer history
    Transfers,
    /// Drain several wallets into one destination
    MassSend {
        #[arg(long)]
        to: String,
        /// Native asset symbol, e.g. SepoliaETH
        #[arg(long)]
        asset: String,
        #[arg(long)]
        network: Option<String>,
        /// Wallet ids to drain
        #[arg(required = true)]
        wallets: Vec<String>,
    },
    /// Show a mass-send operation and its transfers
    Operation { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert("x-owner-id", HeaderValue::from_str(&cli.owner)?);

    let (method, path, body) = match cli.command {
        Commands::Status => (Method::GET, "/health".to_string(), None),
        Commands::Networks => (Method::GET, "/networks".to_string(), None),
        Commands::Wallets => (Method::GET, "/wallets".to_string(), None),
        Commands::Import { network, name, key_env } => {
            let private_key = std::env::var(&key_env).map_err(|_| format!("environment variable {} is not set", key_env))?;
            let body = json!({ "display_name": name, "private_key": private_key, "network": network });
            (Method::POST, "/wallets".to_string(), Some(body))
        }
        Commands::Delete { id } => (Method::DELETE, format!("/wallets/{}", id), None),
        Commands::Refresh => (Method::POST, "/wallets/refresh".to_string(), None),
        Commands::Send { wallet, to, amount } => {
            let body = json!({ "wallet_id": wallet, "destination_address": to, "amount": amount });
            (Method::POST, "/transfers".to_string(), Some(body))
        }
        Commands::Transfers => (Method::GET, "/transfers".to_string(), None),
        Commands::MassSend {
            to,
            asset,
            network,
            wallets,
        } => {
            let body = json!({
                "destination_address": to,
                "asset_symbol": asset,
                "network": network,
                "wallet_ids": wallets,
            });
            (Method::POST, "/mass-send".to_string(), Some(body))
        }
        Commands::Operation { id } => (Method::GET, format!("/operations/{}", id), None),
    };

    let mut request = client.request(method, format!("{}{}", cli.url, path)).headers(headers);
    if let Some(body) = body {
        request = request.json(&body);
    }
    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
