use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chainpocket")]
#[command(about = "Aggregate token holdings and their fiat value for a blockchain address", long_about = None)]
struct Args {
    /// The blockchain address to look up (0x... or T...)
    #[arg(short, long)]
    address: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    println!("Looking up holdings for address: {}\n", args.address);

    match chainpocket::fetch_holdings(&args.address).await {
        Ok(holdings) if holdings.is_empty() => {
            println!("No assets found for this address.");
        }
        Ok(holdings) => {
            println!("{}", "=".repeat(60));
            for balance in &holdings {
                println!(
                    "{:8} | {:>16.4} | ~ ${:.2}",
                    balance.symbol, balance.amount, balance.fiat_value
                );
            }
            println!("{}", "=".repeat(60));
            let total: f64 = holdings.iter().map(|b| b.fiat_value).sum();
            println!("Total: ${total:.2}");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
