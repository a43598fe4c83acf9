use std::fs::OpenOptions;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use portfolio_planner::api::run_http_server;
use portfolio_planner::config::EngineConfig;
use portfolio_planner::core::{
    Debt, DebtKind, PortfolioEngine, PortfolioInputs, RiskPref, amortize,
    compare_pay_down_vs_invest,
};
use portfolio_planner::store::{ExportSink, JsonLinesSink, PortfolioSummary};

#[derive(Parser, Debug)]
#[command(
    name = "portfolio-planner",
    about = "Rule-based savings portfolio planner with debt pay-down comparison"
)]
struct Cli {
    #[arg(long, global = true, help = "JSON engine configuration file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Run the HTTP API")]
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    #[command(about = "Compute a portfolio mix for one set of inputs")]
    Portfolio(PortfolioArgs),
    #[command(about = "Amortization summary for one debt")]
    Amortize(DebtArgs),
    #[command(about = "Compare paying a debt down faster with investing the same amount")]
    Compare {
        #[command(flatten)]
        debt: DebtArgs,
        #[arg(long, help = "Comparison horizon in years")]
        horizon_years: f64,
        #[arg(long, help = "Expected annual investment return in percent, e.g. 6")]
        expected_return: f64,
    },
}

#[derive(Args, Debug)]
struct PortfolioArgs {
    #[arg(long, default_value_t = 0.0)]
    lump_sum: f64,
    #[arg(long, default_value_t = 0.0, help = "Monthly contribution in EUR")]
    monthly: f64,
    #[arg(long, default_value_t = 0.0)]
    horizon_years: f64,
    #[arg(long, default_value_t = 0.0, help = "Emergency reserve in EUR")]
    reserve: f64,
    #[arg(long, default_value_t = 0.0, help = "Emergency reserve in months of expenses")]
    reserve_months: f64,
    #[arg(long, value_enum, default_value_t = CliRiskPref::Balanced)]
    risk_pref: CliRiskPref,
    #[arg(long, help = "Append a JSON-lines summary to this file")]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DebtArgs {
    #[arg(long)]
    balance: f64,
    #[arg(long, help = "Annual interest rate in percent, e.g. 4.5")]
    rate: f64,
    #[arg(long)]
    payment: f64,
    #[arg(long, default_value_t = 0)]
    months_remaining: u32,
    #[arg(long, default_value_t = 0.0)]
    extra_monthly: f64,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliRiskPref {
    Conservative,
    Balanced,
    Growth,
}

impl From<CliRiskPref> for RiskPref {
    fn from(value: CliRiskPref) -> Self {
        match value {
            CliRiskPref::Conservative => RiskPref::Conservative,
            CliRiskPref::Balanced => RiskPref::Balanced,
            CliRiskPref::Growth => RiskPref::Growth,
        }
    }
}

impl DebtArgs {
    fn to_debt(&self) -> Debt {
        Debt {
            id: "cli".to_string(),
            kind: DebtKind::Other,
            balance: self.balance,
            rate_pa: self.rate,
            monthly_payment: self.payment,
            months_remaining: self.months_remaining,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => {
            let config = EngineConfig::from_file(path).map_err(|e| e.to_string())?;
            info!(path = %path.display(), "loaded engine config");
            config
        }
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Serve { port } => run_http_server(port, config)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Portfolio(args) => {
            let inputs = PortfolioInputs {
                lump_sum_eur: args.lump_sum,
                monthly_contribution: args.monthly,
                horizon_years: args.horizon_years,
                reserve_eur: args.reserve,
                reserve_months: args.reserve_months,
                risk_pref: args.risk_pref.into(),
                base_mix: None,
            };
            let output = PortfolioEngine::new(config).compute(&inputs);

            if let Some(path) = &args.export {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| format!("cannot open {}: {e}", path.display()))?;
                JsonLinesSink::new(file)
                    .deliver(&PortfolioSummary::from(&output))
                    .map_err(|e| e.to_string())?;
            }
            print_json(&output)
        }
        Command::Amortize(args) => print_json(&amortize(&args.to_debt(), args.extra_monthly)),
        Command::Compare {
            debt,
            horizon_years,
            expected_return,
        } => print_json(&compare_pay_down_vs_invest(
            &debt.to_debt(),
            debt.extra_monthly,
            horizon_years,
            expected_return / 100.0,
        )),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
