//! AdvancePay CLI - trader platform operations from the command line
//!
//! Usage:
//! ```bash
//! advancepay init
//! advancepay trader create --name ivan --team TEAM_001 --security 500
//! advancepay deposit TRD_001 1700
//! advancepay withdraw request TRD_001 200 TJYxNdv3T1QQHrWYPTQJYNqPJqGJLQxnVZ
//! advancepay security set TRD_001 1000
//! advancepay notify ingest TRD_001 ru.sberbankmobile "Сбербанк" "Зачисление 5 000 ₽"
//! advancepay audit --from 2026-08-01 --to 2026-08-07
//! advancepay report --format markdown --report-type balance
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

mod commands;
mod db;

use commands::{audit, dispute, notify, requisite, trader, wallet};

/// AdvancePay - payment-processing platform core with a deposit waterfall
#[derive(Parser)]
#[command(name = "advancepay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, default_value = "data/advancepay.db", global = true)]
    pub db: PathBuf,

    /// Events directory path
    #[arg(long, default_value = "data/events", global = true)]
    pub events_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database with schema and seed data
    Init {
        /// Force re-initialization (drops existing data)
        #[arg(long)]
        force: bool,
    },

    /// Show database status
    Status,

    /// Trader account management
    Trader {
        #[command(subcommand)]
        action: TraderAction,
    },

    /// Record an observed chain deposit
    Deposit {
        /// Trader ID (e.g., TRD_001)
        trader_id: String,
        /// Amount in USDT
        amount: Decimal,
        /// On-chain transaction hash
        #[arg(long)]
        tx_hash: Option<String>,
    },

    /// Withdrawal lifecycle
    Withdraw {
        #[command(subcommand)]
        action: WithdrawAction,
    },

    /// Security requirement control (team lead)
    Security {
        #[command(subcommand)]
        action: SecurityAction,
    },

    /// Bank notification relay
    Notify {
        #[command(subcommand)]
        action: NotifyAction,
    },

    /// Requisite management
    Requisite {
        #[command(subcommand)]
        action: RequisiteAction,
    },

    /// Dispute lifecycle
    Dispute {
        #[command(subcommand)]
        action: DisputeAction,
    },

    /// Read the audit journal
    Audit {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Trader ID to filter
        #[arg(long)]
        trader: Option<String>,
        /// Reader identity, journaled as an audit access
        #[arg(long, default_value = "TL_001")]
        actor: String,
    },

    /// Generate reports
    Report {
        /// Report format
        #[arg(long, default_value = "markdown")]
        format: ReportFormat,
        /// Output file path (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Report type
        #[arg(long, default_value = "balance")]
        report_type: ReportType,
    },
}

#[derive(Subcommand)]
pub enum TraderAction {
    /// Provision a new trader with an empty ledger
    Create {
        /// Login name
        #[arg(long, short)]
        name: String,
        /// Team ID
        #[arg(long, short)]
        team: Option<String>,
        /// Required security deposit, USDT
        #[arg(long, short, default_value = "500")]
        security: Decimal,
        /// Acting team lead
        #[arg(long, default_value = "TL_001")]
        actor: String,
    },
    /// List all traders
    List,
    /// Show one trader
    Show {
        /// Trader ID
        trader_id: String,
    },
    /// Show a trader's balance split
    Balance {
        /// Trader ID
        trader_id: String,
    },
}

#[derive(Subcommand)]
pub enum WithdrawAction {
    /// Raise a withdrawal request (capped at working balance)
    Request {
        trader_id: String,
        /// Amount in USDT
        amount: Decimal,
        /// Destination address
        address: String,
    },
    /// Settle a pending withdrawal
    Complete {
        transaction_id: String,
        /// On-chain transaction hash
        tx_hash: String,
    },
    /// Cancel a pending withdrawal (refunds the ledger)
    Cancel { transaction_id: String },
}

#[derive(Subcommand)]
pub enum SecurityAction {
    /// Change a trader's required security deposit
    Set {
        trader_id: String,
        /// New requirement in USDT
        amount: Decimal,
        /// Acting team lead
        #[arg(long, default_value = "TL_001")]
        actor: String,
    },
}

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Ingest a relayed bank notification
    Ingest {
        trader_id: String,
        /// Source app package
        app_package: String,
        /// Notification title
        title: String,
        /// Notification text
        text: String,
        /// Relaying device ID
        #[arg(long)]
        device: Option<String>,
    },
    /// List a trader's notifications
    List {
        trader_id: String,
        #[arg(long, default_value = "1")]
        page: i64,
        #[arg(long, default_value = "20")]
        page_size: i64,
    },
}

#[derive(Subcommand)]
pub enum RequisiteAction {
    /// Add a card requisite
    AddCard {
        trader_id: String,
        /// Bank name
        bank: String,
        /// Masked card number
        number: String,
        /// Holder name
        holder: String,
        /// Daily limit, RUB
        #[arg(long, default_value = "300000")]
        daily: Decimal,
        /// Monthly limit, RUB
        #[arg(long, default_value = "5000000")]
        monthly: Decimal,
    },
    /// Add an SBP requisite
    AddSbp {
        trader_id: String,
        bank: String,
        /// Phone number
        phone: String,
        holder: String,
        #[arg(long, default_value = "300000")]
        daily: Decimal,
        #[arg(long, default_value = "5000000")]
        monthly: Decimal,
    },
    /// List a trader's requisites
    List { trader_id: String },
    /// Record a processed RUB payment against a requisite
    Use {
        requisite_id: String,
        /// Amount in RUB
        amount: Decimal,
    },
    /// Take a requisite out of rotation
    Deactivate { requisite_id: String },
}

#[derive(Subcommand)]
pub enum DisputeAction {
    /// Open a dispute against a transaction
    Open {
        trader_id: String,
        transaction_id: String,
        /// Disputed amount, RUB
        amount: Decimal,
        /// RUB per USDT rate to fix the claim size
        #[arg(long, default_value = "92.45")]
        rate: Decimal,
        #[arg(long, default_value = "payment-not-received")]
        reason: DisputeReasonArg,
        /// Client's message
        #[arg(long)]
        message: Option<String>,
    },
    /// Record the trader's response
    Respond {
        dispute_id: String,
        response: String,
    },
    /// Close a dispute with an outcome
    Resolve {
        dispute_id: String,
        #[arg(long)]
        outcome: DisputeOutcomeArg,
        /// Acting support/team lead
        #[arg(long, default_value = "TL_001")]
        actor: String,
    },
    /// List disputes
    List {
        /// Filter by trader
        #[arg(long)]
        trader: Option<String>,
        /// Filter by status
        #[arg(long)]
        status: Option<DisputeStatusArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DisputeReasonArg {
    PaymentNotReceived,
    AmountMismatch,
    DuplicatePayment,
    WrongDetails,
    Timeout,
    Other,
}

impl DisputeReasonArg {
    pub fn to_core(self) -> advancepay_core::DisputeReason {
        use advancepay_core::DisputeReason::*;
        match self {
            DisputeReasonArg::PaymentNotReceived => PaymentNotReceived,
            DisputeReasonArg::AmountMismatch => AmountMismatch,
            DisputeReasonArg::DuplicatePayment => DuplicatePayment,
            DisputeReasonArg::WrongDetails => WrongDetails,
            DisputeReasonArg::Timeout => Timeout,
            DisputeReasonArg::Other => Other,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DisputeOutcomeArg {
    Won,
    Lost,
    Resolved,
}

impl DisputeOutcomeArg {
    pub fn to_core(self) -> advancepay_core::DisputeStatus {
        match self {
            DisputeOutcomeArg::Won => advancepay_core::DisputeStatus::Won,
            DisputeOutcomeArg::Lost => advancepay_core::DisputeStatus::Lost,
            DisputeOutcomeArg::Resolved => advancepay_core::DisputeStatus::Resolved,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DisputeStatusArg {
    Open,
    Pending,
    Resolved,
    Won,
    Lost,
}

impl DisputeStatusArg {
    pub fn to_core(self) -> advancepay_core::DisputeStatus {
        match self {
            DisputeStatusArg::Open => advancepay_core::DisputeStatus::Open,
            DisputeStatusArg::Pending => advancepay_core::DisputeStatus::Pending,
            DisputeStatusArg::Resolved => advancepay_core::DisputeStatus::Resolved,
            DisputeStatusArg::Won => advancepay_core::DisputeStatus::Won,
            DisputeStatusArg::Lost => advancepay_core::DisputeStatus::Lost,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
    Markdown,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportType {
    Balance,
    Disputes,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Ensure data directories exist
    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    std::fs::create_dir_all(&cli.events_dir).ok();

    match cli.command {
        Commands::Init { force } => {
            db::init_database(&cli.db, force).await?;
            println!("✅ Database initialized at {:?}", cli.db);
        }

        Commands::Status => {
            db::show_status(&cli.db).await?;
        }

        Commands::Trader { action } => {
            trader::handle(&cli.db, &cli.events_dir, action).await?;
        }

        Commands::Deposit {
            trader_id,
            amount,
            tx_hash,
        } => {
            wallet::deposit(&cli.db, &cli.events_dir, &trader_id, amount, tx_hash.as_deref())
                .await?;
        }

        Commands::Withdraw { action } => {
            wallet::handle_withdraw(&cli.db, &cli.events_dir, action).await?;
        }

        Commands::Security { action } => {
            trader::handle_security(&cli.db, &cli.events_dir, action).await?;
        }

        Commands::Notify { action } => {
            notify::handle(&cli.db, &cli.events_dir, action).await?;
        }

        Commands::Requisite { action } => {
            requisite::handle(&cli.db, &cli.events_dir, action).await?;
        }

        Commands::Dispute { action } => {
            dispute::handle(&cli.db, &cli.events_dir, action).await?;
        }

        Commands::Audit {
            from,
            to,
            trader,
            actor,
        } => {
            audit::run_audit(&cli.db, &cli.events_dir, from, to, trader, &actor).await?;
        }

        Commands::Report {
            format,
            output,
            report_type,
        } => {
            audit::generate_report(&cli.db, format, output, report_type).await?;
        }
    }

    Ok(())
}
