// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use feecalc::{format_brl, CalculatorSession, Config, FeeTable, Modality};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = Config::from_env();

    let table = FeeTable::standard();
    if let Err(problems) = table.validate() {
        bail!("Fee table is inconsistent: {}", problems.join("; "));
    }

    match args.get(1).map(String::as_str) {
        Some("history") => {
            config.init_stdout_logging();
            run_history(&config, table)
        }
        Some("calc") => {
            config.init_stdout_logging();
            run_calc(&config, table, &args[2..])
        }
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            eprintln!("   Usage: feecalc [history | calc <amount> <modality> [installments]]");
            std::process::exit(2);
        }
        // UI mode (default)
        None => run_ui_mode(&config, table),
    }
}

fn run_history(config: &Config, table: FeeTable) -> Result<()> {
    let session = CalculatorSession::open(&config.history_file, table);
    let history = session.history();

    println!("📜 Histórico de Cálculos ({})", session.history_path().display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if history.is_empty() {
        println!("Nenhum cálculo registrado.");
        return Ok(());
    }

    println!(
        "{:<20} {:>14} {:<26} {:>14} {:>14}",
        "Data", "Desejado (R$)", "Modalidade", "Cobrar (R$)", "Recebido (R$)"
    );
    for record in history {
        println!(
            "{:<20} {:>14.2} {:<26} {:>14.2} {:>14.2}",
            record.timestamp_string(),
            record.desired_net,
            record.modality_label,
            record.gross,
            record.net_received
        );
    }

    Ok(())
}

fn run_calc(config: &Config, table: FeeTable, args: &[String]) -> Result<()> {
    let (amount, modality) = match args {
        [amount, modality, ..] => (amount, modality),
        _ => bail!("Usage: feecalc calc <amount> <debit-now|credit-now|credit-installments> [installments]"),
    };

    let modality: Modality = modality.parse()?;
    let installments = args
        .get(2)
        .map(|n| n.parse::<u32>())
        .transpose()
        .with_context(|| format!("Invalid installment count: {:?}", args.get(2)))?;

    let mut session = CalculatorSession::open(&config.history_file, table);
    let result = session.calculate(amount, modality, installments)?;

    println!("🧮 {}", result.label());
    println!("   Valor a Cobrar: {}", format_brl(result.gross));
    println!("   Você Receberá:  {} (Aprox.)", format_brl(result.net_received));
    if result.is_split() {
        println!(
            "   📌 {} parcelas de {}",
            result.installments,
            format_brl(result.per_installment)
        );
    }
    println!("✓ Registrado em {}", session.history_path().display());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config, table: FeeTable) -> Result<()> {
    config.init_file_logging()?;

    let session = CalculatorSession::open(&config.history_file, table);
    tracing::info!(
        path = %config.history_file.display(),
        records = session.history_len(),
        "history loaded"
    );

    let mut app = ui::App::new(session);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config, _table: FeeTable) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web calculator: cargo run --bin feecalc-server --features server");
    std::process::exit(1);
}
