#![deny(warnings)]

//! Interactive terminal shell for the capital-structure simulator.
//!
//! Two modes: `--mode rounds` (default) plays the ten-year financing game,
//! `--mode quiz` runs the branching debt-vs-equity quiz. All decision logic
//! lives in the sim crates; this binary only prompts, validates raw input,
//! and prints.

use anyhow::Result;
use rust_decimal::Decimal;
use sim_core::{validate_debt_percent, EventDef, YEARS};
use sim_dialogue::{capital_quiz, DialogueSession};
use sim_runtime::{export_csv, Session};
use std::io::{self, BufRead, Write};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum Mode {
    Rounds,
    Quiz,
}

fn parse_args() -> (Mode, Option<u64>, Option<String>) {
    let mut mode = Mode::Rounds;
    let mut seed: Option<u64> = None;
    let mut export: Option<String> = None;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--mode" => {
                if let Some(m) = it.next() {
                    if m == "quiz" {
                        mode = Mode::Quiz;
                    }
                }
            }
            "--seed" => seed = it.next().and_then(|s| s.parse().ok()),
            "--export" => export = it.next(),
            _ => {}
        }
    }
    (mode, seed, export)
}

fn prompt(text: &str) -> Result<String> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        anyhow::bail!("stdin closed");
    }
    Ok(line.trim().to_string())
}

fn read_debt_percent() -> Result<u32> {
    loop {
        let line = prompt("Choose % debt (0-100): ")?;
        match line.parse::<u32>() {
            Ok(pct) if validate_debt_percent(pct).is_ok() => return Ok(pct),
            _ => println!("Please enter a whole number between 0 and 100."),
        }
    }
}

fn as_pct(rate: Decimal) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).round_dp(2).normalize()
}

fn run_rounds(seed: Option<u64>, export: Option<String>) -> Result<()> {
    let mut session = match seed {
        Some(s) => Session::with_seed(s),
        None => Session::new(),
    };
    println!("CFO's Dilemma: Capital Structure Simulator");

    while !session.is_terminal() {
        let state = session.state();
        println!();
        println!(
            "Year {} of {} | valuation ${} | ownership {}%",
            state.year,
            YEARS,
            state.valuation.round_dp(2).normalize(),
            state.ownership_pct.round_dp(2).normalize()
        );
        let pct = read_debt_percent()?;
        let entry = session.submit(pct)?;
        println!("{}", EventDef::of(entry.event).message);
        println!(
            "Interest {}% -> paid ${} | risk {} | ownership {}% | valuation ${}",
            as_pct(entry.interest_rate),
            entry.interest_paid.normalize(),
            entry.risk_score,
            entry.ownership_pct.normalize(),
            entry.valuation.normalize()
        );
    }

    println!();
    println!("Game over! You've completed all {YEARS} simulation rounds.");
    if let Some(summary) = session.summary() {
        println!("Final company valuation: ${}", summary.final_valuation.normalize());
        println!("Final ownership: {}%", summary.final_ownership_pct.normalize());
    }
    if let Some(path) = export {
        std::fs::write(&path, export_csv(session.history()))?;
        info!(path = %path, "history exported");
        println!("Report written to {path}");
    }
    Ok(())
}

fn run_quiz() -> Result<()> {
    let graph = capital_quiz();
    let mut session = DialogueSession::new();
    println!("Debt vs. Equity - Decision Tree Quiz");

    while !session.is_terminal(&graph) {
        let labels: Vec<String> = match graph.node(&session.node) {
            Some(node) => {
                println!();
                println!("{}", node.question);
                node.choices.iter().map(|c| c.label.clone()).collect()
            }
            None => break,
        };
        for (i, label) in labels.iter().enumerate() {
            println!("  {}) {}", i + 1, label);
        }
        let line = prompt("Pick an option: ")?;
        let picked = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| labels.get(i));
        match picked {
            Some(label) => {
                session.apply_choice(&graph, label)?;
            }
            None => println!("Enter one of the listed option numbers."),
        }
    }

    println!();
    println!("Results:");
    if let Some(ownership) = session.stats.get("ownership") {
        println!("Ownership retained: {}%", as_pct(*ownership));
    }
    if let Some(debt) = session.stats.get("debt") {
        println!("Total debt: ${}", debt.normalize());
    }
    if let Some(cash) = session.stats.get("cash") {
        println!("Company cash: ${}", cash.normalize());
    }
    if let Some(risk) = session.stats.get("risk") {
        println!("Risk level: {} (higher is riskier)", risk.normalize());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let (mode, seed, export) = parse_args();
    info!(?mode, ?seed, "starting CLI");

    match mode {
        Mode::Rounds => run_rounds(seed, export),
        Mode::Quiz => run_quiz(),
    }
}
