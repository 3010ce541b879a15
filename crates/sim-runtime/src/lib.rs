#![deny(warnings)]

//! Session engine for the round simulator.
//!
//! Owns the single long-lived [`FinancialState`] and the append-only history,
//! and mediates every interaction: pure previews, committed round
//! submissions, atomic restarts, render snapshots, and CSV export. The
//! hosting shell never touches the state directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{validate_debt_percent, EventDef, FinancialState, HistoryEntry, YEARS};
use sim_econ::{resolve_round, EconError, EventSource, RoundOutcome, ScriptedEvents, UniformEvents};
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced to the shell.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// All rounds are played; only restart is allowed.
    #[error("the {0}-year simulation is over")]
    SimulationOver(u32),
    /// The round transition rejected the decision.
    #[error(transparent)]
    Econ(#[from] EconError),
}

/// Decision inputs accepted from the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decisionType", rename_all = "camelCase")]
pub enum Input {
    /// Commit a round with the given debt share.
    #[serde(rename_all = "camelCase")]
    DebtSplit {
        /// Debt percent in [0, 100].
        debt_percent: u32,
    },
    /// Reset the session.
    Restart,
}

/// Serializable view of the session for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    /// Current financial state.
    pub state: FinancialState,
    /// Current year (alias of `state.year` for convenient titling).
    pub year: u32,
    /// True once every round is played.
    pub is_terminal: bool,
    /// Chronological round history.
    pub history: Vec<HistoryEntry>,
}

/// End-of-game report, available once the session is terminal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    /// Final valuation, rounded to two decimals.
    pub final_valuation: Decimal,
    /// Final retained ownership percent, rounded to two decimals.
    pub final_ownership_pct: Decimal,
}

/// A single-player simulation session.
pub struct Session {
    state: FinancialState,
    history: Vec<HistoryEntry>,
    events: Box<dyn EventSource>,
}

impl Session {
    /// Session with a custom event source.
    pub fn with_events(events: Box<dyn EventSource>) -> Self {
        Session {
            state: FinancialState::new(),
            history: Vec::new(),
            events,
        }
    }

    /// Session drawing events from OS entropy.
    pub fn new() -> Self {
        Self::with_events(Box::new(UniformEvents::from_entropy()))
    }

    /// Reproducible session from a seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_events(Box::new(UniformEvents::seeded(seed)))
    }

    /// Session with a fixed event script (tests, replays).
    pub fn scripted(events: ScriptedEvents) -> Self {
        Self::with_events(Box::new(events))
    }

    /// Current financial state.
    pub fn state(&self) -> &FinancialState {
        &self.state
    }

    /// Committed rounds in chronological order.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Current year, 1-based.
    pub fn year(&self) -> u32 {
        self.state.year
    }

    /// Terminal exactly when the year counter has passed `YEARS`.
    pub fn is_terminal(&self) -> bool {
        self.state.year > YEARS
    }

    /// Resolve a round against the current state without committing anything.
    ///
    /// The shell calls this on every input change (slider movement) with the
    /// event it is currently displaying; repeated calls with the same inputs
    /// are free of side effects.
    pub fn preview(&self, debt_pct: u32, event: &EventDef) -> Result<RoundOutcome, SessionError> {
        if self.is_terminal() {
            return Err(SessionError::SimulationOver(YEARS));
        }
        Ok(resolve_round(&self.state, debt_pct, event)?)
    }

    /// Draw this year's event, resolve the round, and commit it: append the
    /// history entry and advance year, valuation, and ownership.
    pub fn submit(&mut self, debt_pct: u32) -> Result<HistoryEntry, SessionError> {
        if self.is_terminal() {
            return Err(SessionError::SimulationOver(YEARS));
        }
        // Reject bad input before consuming a draw from the event source.
        validate_debt_percent(debt_pct).map_err(EconError::Invalid)?;
        let event = self.events.draw();
        let outcome = resolve_round(&self.state, debt_pct, &event)?;
        let entry = HistoryEntry {
            year: self.state.year,
            debt_pct: outcome.debt_pct,
            equity_pct: outcome.equity_pct,
            interest_rate: outcome.interest_rate,
            interest_paid: outcome.interest_paid,
            ownership_pct: outcome.ownership_pct.round_dp(2),
            risk_score: outcome.risk_score,
            valuation: outcome.new_valuation.round_dp(2),
            event: event.kind,
        };
        self.state.valuation = outcome.new_valuation;
        self.state.ownership_pct = outcome.ownership_pct;
        self.state.year += 1;
        self.history.push(entry.clone());
        info!(
            year = entry.year,
            event = %entry.event,
            risk = entry.risk_score,
            "round committed"
        );
        Ok(entry)
    }

    /// Atomic restart: state back to the initial constants, history cleared.
    pub fn restart(&mut self) {
        self.state.reset();
        self.history.clear();
        debug!("session restarted");
    }

    /// Route a presentation-layer input event.
    pub fn handle(&mut self, input: Input) -> Result<Option<HistoryEntry>, SessionError> {
        match input {
            Input::DebtSplit { debt_percent } => self.submit(debt_percent).map(Some),
            Input::Restart => {
                self.restart();
                Ok(None)
            }
        }
    }

    /// Render view of the whole session.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            year: self.state.year,
            is_terminal: self.is_terminal(),
            history: self.history.clone(),
        }
    }

    /// End-of-game report; `None` while rounds remain.
    pub fn summary(&self) -> Option<Summary> {
        if !self.is_terminal() {
            return None;
        }
        Some(Summary {
            final_valuation: self.state.valuation.round_dp(2),
            final_ownership_pct: self.state.ownership_pct.round_dp(2),
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

/// Render the history as CSV: fixed header, one row per round in order.
///
/// Decimal fields are normalized (no trailing zeros) and the interest rate is
/// shown as a percentage, matching the on-screen report format.
pub fn export_csv(history: &[HistoryEntry]) -> String {
    let mut out = String::from(
        "Year,Debt %,Equity %,Interest Rate,Interest Paid,Ownership %,Risk Score,Valuation,Event\n",
    );
    for entry in history {
        let rate_pct = (entry.interest_rate * Decimal::ONE_HUNDRED)
            .round_dp(2)
            .normalize();
        out.push_str(&format!(
            "{},{},{},{}%,{},{},{},{},{}\n",
            entry.year,
            entry.debt_pct,
            entry.equity_pct,
            rate_pct,
            entry.interest_paid.normalize(),
            entry.ownership_pct.normalize(),
            entry.risk_score,
            entry.valuation.normalize(),
            entry.event,
        ));
    }
    out
}
