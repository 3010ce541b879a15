#![deny(warnings)]

//! Core domain models and invariants for the capital-structure simulator.
//!
//! This crate defines the serializable types shared by both simulation modes
//! (the iterative round simulator and the branching financing quiz) together
//! with validation helpers that guarantee basic invariants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of simulated years in a full round-mode session.
pub const YEARS: u32 = 10;

/// Capital raised each year, in currency units, split between debt and equity.
pub const CAPITAL_NEEDED: u64 = 100_000;

/// Baseline annual interest rate before event adjustments (0.08).
pub fn base_interest_rate() -> Decimal {
    Decimal::new(8, 2)
}

/// Company valuation at the start of a session.
pub fn starting_valuation() -> Decimal {
    Decimal::new(1_000_000, 0)
}

/// Founder ownership at the start of a session, as a percentage.
pub fn starting_ownership_pct() -> Decimal {
    Decimal::ONE_HUNDRED
}

/// Exogenous market events drawn once per simulated year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The central bank raises rates; affects the interest rate only.
    InterestRateHike,
    /// A market boom; lifts valuation.
    MarketBoom,
    /// Recession fears; drags valuation down.
    RecessionWarning,
    /// Nothing happens.
    StableYear,
}

impl EventKind {
    /// Human-readable event name, used in history rows and exports.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::InterestRateHike => "Interest Rate Hike",
            EventKind::MarketBoom => "Market Boom",
            EventKind::RecessionWarning => "Recession Warning",
            EventKind::StableYear => "Stable Year",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A catalog entry for one market event.
///
/// `effect` is a raw magnitude whose interpretation depends on the kind: for
/// [`EventKind::InterestRateHike`] it is a rate delta added to the base rate;
/// for every other kind it is *subtracted* from the valuation delta, so Market
/// Boom carries a negative effect (a bonus after subtraction) and Recession
/// Warning a positive one (a penalty). The inverted signs are part of the
/// catalog's contract; downstream code must not re-interpret them.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDef {
    /// Which event this is.
    pub kind: EventKind,
    /// Raw effect magnitude (rate delta or valuation offset, see above).
    pub effect: Decimal,
    /// Message shown to the player when the event fires.
    pub message: &'static str,
}

impl EventDef {
    /// The fixed four-entry event catalog. Round mode draws uniformly at
    /// random, with replacement, from these.
    pub fn catalog() -> [EventDef; 4] {
        [
            EventDef {
                kind: EventKind::InterestRateHike,
                effect: Decimal::new(2, 2),
                message: "The central bank raised interest rates!",
            },
            EventDef {
                kind: EventKind::MarketBoom,
                effect: Decimal::new(-20_000, 0),
                message: "Market boom! Valuation jumps!",
            },
            EventDef {
                kind: EventKind::RecessionWarning,
                effect: Decimal::new(15_000, 0),
                message: "Recession fears hurt your valuation.",
            },
            EventDef {
                kind: EventKind::StableYear,
                effect: Decimal::ZERO,
                message: "A stable year with no surprises.",
            },
        ]
    }

    /// Looks up the catalog entry for a kind.
    pub fn of(kind: EventKind) -> EventDef {
        let [hike, boom, recession, stable] = Self::catalog();
        match kind {
            EventKind::InterestRateHike => hike,
            EventKind::MarketBoom => boom,
            EventKind::RecessionWarning => recession,
            EventKind::StableYear => stable,
        }
    }
}

/// Mutable per-session financial state for the round simulator.
///
/// One instance lives for the whole session; the runtime advances it once per
/// committed round and resets it atomically on restart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialState {
    /// Current year, 1-based. Runs past `YEARS` by one once the session ends.
    pub year: u32,
    /// Estimated company valuation in currency units.
    pub valuation: Decimal,
    /// Founder ownership retained, in percent (0..=100).
    pub ownership_pct: Decimal,
}

impl FinancialState {
    /// A fresh state with the fixed initial values.
    pub fn new() -> Self {
        FinancialState {
            year: 1,
            valuation: starting_valuation(),
            ownership_pct: starting_ownership_pct(),
        }
    }

    /// Restores the initial values in one assignment.
    pub fn reset(&mut self) {
        *self = FinancialState::new();
    }
}

impl Default for FinancialState {
    fn default() -> Self {
        FinancialState::new()
    }
}

/// Immutable snapshot of one committed round, in chronological order within
/// the session history. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Year the round was played in.
    pub year: u32,
    /// Chosen debt share of the raised capital, in percent.
    pub debt_pct: u32,
    /// Complement of `debt_pct`.
    pub equity_pct: u32,
    /// Interest rate applied to the debt tranche (e.g. 0.08).
    pub interest_rate: Decimal,
    /// Interest paid this year, rounded to cents.
    pub interest_paid: Decimal,
    /// Ownership retained after dilution, rounded to two decimals.
    pub ownership_pct: Decimal,
    /// Debt-to-equity risk heuristic in [0, 100].
    pub risk_score: u32,
    /// Valuation after this round, rounded to two decimals.
    pub valuation: Decimal,
    /// The event that fired this year.
    pub event: EventKind,
}

/// Validation errors for player decisions.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Debt percent must be within [0, 100].
    #[error("debt percent {0} is out of range [0, 100]")]
    DebtPercentOutOfRange(u32),
}

/// Validate a debt-percent decision. Out-of-range input is rejected loudly
/// rather than clamped.
pub fn validate_debt_percent(debt_pct: u32) -> Result<(), ValidationError> {
    if debt_pct > 100 {
        return Err(ValidationError::DebtPercentOutOfRange(debt_pct));
    }
    Ok(())
}
