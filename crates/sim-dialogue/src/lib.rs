#![deny(warnings)]

//! Branching dialogue engine: the debt-vs-equity financing quiz.
//!
//! A dialogue is a static directed graph of named nodes. Each node poses a
//! question and offers labeled choices; a choice applies stat deltas and
//! names a successor node. The engine assumes nothing about the graph shape
//! (cycles are legal); a node is terminal simply because it defines no
//! outgoing choices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Identifier of a dialogue node, e.g. "start", "results".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Convenience constructor from a literal.
    pub fn of(name: &str) -> Self {
        NodeId(name.to_string())
    }
}

/// One selectable answer at a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Button/label text, unique within its node.
    pub label: String,
    /// Stat deltas applied on selection, in declaration order.
    pub effects: Vec<(String, Decimal)>,
    /// Successor node, taken verbatim.
    pub next: NodeId,
}

/// A question with its outgoing choices. An empty choice list makes the node
/// terminal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionNode {
    /// Question or summary text shown to the player.
    pub question: String,
    /// Outgoing edges.
    pub choices: Vec<Choice>,
}

/// A static dialogue graph. Fully defined before any session starts; all
/// nodes and edges are data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueGraph {
    nodes: BTreeMap<NodeId, DecisionNode>,
}

impl DialogueGraph {
    /// Insert or replace a node.
    pub fn insert(&mut self, id: NodeId, node: DecisionNode) {
        self.nodes.insert(id, node);
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&DecisionNode> {
        self.nodes.get(id)
    }

    /// A node is terminal when it is undefined or defines no choices.
    pub fn is_terminal(&self, id: &NodeId) -> bool {
        self.node(id).map_or(true, |n| n.choices.is_empty())
    }
}

/// The fixed financing quiz: choose debt or equity for a $1M expansion, then
/// face the consequence scenario, then read the results.
pub fn capital_quiz() -> DialogueGraph {
    let mut graph = DialogueGraph::default();
    graph.insert(
        NodeId::of("start"),
        DecisionNode {
            question: "You need $1M for expansion. Choose your financing method:".to_string(),
            choices: vec![
                Choice {
                    label: "Take $1M Debt at 6%".to_string(),
                    effects: vec![
                        ("debt".to_string(), Decimal::new(1_000_000, 0)),
                        ("risk".to_string(), Decimal::new(2, 1)),
                    ],
                    next: NodeId::of("debt_scenario"),
                },
                Choice {
                    label: "Sell 20% Equity".to_string(),
                    effects: vec![("ownership".to_string(), Decimal::new(-2, 1))],
                    next: NodeId::of("equity_scenario"),
                },
            ],
        },
    );
    graph.insert(
        NodeId::of("debt_scenario"),
        DecisionNode {
            question:
                "Debt financing chosen. A downturn hits and cash flow is tight. What do you do?"
                    .to_string(),
            choices: vec![
                Choice {
                    label: "Take $500K Bridge Loan at 8%".to_string(),
                    effects: vec![
                        ("debt".to_string(), Decimal::new(500_000, 0)),
                        ("risk".to_string(), Decimal::new(3, 1)),
                    ],
                    next: NodeId::of("results"),
                },
                Choice {
                    label: "Sell 10% Equity".to_string(),
                    effects: vec![
                        ("ownership".to_string(), Decimal::new(-1, 1)),
                        ("risk".to_string(), Decimal::new(-1, 1)),
                    ],
                    next: NodeId::of("results"),
                },
            ],
        },
    );
    graph.insert(
        NodeId::of("equity_scenario"),
        DecisionNode {
            question:
                "Equity financing chosen. Investors want dividends in a booming market. What do you do?"
                    .to_string(),
            choices: vec![
                Choice {
                    label: "Pay Dividends (reduce cash flow)".to_string(),
                    effects: vec![
                        ("cash".to_string(), Decimal::new(-200_000, 0)),
                        ("risk".to_string(), Decimal::new(1, 1)),
                    ],
                    next: NodeId::of("results"),
                },
                Choice {
                    label: "Reinvest profits for growth".to_string(),
                    effects: vec![
                        ("ownership".to_string(), Decimal::new(-5, 2)),
                        ("risk".to_string(), Decimal::new(-1, 1)),
                    ],
                    next: NodeId::of("results"),
                },
            ],
        },
    );
    graph.insert(
        NodeId::of("results"),
        DecisionNode {
            question: "Results".to_string(),
            choices: vec![],
        },
    );
    graph
}

/// Errors from applying a choice.
#[derive(Debug, Error, PartialEq)]
pub enum DialogueError {
    /// The label is not one of the current node's choices.
    #[error("no choice labeled {label:?} at node {node:?}")]
    UnknownChoice {
        /// Current node name.
        node: String,
        /// The offending label.
        label: String,
    },
    /// The current node has no outgoing choices.
    #[error("node {0:?} is terminal")]
    TerminalNode(String),
}

/// Mutable quiz session: accumulated stats plus the current node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogueSession {
    /// Accumulated stats keyed by name; choices may introduce new keys.
    pub stats: BTreeMap<String, Decimal>,
    /// Current position in the graph.
    pub node: NodeId,
}

impl DialogueSession {
    /// A fresh session at "start" with the fixed initial stats:
    /// cash 1,000,000 / ownership 1.0 / debt 0 / risk 0.
    pub fn new() -> Self {
        let mut stats = BTreeMap::new();
        stats.insert("cash".to_string(), Decimal::new(1_000_000, 0));
        stats.insert("ownership".to_string(), Decimal::ONE);
        stats.insert("debt".to_string(), Decimal::ZERO);
        stats.insert("risk".to_string(), Decimal::ZERO);
        DialogueSession {
            stats,
            node: NodeId::of("start"),
        }
    }

    /// Apply the choice with `label` at the current node.
    ///
    /// Stat deltas accumulate onto existing keys; a delta for a key the
    /// session has never seen sets the key to the delta verbatim. That
    /// asymmetry is deliberate and load-bearing for graphs that introduce
    /// stats mid-dialogue.
    pub fn apply_choice(
        &mut self,
        graph: &DialogueGraph,
        label: &str,
    ) -> Result<&NodeId, DialogueError> {
        let node = graph
            .node(&self.node)
            .filter(|n| !n.choices.is_empty())
            .ok_or_else(|| DialogueError::TerminalNode(self.node.0.clone()))?;
        let choice = node
            .choices
            .iter()
            .find(|c| c.label == label)
            .ok_or_else(|| DialogueError::UnknownChoice {
                node: self.node.0.clone(),
                label: label.to_string(),
            })?;
        for (key, delta) in &choice.effects {
            if let Some(value) = self.stats.get_mut(key) {
                *value += *delta;
            } else {
                self.stats.insert(key.clone(), *delta);
            }
        }
        debug!(from = %self.node.0, to = %choice.next.0, label, "choice applied");
        self.node = choice.next.clone();
        Ok(&self.node)
    }

    /// Atomic reset to the initial stats and the "start" node.
    pub fn restart(&mut self) {
        *self = DialogueSession::new();
    }

    /// Whether the session has reached a node with no outgoing choices.
    pub fn is_terminal(&self, graph: &DialogueGraph) -> bool {
        graph.is_terminal(&self.node)
    }
}

impl Default for DialogueSession {
    fn default() -> Self {
        DialogueSession::new()
    }
}
