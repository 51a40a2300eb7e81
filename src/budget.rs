//! Resource budget enforced on the event stream while binding.
//!
//! Limits are checked per event, before the event reaches the binding engine, so that
//! hostile inputs (deep nesting, alias fan-out, huge scalars) are stopped early.

use ahash::AHashSet;

use crate::event::{Event, EventKind};

/// Budgets for one binding run.
///
/// The defaults are permissive for typical configuration files while stopping obvious
/// resource-amplifying inputs.
///
/// ```rust
/// use saphyr_bind::{Budget, Options};
///
/// let options = saphyr_bind::options! {
///     budget: Some(Budget { max_depth: 8, ..Budget::default() }),
/// };
/// let err = saphyr_bind::from_str_with_options::<saphyr_bind::Value>(
///     "[[[[[[[[[[1]]]]]]]]]]",
///     options,
/// )
/// .unwrap_err();
/// assert!(matches!(err, saphyr_bind::Error::Budget { .. }));
/// ```
#[derive(Clone, Debug)]
pub struct Budget {
    /// Maximum total events, stream and document markers included.
    ///
    /// Default: 1,000,000
    pub max_events: usize,
    /// Maximum number of alias events.
    ///
    /// Default: 50,000
    pub max_aliases: usize,
    /// Maximum number of distinct anchor names.
    ///
    /// Default: 50,000
    pub max_anchors: usize,
    /// Maximum nesting of sequences and mappings.
    ///
    /// Default: 2,000
    pub max_depth: usize,
    /// Maximum number of nodes (collections and scalars).
    ///
    /// Default: 250,000
    pub max_nodes: usize,
    /// Maximum total bytes of scalar text.
    ///
    /// Default: 67,108,864 (64 MiB)
    pub max_total_scalar_bytes: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_events: 1_000_000,
            max_aliases: 50_000,
            max_anchors: 50_000,
            max_depth: 2_000,
            max_nodes: 250_000,
            max_total_scalar_bytes: 64 * 1024 * 1024,
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetBreach {
    Events { events: usize },
    Aliases { aliases: usize },
    Anchors { anchors: usize },
    Depth { depth: usize },
    Nodes { nodes: usize },
    ScalarBytes { total_scalar_bytes: usize },
}

/// Counters observed so far.
#[derive(Clone, Debug, Default)]
pub struct BudgetReport {
    pub events: usize,
    pub aliases: usize,
    pub anchors: usize,
    pub nodes: usize,
    pub max_depth: usize,
    pub total_scalar_bytes: usize,
}

/// Stateful helper that enforces a [`Budget`] while consuming events.
#[derive(Debug)]
pub struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
    depth: usize,
    defined_anchors: AHashSet<String>,
}

impl BudgetEnforcer {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
            defined_anchors: AHashSet::new(),
        }
    }

    pub fn report(&self) -> &BudgetReport {
        &self.report
    }

    /// Observe an event, updating the counters.
    ///
    /// Returns `Err(BudgetBreach)` as soon as a limit is exceeded.
    pub fn observe(&mut self, ev: &Event) -> Result<(), BudgetBreach> {
        self.report.events += 1;
        if self.report.events > self.budget.max_events {
            return Err(BudgetBreach::Events {
                events: self.report.events,
            });
        }

        match ev.kind {
            EventKind::Alias => {
                self.report.aliases += 1;
                if self.report.aliases > self.budget.max_aliases {
                    return Err(BudgetBreach::Aliases {
                        aliases: self.report.aliases,
                    });
                }
            }
            EventKind::Scalar => {
                self.bump_nodes()?;
                let len = ev.value.as_ref().map_or(0, String::len);
                self.report.total_scalar_bytes = self.report.total_scalar_bytes.saturating_add(len);
                if self.report.total_scalar_bytes > self.budget.max_total_scalar_bytes {
                    return Err(BudgetBreach::ScalarBytes {
                        total_scalar_bytes: self.report.total_scalar_bytes,
                    });
                }
                self.record_anchor(ev)?;
            }
            EventKind::SequenceStart | EventKind::MappingStart => {
                self.bump_nodes()?;
                self.depth += 1;
                self.report.max_depth = self.report.max_depth.max(self.depth);
                if self.depth > self.budget.max_depth {
                    return Err(BudgetBreach::Depth { depth: self.depth });
                }
                self.record_anchor(ev)?;
            }
            EventKind::SequenceEnd | EventKind::MappingEnd => {
                self.depth = self.depth.saturating_sub(1);
            }
            EventKind::StreamStart
            | EventKind::StreamEnd
            | EventKind::DocumentStart
            | EventKind::DocumentEnd => {}
        }
        Ok(())
    }

    fn bump_nodes(&mut self) -> Result<(), BudgetBreach> {
        self.report.nodes += 1;
        if self.report.nodes > self.budget.max_nodes {
            return Err(BudgetBreach::Nodes {
                nodes: self.report.nodes,
            });
        }
        Ok(())
    }

    fn record_anchor(&mut self, ev: &Event) -> Result<(), BudgetBreach> {
        if let Some(name) = ev.anchor_name() {
            if self.defined_anchors.insert(name.to_string()) {
                self.report.anchors = self.defined_anchors.len();
                if self.report.anchors > self.budget.max_anchors {
                    return Err(BudgetBreach::Anchors {
                        anchors: self.report.anchors,
                    });
                }
            }
        }
        Ok(())
    }
}
