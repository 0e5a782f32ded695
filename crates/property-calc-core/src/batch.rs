use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::RealtyError;
use crate::flip::{self, FlipReport, FlipScenario};
use crate::input::as_record;
use crate::multi_unit::{self, MultiScenario, MultiUnitReport};
use crate::types::ComputationOutput;
use crate::RealtyResult;

/// Which analyzer a portfolio item is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Flip,
    Multi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchReport {
    Flip(ComputationOutput<FlipReport>),
    Multi(ComputationOutput<MultiUnitReport>),
}

/// One scenario's result. A failed item never aborts its neighbours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Ok { report: Box<BatchReport> },
    Error { error_kind: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Ok { .. })
    }
}

/// Evaluate loosely-typed scenario records in parallel.
///
/// Each item is an object with `kind` (`"flip"` or `"multi"`), an optional
/// `label`, and the scenario fields. Output order matches input order.
pub fn evaluate_portfolio(
    items: &[Value],
    config: &EngineConfig,
    as_of: NaiveDate,
) -> Vec<BatchEntry> {
    log::debug!("evaluating portfolio of {} scenarios", items.len());

    let entries: Vec<BatchEntry> = items
        .par_iter()
        .enumerate()
        .map(|(index, item)| {
            let label = item
                .get("label")
                .and_then(Value::as_str)
                .map(str::to_string);
            let outcome = match evaluate_one(item, config, as_of) {
                Ok(report) => BatchOutcome::Ok {
                    report: Box::new(report),
                },
                Err(e) => BatchOutcome::Error {
                    error_kind: e.kind().to_string(),
                    message: e.to_string(),
                },
            };
            BatchEntry {
                index,
                label,
                outcome,
            }
        })
        .collect();

    let failed = entries.iter().filter(|e| !e.is_ok()).count();
    log::debug!("portfolio done: {} ok, {failed} failed", entries.len() - failed);
    entries
}

fn evaluate_one(item: &Value, config: &EngineConfig, as_of: NaiveDate) -> RealtyResult<BatchReport> {
    let record = as_record(item, "portfolio item")?;
    let kind: ScenarioKind = match record.get("kind") {
        Some(k) => serde_json::from_value(k.clone())
            .map_err(|_| RealtyError::invalid("kind", "expected \"flip\" or \"multi\""))?,
        None => return Err(RealtyError::invalid("kind", "value is required")),
    };

    match kind {
        ScenarioKind::Flip => {
            let scenario = FlipScenario::from_value(item)?;
            flip::analyze_flip(&scenario, &config.flip).map(BatchReport::Flip)
        }
        ScenarioKind::Multi => {
            let scenario = MultiScenario::from_value(item)?;
            let table = config.transfer_tax_for(as_of)?;
            multi_unit::analyze_with_transfer_tax(&scenario, &config.multi_unit, table)
                .map(BatchReport::Multi)
        }
    }
}
