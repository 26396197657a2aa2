//! Scenario files
//!
//! A scenario is a YAML document that describes a whole run: engine
//! configuration, cell topology, UE attachments, measurement reports and the
//! executor's scripted behaviour.
//!
//! ```yaml
//! config:
//!   handover:
//!     load_threshold: 20
//!   time:
//!     total_ticks: 5000
//! cells: [1, 2, 3, 4, 5]
//! attachments:
//!   - { ue: 1, cell: 3, count: 14 }
//! reports:
//!   - { ue_id: 1, serving_quality: 18, timestamp_ms: 600, neighbours: { 5: 22 } }
//! report_series:
//!   - { ue: 1, cell_quality: 18, from_ms: 100, to_ms: 500, period_ms: 100 }
//! executor:
//!   delay_ms: 20
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use loadho_common::{CellId, ConfigValidationError, EngineConfig, Error, Quality, UeId, QUALITY_MAX};
use loadho_rrc::MeasurementReport;

use crate::engine::HandoverEngine;
use crate::executor::{ExecutorConfig, ScriptedExecutor};

/// Attaches `count` consecutive UEs starting at `ue` to `cell` at `at_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSpec {
    pub ue: UeId,
    pub cell: CellId,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub at_ms: u64,
}

fn default_count() -> u32 {
    1
}

impl AttachmentSpec {
    /// UEs covered by this entry.
    pub fn ues(&self) -> impl Iterator<Item = UeId> {
        let first = self.ue.value();
        (first..first.saturating_add(self.count)).map(UeId::new)
    }
}

/// Removes a UE from the network at `at_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachmentSpec {
    pub ue: UeId,
    pub at_ms: u64,
}

/// Identical reports from one UE every `period_ms` over `[from_ms, to_ms]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSeries {
    pub ue: UeId,
    pub cell_quality: Quality,
    #[serde(default)]
    pub neighbours: BTreeMap<CellId, Quality>,
    pub from_ms: u64,
    pub to_ms: u64,
    pub period_ms: u64,
}

impl ReportSeries {
    /// Expands the series into individual reports.
    pub fn reports(&self) -> Vec<MeasurementReport> {
        if self.period_ms == 0 {
            return Vec::new();
        }
        std::iter::successors(Some(self.from_ms), |t| t.checked_add(self.period_ms))
            .take_while(|&t| t <= self.to_ms)
            .map(|t| MeasurementReport {
                ue_id: self.ue,
                serving_quality: Some(self.cell_quality),
                neighbours: self.neighbours.clone(),
                timestamp_ms: t,
            })
            .collect()
    }
}

/// Complete run description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: EngineConfig,
    pub cells: Vec<CellId>,
    pub attachments: Vec<AttachmentSpec>,
    pub detachments: Vec<DetachmentSpec>,
    pub reports: Vec<MeasurementReport>,
    pub report_series: Vec<ReportSeries>,
    pub executor: ExecutorConfig,
}

impl Scenario {
    /// Parses and validates a scenario from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Loads and validates a scenario file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks the scenario for structural errors.
    ///
    /// Reports that reference unknown cells are left alone: the engine
    /// discards them at run time, which is part of what a scenario may test.
    pub fn validate(&self) -> Result<(), Error> {
        self.config.validate()?;

        if self.cells.is_empty() {
            return Err(Error::Scenario("no cells provisioned".to_string()));
        }
        let mut seen = BTreeSet::new();
        for &cell in &self.cells {
            if !cell.is_valid() {
                return Err(ConfigValidationError::ReservedCellId.into());
            }
            if !seen.insert(cell) {
                return Err(ConfigValidationError::DuplicateCell(cell).into());
            }
        }

        for spec in &self.attachments {
            if !seen.contains(&spec.cell) {
                return Err(Error::Scenario(format!(
                    "UE {} attaches to unprovisioned cell {}",
                    spec.ue, spec.cell
                )));
            }
            if spec.count == 0 {
                return Err(Error::Scenario(format!(
                    "attachment for UE {} has count 0",
                    spec.ue
                )));
            }
        }

        for series in &self.report_series {
            if series.period_ms == 0 {
                return Err(Error::Scenario(format!(
                    "report series for UE {} has period_ms 0",
                    series.ue
                )));
            }
        }

        let qualities = self
            .reports
            .iter()
            .flat_map(|r| r.serving_quality.into_iter().chain(r.neighbours.values().copied()))
            .chain(
                self.report_series
                    .iter()
                    .flat_map(|s| std::iter::once(s.cell_quality).chain(s.neighbours.values().copied())),
            );
        for quality in qualities {
            if quality > QUALITY_MAX {
                return Err(ConfigValidationError::QualityOutOfRange {
                    field: "report quality",
                    value: quality,
                    max: QUALITY_MAX,
                }
                .into());
            }
        }

        Ok(())
    }

    /// Number of distinct UEs the scenario attaches.
    pub fn ue_count(&self) -> usize {
        self.attachments
            .iter()
            .flat_map(AttachmentSpec::ues)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Every report of the scenario, explicit and expanded, in time order.
    ///
    /// The sort is stable, so reports sharing a timestamp keep file order.
    pub fn all_reports(&self) -> Vec<MeasurementReport> {
        let mut reports = self.reports.clone();
        for series in &self.report_series {
            reports.extend(series.reports());
        }
        reports.sort_by_key(|r| r.timestamp_ms);
        reports
    }

    /// Builds an engine with every attachment, detachment and report queued.
    pub fn build_engine(&self) -> Result<HandoverEngine<ScriptedExecutor>, Error> {
        let mut engine = HandoverEngine::new(
            self.config,
            &self.cells,
            ScriptedExecutor::new(&self.executor),
        )?;

        for spec in &self.attachments {
            for ue in spec.ues() {
                if spec.at_ms == 0 {
                    engine.attach(ue, spec.cell);
                } else {
                    engine.schedule_attach(spec.at_ms, ue, spec.cell);
                }
            }
        }
        for spec in &self.detachments {
            engine.schedule_detach(spec.at_ms, spec.ue);
        }

        let reports = self.all_reports();
        info!(
            "Scenario loaded: {} cell(s), {} UE(s), {} report(s)",
            self.cells.len(),
            self.ue_count(),
            reports.len()
        );
        for report in reports {
            engine.schedule_report(report);
        }

        Ok(engine)
    }
}
