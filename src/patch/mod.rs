//! Patch engine.
//!
//! Rewrites the marker comment and size calls of each requested element,
//! re-deriving every site from current file content. Failures are collected
//! per element and never stop the batch.
//!
//! ```text
//! ApplyRequest ─► PatchSession ─┬─► Applied        ─► BatchReport ─► UpdateMessage
//!                               ├─► AlreadyCurrent
//!                               └─► PatchError
//! ```

mod error;
mod request;
mod rewrite;
mod session;

use std::path::Path;

use serde::Serialize;

pub use error::{FailureKind, PatchError};
pub use request::{ApplyRequest, ComponentConfig, ElementConfig};
pub use session::{AppliedElement, PatchOutcome, PatchSession};

use crate::debug;
use crate::logger::{status_error, status_success, status_warning};
use crate::locate::CallMatcher;

/// Element identified but left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedElement {
    pub component_name: String,
    pub element_name: String,
    pub file: String,
}

/// Element that could not be patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub component_name: String,
    pub element_name: String,
    pub path: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one apply batch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub applied: Vec<AppliedReport>,
    pub skipped: Vec<SkippedElement>,
    pub failures: Vec<Failure>,
    /// Rewritten files, in first-write order.
    pub updated_files: Vec<String>,
    #[serde(skip)]
    pub elements: Vec<AppliedElement>,
}

/// Serialized view of an applied element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedReport {
    pub component_name: String,
    pub element_name: String,
    pub relative_size_value: i32,
    pub path: String,
    pub changes: usize,
}

impl BatchReport {
    /// `applied N, skipped M, failed K`
    pub fn summary(&self) -> String {
        format!(
            "applied {}, skipped {}, failed {}",
            self.applied.len(),
            self.skipped.len(),
            self.failures.len()
        )
    }

    /// One line per failure.
    pub fn failure_detail(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{} - {}: {}", f.component_name, f.element_name, f.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Show the summary in the status block, with failures as detail.
    pub fn display_status(&self) {
        if self.is_clean() {
            status_success(&self.summary());
        } else if self.applied.is_empty() {
            status_error(&self.summary(), &self.failure_detail());
        } else {
            status_warning(&format!("{}\n{}", self.summary(), self.failure_detail()));
        }
    }

    fn record(&mut self, component: &str, element: &ElementConfig, result: Result<PatchOutcome, PatchError>) {
        match result {
            Ok(PatchOutcome::Applied(applied)) => {
                let file = applied.file.display().to_string();
                if !self.updated_files.contains(&file) {
                    self.updated_files.push(file);
                }
                self.applied.push(AppliedReport {
                    component_name: applied.component_name.clone(),
                    element_name: applied.element_name.clone(),
                    relative_size_value: applied.relative_size_value,
                    path: applied.path.clone(),
                    changes: applied.changes,
                });
                self.elements.push(applied);
            }
            Ok(PatchOutcome::AlreadyCurrent { file }) => self.skipped.push(SkippedElement {
                component_name: component.to_string(),
                element_name: element.name.clone(),
                file: file.display().to_string(),
            }),
            Err(err) => {
                debug!("apply"; "{} - {} failed: {}", component, element.name, err.detail());
                self.failures.push(Failure {
                    component_name: component.to_string(),
                    element_name: element.name.clone(),
                    path: element.path.clone(),
                    kind: err.kind(),
                    message: err.detail(),
                });
            }
        }
    }
}

/// Apply every element of `request` under `root`, in request order.
pub fn apply_batch(
    root: &Path,
    request: &ApplyRequest,
    matcher: &CallMatcher,
    extensions: &[String],
) -> BatchReport {
    let mut session = PatchSession::new(root, matcher, extensions);
    let mut report = BatchReport::default();

    for config in &request.configs {
        for element in &config.elements {
            let result = session.patch(&config.component_name, element);
            report.record(&config.component_name, element, result);
        }
    }

    report
}
