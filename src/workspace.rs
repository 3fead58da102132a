//! Project-scoped entry points shared by the CLI and the control API.
//!
//! A [`Workspace`] is the resolved project root plus the locator settings.
//! Apply requests may override both (`projectDir`, `fieldNames`).

use std::path::{Path, PathBuf};

use crate::config::ToolConfig;
use crate::logger::status_detach;
use crate::locate::{CallMatcher, ContextError, ScanReport, ShowReport, scan_project, show_context};
use crate::patch::{ApplyRequest, BatchReport, apply_batch};
use crate::utils::path::resolve_root;
use crate::{debug, log};

#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub field_names: Vec<String>,
    pub extensions: Vec<String>,
}

impl Workspace {
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            root: config.root.clone(),
            field_names: config.field_names().to_vec(),
            extensions: config.extensions(),
        }
    }

    pub fn scan(&self) -> ScanReport {
        let matcher = CallMatcher::new(&self.field_names);
        let report = scan_project(&self.root, &self.extensions, &matcher);
        log!(
            "scan";
            "{} components, {} elements in {} files",
            report.components.len(),
            report.element_count(),
            report.files_scanned
        );
        report
    }

    /// Patch every element of `request`. Never broadcasts.
    pub fn apply(&self, request: &ApplyRequest) -> BatchReport {
        let root = self.request_root(request);
        let matcher = match &request.field_names {
            Some(names) if !names.is_empty() => CallMatcher::new(names),
            _ => CallMatcher::new(&self.field_names),
        };

        log!("apply"; "patching {} elements under {}", request.element_count(), root.display());
        status_detach();
        apply_batch(&root, request, &matcher, &self.extensions)
    }

    pub fn show(&self, file: &str, lines: &[usize]) -> Result<ShowReport, ContextError> {
        show_context(&self.root, file, lines)
    }

    fn request_root(&self, request: &ApplyRequest) -> PathBuf {
        match request.project_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => {
                let root = resolve_root(dir, &self.root);
                debug!("apply"; "project root overridden: {}", root.display());
                root
            }
            _ => self.root.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{ComponentConfig, ElementConfig};
    use std::fs;
    use tempfile::TempDir;

    fn workspace(root: &Path) -> Workspace {
        Workspace {
            root: root.to_path_buf(),
            field_names: vec!["getTextScaleClass".into(), "mapLevelToPx".into()],
            extensions: vec!["tsx".into()],
        }
    }

    fn request(project_dir: Option<String>, field_names: Option<Vec<String>>) -> ApplyRequest {
        ApplyRequest {
            project_dir,
            configs: vec![ComponentConfig {
                component_name: "Card".into(),
                elements: vec![ElementConfig {
                    name: "Title".into(),
                    relative_size_value: 2,
                    path: "Card.tsx:2".into(),
                }],
            }],
            field_names,
        }
    }

    const CARD: &str = "export function Card({ fontSize }) {\n  {/* @font-tool: Card - Title - fontSize+1 */}\n  return <h2 className={scale(fontSize+1)}>Hi</h2>;\n}\n";

    #[test]
    fn test_project_dir_overrides_root() {
        let configured = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        fs::create_dir_all(other.path().join("src/components")).unwrap();
        let file = other.path().join("src/components/Card.tsx");
        fs::write(&file, CARD).unwrap();

        let ws = workspace(configured.path());
        let dir = other.path().display().to_string();
        let report = ws.apply(&request(Some(dir), Some(vec!["scale".into()])));

        assert_eq!(report.applied.len(), 1, "{:?}", report.failures);
        let content = fs::read_to_string(&file).unwrap();
        assert!(content.contains("fontSize+2 */}"));
        assert!(content.contains("scale(fontSize+2)"));
    }

    #[test]
    fn test_relative_project_dir_resolves_against_root() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir.path().join("app"));
        let root = ws.request_root(&request(Some("../web/./src".into()), None));
        assert_eq!(root, dir.path().join("web/src"));
    }

    #[test]
    fn test_blank_project_dir_uses_root() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(dir.path());
        assert_eq!(ws.request_root(&request(Some("  ".into()), None)), dir.path());
        assert_eq!(ws.request_root(&request(None, None)), dir.path());
    }

    #[test]
    fn test_missing_file_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let report = workspace(dir.path()).apply(&request(None, None));
        assert!(report.applied.is_empty());
        assert_eq!(report.failures.len(), 1);
    }
}
