//! Project scan: collect component records from every source file.

use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::call::CallMatcher;
use super::file::is_skipped_dir;
use super::site::{self, MatchType, Site};
use crate::debug;

/// Directories walked by a scan, relative to the project root.
pub const SCAN_DIRS: &[&str] = &["src/components", "components", "src", "app", "app/components"];

/// One component and the elements found for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub component_name: String,
    pub description: String,
    pub elements: Vec<ElementRecord>,
}

/// One element found by a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub id: String,
    pub name: String,
    pub relative_size_value: i32,
    /// `file:line`, advisory only.
    pub path: String,
    pub match_type: MatchType,
    pub current_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_comment: Option<String>,
}

/// Output of [`scan_project`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub components: Vec<ComponentRecord>,
    pub files_scanned: usize,
}

impl ScanReport {
    pub fn element_count(&self) -> usize {
        self.components.iter().map(|c| c.elements.len()).sum()
    }
}

/// Scan `root` for components, visiting every file once.
pub fn scan_project(root: &Path, extensions: &[String], matcher: &CallMatcher) -> ScanReport {
    let mut files = Vec::new();
    let mut seen = FxHashSet::default();

    for dir in SCAN_DIRS {
        let dir = root.join(dir);
        if dir.is_dir() {
            debug!("scan"; "walking {}", dir.display());
            collect_files(&dir, extensions, &mut seen, &mut files);
        }
    }

    let mut builder = RecordBuilder::default();
    for path in &files {
        let Ok(content) = std::fs::read_to_string(path) else {
            debug!("scan"; "unreadable: {}", path.display());
            continue;
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let analysis = site::analyze(&content, &site::file_component(&file_name), matcher);
        for site in &analysis.sites {
            builder.push(&file_name, site);
        }
    }

    ScanReport {
        components: builder.finish(),
        files_scanned: files.len(),
    }
}

fn collect_files(
    dir: &Path,
    extensions: &[String],
    seen: &mut FxHashSet<PathBuf>,
    files: &mut Vec<PathBuf>,
) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    let mut entries: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_skipped_dir);
            if !skipped {
                collect_files(&path, extensions, seen, files);
            }
        } else if has_extension(&path, extensions) {
            let key = path.canonicalize().unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                files.push(path);
            }
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.trim_start_matches('.') == ext))
}

/// Groups sites by component, first element name wins.
#[derive(Default)]
struct RecordBuilder {
    components: Vec<ComponentRecord>,
    index: FxHashMap<String, usize>,
}

impl RecordBuilder {
    fn push(&mut self, file_name: &str, site: &Site) {
        let slot = *self.index.entry(site.component.clone()).or_insert_with(|| {
            self.components.push(ComponentRecord {
                component_name: site.component.clone(),
                description: format!("{} component", site.component),
                elements: Vec::new(),
            });
            self.components.len() - 1
        });

        let component = &mut self.components[slot];
        if component.elements.iter().any(|e| e.name == site.element) {
            return;
        }

        let id = format!(
            "{}-{}",
            element_id_prefix(&component.component_name),
            component.elements.len() + 1
        );
        component.elements.push(ElementRecord {
            id,
            name: site.element.clone(),
            relative_size_value: site.relative_size,
            path: format!("{file_name}:{}", site.line),
            match_type: site.match_type,
            current_value: site.current_value(),
            next_line: site.next_line.clone(),
            previous_comment: site.previous_comment.clone(),
        });
    }

    fn finish(self) -> Vec<ComponentRecord> {
        self.components
            .into_iter()
            .filter(|c| !c.elements.is_empty())
            .collect()
    }
}

/// `Hexagram Card` → `hexagram-card`
fn element_id_prefix(component: &str) -> String {
    component
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::call::DEFAULT_FIELD_NAMES;
    use std::fs;
    use tempfile::TempDir;

    fn extensions() -> Vec<String> {
        ["js", "jsx", "ts", "tsx"].iter().map(|s| s.to_string()).collect()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scan(root: &Path) -> ScanReport {
        scan_project(root, &extensions(), &CallMatcher::new(DEFAULT_FIELD_NAMES))
    }

    #[test]
    fn test_scan_groups_by_component() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/components/Card.tsx",
            "{/* @font-tool: Card - Title - fontSize+1 */}\n<h2>t</h2>\n{/* @font-tool: Card - Body - fontSize-1 */}\n",
        );
        write(
            dir.path(),
            "src/components/Nav.jsx",
            "// @font-tool组件: Navigation\n{/* @font-tool: Link */}\n",
        );

        let report = scan(dir.path());
        // src/components is also under src: each file counted once
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.components.len(), 2);

        let card = &report.components[0];
        assert_eq!(card.component_name, "Card");
        assert_eq!(card.description, "Card component");
        assert_eq!(card.elements[0].id, "card-1");
        assert_eq!(card.elements[0].path, "Card.tsx:1");
        assert_eq!(card.elements[0].relative_size_value, 1);
        assert_eq!(card.elements[0].current_value, "fontSize+1");
        assert_eq!(card.elements[1].id, "card-2");
        assert_eq!(card.elements[1].next_line, None);

        let nav = &report.components[1];
        assert_eq!(nav.component_name, "Navigation");
        assert_eq!(nav.elements[0].name, "Link");
        assert_eq!(report.element_count(), 3);
    }

    #[test]
    fn test_duplicate_element_first_wins() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "components/A.tsx",
            "// @font-tool: Card - Title - fontSize+1\n",
        );
        write(
            dir.path(),
            "components/B.tsx",
            "// @font-tool: Card - Title - fontSize+5\n",
        );
        let report = scan(dir.path());
        assert_eq!(report.components.len(), 1);
        assert_eq!(report.components[0].elements.len(), 1);
        assert_eq!(report.components[0].elements[0].path, "A.tsx:1");
    }

    #[test]
    fn test_skips_dependency_dirs_and_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/node_modules/x/X.tsx", "// @font-tool: X - Y - fontSize+1\n");
        write(dir.path(), "src/notes.md", "// @font-tool: X - Y - fontSize+1\n");
        let report = scan(dir.path());
        assert!(report.components.is_empty());
        assert_eq!(report.files_scanned, 0);
    }

    #[test]
    fn test_code_sites_are_recorded() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app/Hero.tsx",
            "export function Hero() {\n  return <h1 className={getTextScaleClass(fontSize+3)}>x</h1>;\n}\n",
        );
        let report = scan(dir.path());
        let element = &report.components[0].elements[0];
        assert_eq!(report.components[0].component_name, "Hero");
        assert_eq!(element.match_type, MatchType::Code);
        assert_eq!(element.relative_size_value, 3);
        assert_eq!(element.path, "Hero.tsx:2");
    }

    #[test]
    fn test_element_id_prefix() {
        assert_eq!(element_id_prefix("Hexagram Card"), "hexagram-card");
    }

    #[test]
    fn test_serializes_camel_case() {
        let record = ElementRecord {
            id: "card-1".into(),
            name: "Title".into(),
            relative_size_value: 2,
            path: "Card.tsx:4".into(),
            match_type: MatchType::Comment,
            current_value: "fontSize+2".into(),
            next_line: None,
            previous_comment: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["relativeSizeValue"], 2);
        assert_eq!(json["matchType"], "comment");
        assert!(json.get("nextLine").is_none());
    }
}
