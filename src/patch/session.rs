//! Batch session: file lookups and contents cached across elements.
//!
//! Elements are processed in request order. A later element in the same file
//! sees the edits of earlier ones through the content cache.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::error::PatchError;
use super::request::ElementConfig;
use super::rewrite;
use crate::debug;
use crate::locate::{CallMatcher, Site, analyze, find_file, site::file_component};
use crate::utils::path::PathHint;

/// Result of patching one element that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOutcome {
    Applied(AppliedElement),
    /// Target identified, text already encodes the requested size.
    AlreadyCurrent { file: PathBuf },
}

/// An element whose file was rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedElement {
    pub component_name: String,
    pub element_name: String,
    pub relative_size_value: i32,
    pub file: PathBuf,
    /// `file:line` of the first rewritten site.
    pub path: String,
    pub selector: Option<String>,
    pub match_pattern: Option<String>,
    pub line_content: Option<String>,
    /// Number of text replacements.
    pub changes: usize,
}

pub struct PatchSession<'a> {
    root: &'a Path,
    matcher: &'a CallMatcher,
    extensions: &'a [String],
    paths: FxHashMap<String, PathBuf>,
    contents: FxHashMap<PathBuf, String>,
}

impl<'a> PatchSession<'a> {
    pub fn new(root: &'a Path, matcher: &'a CallMatcher, extensions: &'a [String]) -> Self {
        Self {
            root,
            matcher,
            extensions,
            paths: FxHashMap::default(),
            contents: FxHashMap::default(),
        }
    }

    /// Patch one element to its requested size.
    pub fn patch(
        &mut self,
        component: &str,
        element: &ElementConfig,
    ) -> Result<PatchOutcome, PatchError> {
        let hint = PathHint::parse(&element.path);
        let file = self.resolve(component, &hint.file_name)?;
        let content = self.read(&file)?.to_string();
        let target = element.relative_size_value;

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let analysis = analyze(&content, &file_component(&file_name), self.matcher);

        let mut sites = analysis.find(component, &element.name);
        if sites.is_empty() && !hint.lines.is_empty() {
            sites = analysis.at_lines(&hint.lines);
            if !sites.is_empty() {
                debug!("apply"; "{} - {}: matched by line hint {:?}", component, element.name, hint.lines);
            }
        }
        if sites.is_empty() {
            return Err(PatchError::NoTargetIdentified {
                component: component.to_string(),
                element: element.name.clone(),
                path: file,
            });
        }

        if rewrite::has_data_attribute(&content, target) {
            debug!("apply"; "{}: data-font-tool=\"{:+}\" already present", file_name, target);
        }

        let edits = rewrite::plan(&sites, target);
        if edits.is_empty() {
            debug!("apply"; "{} - {}: already {:+}", component, element.name, target);
            return Ok(PatchOutcome::AlreadyCurrent { file });
        }

        let first = sites[0];
        let updated = rewrite::apply(&content, &edits);
        std::fs::write(&file, &updated).map_err(|e| PatchError::Io(file.clone(), e))?;
        debug!("apply"; "{}: {} replacement(s) for {} - {}", file.display(), edits.len(), component, element.name);

        let applied = AppliedElement {
            component_name: component.to_string(),
            element_name: element.name.clone(),
            relative_size_value: target,
            path: format!("{file_name}:{}", first.line),
            selector: first.selector(),
            match_pattern: first.match_pattern(target),
            line_content: line_after_edit(&updated, first),
            changes: edits.len(),
            file: file.clone(),
        };
        self.contents.insert(file, updated);

        Ok(PatchOutcome::Applied(applied))
    }

    fn resolve(&mut self, component: &str, file_name: &str) -> Result<PathBuf, PatchError> {
        let key = if file_name.is_empty() {
            component.to_string()
        } else {
            file_name.to_string()
        };
        // names are looked up by file name under the root, never as paths
        if !is_plain_name(&key) {
            return Err(PatchError::NotFound(key));
        }
        if let Some(path) = self.paths.get(&key) {
            return Ok(path.clone());
        }

        let found = if file_name.is_empty() {
            self.extensions
                .iter()
                .find_map(|ext| find_file(self.root, &format!("{component}.{}", ext.trim_start_matches('.'))))
        } else {
            find_file(self.root, file_name)
        };

        let path = found.ok_or_else(|| PatchError::NotFound(key.clone()))?;
        debug!("apply"; "resolved {} -> {}", key, path.display());
        self.paths.insert(key, path.clone());
        Ok(path)
    }

    fn read(&mut self, path: &Path) -> Result<&str, PatchError> {
        if !self.contents.contains_key(path) {
            let content =
                std::fs::read_to_string(path).map_err(|e| PatchError::Io(path.to_path_buf(), e))?;
            self.contents.insert(path.to_path_buf(), content);
        }
        Ok(self.contents.get(path).map(String::as_str).unwrap_or_default())
    }
}

/// A single file name component: no separators, not `.` or `..`.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Trimmed text of the site's first call line after rewriting.
fn line_after_edit(content: &str, site: &Site) -> Option<String> {
    let line = site.calls.first().map_or(site.line, |call| call.line);
    content
        .lines()
        .nth(line.checked_sub(1)?)
        .map(|text| text.trim().to_string())
}
