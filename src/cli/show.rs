//! `font-tool show`

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::ToolConfig;
use crate::locate::ShowReport;
use crate::workspace::Workspace;

pub fn run_show(config: &ToolConfig, file: &str, lines: &[usize]) -> Result<()> {
    let report = Workspace::from_config(config).show(file, lines)?;
    print!("{}", render(&report));
    Ok(())
}

/// Plain listing: one block per context, `>` on target lines, `*` on markers.
fn render(report: &ShowReport) -> String {
    let mut out = format!("{}\n", report.file.display().bold());
    let width = report
        .contexts
        .iter()
        .map(|c| c.end_line.to_string().len())
        .max()
        .unwrap_or(1);

    for context in &report.contexts {
        out.push_str(&format!("--- line {} ({}-{})\n", context.line, context.start_line, context.end_line));
        for line in &context.lines {
            let flag = match (line.target, line.marker) {
                (true, _) => '>',
                (false, true) => '*',
                _ => ' ',
            };
            out.push_str(&format!("{flag} {:>width$} | {}\n", line.number, line.text));
        }
        for marker in context.markers.iter().filter(|m| m.line < context.start_line || m.line > context.end_line) {
            out.push_str(&format!("* marker at line {} (outside window)\n", marker.line));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_render_flags_target_and_marker() {
        let dir = TempDir::new().unwrap();
        let content = "a\n// @font-tool: Title\nb\nc\n";
        fs::write(dir.path().join("Card.tsx"), content).unwrap();

        owo_colors::set_override(false);
        let report = crate::locate::show_context(dir.path(), "Card.tsx", &[3]).unwrap();
        let text = render(&report);

        assert!(text.contains("--- line 3 (1-4)"));
        assert!(text.contains("* 2 | // @font-tool: Title"));
        assert!(text.contains("> 3 | b"));
        assert!(text.contains("  1 | a"));
    }
}
