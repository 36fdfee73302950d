//! Shared output formatting for generated declarations.

use anyhow::Result;
use rulegen::{Declaration, RunReport, TargetLabel};
use std::fmt::Write as _;

use crate::OutputFormat;

const INDENT: &str = "    ";

/// Print a run report in the specified format.
pub fn print(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Compact => print!("{}", render_compact(report)),
    }
    Ok(())
}

/// Starlark rule blocks grouped by package.
///
/// Module dependencies are not attributes; they are listed in a comment
/// above the rule they belong to.
fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    for package in &report.packages {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "# //{}", package.rel);
        for (i, declaration) in package.result.declarations.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            render_declaration(&mut out, declaration);
        }
    }
    out
}

fn render_declaration(out: &mut String, d: &Declaration) {
    if !d.deps().is_empty() {
        let names: Vec<&str> = d.deps().iter().map(|m| m.name.as_str()).collect();
        let _ = writeln!(out, "# imports: {}", names.join(", "));
    }
    let _ = writeln!(out, "{}(", d.kind());
    let _ = writeln!(out, "{INDENT}name = \"{}\",", d.name());
    render_list(out, "srcs", d.srcs());
    if let Some(main) = d.main() {
        let _ = writeln!(out, "{INDENT}main = \"{main}\",");
    }
    render_list(out, "imports", d.imports());
    render_list(out, "visibility", d.visibility());
    if d.testonly() {
        let _ = writeln!(out, "{INDENT}testonly = True,");
    }
    render_list(out, "deps", d.resolved_deps());
    out.push_str(")\n");
}

fn render_list(out: &mut String, attr: &str, items: &[String]) {
    match items {
        [] => {}
        [single] => {
            let _ = writeln!(out, "{INDENT}{attr} = [\"{single}\"],");
        }
        _ => {
            let _ = writeln!(out, "{INDENT}{attr} = [");
            for item in items {
                let _ = writeln!(out, "{INDENT}{INDENT}\"{item}\",");
            }
            let _ = writeln!(out, "{INDENT}],");
        }
    }
}

/// One `//pkg:name kind n_srcs` line per declaration.
fn render_compact(report: &RunReport) -> String {
    let mut out = String::new();
    for package in &report.packages {
        for d in &package.result.declarations {
            let label = TargetLabel::new(package.rel.as_str(), d.name());
            let _ = writeln!(out, "{label} {} {}", d.kind(), d.srcs().len());
        }
    }
    out
}
