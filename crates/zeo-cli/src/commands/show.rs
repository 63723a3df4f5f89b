use super::open_session;
use crate::cli::ShowArgs;
use crate::error::Result;
use std::io::{self, Write};
use zeoforge::core::models::ids::NodeId;
use zeoforge::engine::config::SessionConfig;
use zeoforge::engine::model::Model;

pub fn run(args: ShowArgs, config: SessionConfig) -> Result<()> {
    let session = open_session(&args.input, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_tree(session.model(), args.properties, &mut out)?;
    Ok(())
}

/// Writes one line per node, `path  kind  label`, indented by depth.
pub fn render_tree(model: &Model, properties: bool, out: &mut dyn Write) -> io::Result<()> {
    for root in model.roots() {
        render_node(model, root, 0, properties, out)?;
    }
    Ok(())
}

fn render_node(
    model: &Model,
    id: NodeId,
    depth: usize,
    properties: bool,
    out: &mut dyn Write,
) -> io::Result<()> {
    let tree = model.tree();
    let Some(node) = tree.node(id) else {
        return Ok(());
    };
    let indent = "  ".repeat(depth);
    let path = model.path_of(id).unwrap_or_else(|| "?".to_string());
    writeln!(out, "{}{}  {}  {}", indent, path, node.kind().name(), node.label())?;
    if properties {
        for property in node.kind().properties() {
            if let Ok(value) = model.get_property(id, property.name()) {
                writeln!(out, "{}    {} = {}", indent, property.name(), value)?;
            }
        }
    }
    for &child in tree.children_of(id) {
        render_node(model, child, depth + 1, properties, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::write_water;
    use tempfile::tempdir;

    fn rendered(properties: bool) -> String {
        let dir = tempdir().unwrap();
        let input = write_water(dir.path());
        let session = open_session(&input, SessionConfig::default()).unwrap();
        let mut out = Vec::new();
        render_tree(session.model(), properties, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_roots_and_atoms_with_paths() {
        let text = rendered(false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("/universe  "));
        assert!(lines[0].ends_with("water"));
        assert!(lines[1].starts_with("  /universe/0  "));
        assert!(lines[1].ends_with("  O"));
        assert!(lines[4].starts_with("/folder  "));
    }

    #[test]
    fn property_listing_includes_atomic_numbers() {
        let text = rendered(true);
        assert!(text.contains("number = 8"));
        assert!(text.contains("number = 1"));
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        let result = open_session(&dir.path().join("none.xyz"), SessionConfig::default());
        assert!(result.is_err());
    }
}
