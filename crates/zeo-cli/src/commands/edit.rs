use super::open_session;
use crate::cli::EditArgs;
use crate::error::{CliError, Result};
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::Path;
use std::rc::Rc;
use tracing::{info, warn};
use zeoforge::core::models::value::{PropertyValue, ValueKind};
use zeoforge::engine::action::Step;
use zeoforge::engine::config::SessionConfig;
use zeoforge::engine::session::EditSession;
use zeoforge::workflows::edit::{EditProperty, HistoryCommand, MoveInto, Translate};

/// A TOML edit script: a list of `[[step]]` tables tagged by `op`.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct EditScript {
    #[serde(rename = "step", default)]
    pub steps: Vec<ScriptStep>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "op")]
pub enum ScriptStep {
    /// Replace the selection with the nodes at these paths.
    Select { paths: Vec<String> },
    /// Run a registered action by name.
    Run { action: String },
    Translate { vector: [f64; 3] },
    /// Set a property on every selected node.
    Set { property: String, value: toml::Value },
    MoveInto { target: String },
    Undo,
    Redo,
    Repeat,
}

impl ScriptStep {
    fn op(&self) -> &'static str {
        match self {
            ScriptStep::Select { .. } => "select",
            ScriptStep::Run { .. } => "run",
            ScriptStep::Translate { .. } => "translate",
            ScriptStep::Set { .. } => "set",
            ScriptStep::MoveInto { .. } => "move-into",
            ScriptStep::Undo => "undo",
            ScriptStep::Redo => "redo",
            ScriptStep::Repeat => "repeat",
        }
    }
}

impl EditScript {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

/// Converts a script value to the declared kind of the property.
fn convert_value(kind: ValueKind, value: &toml::Value) -> std::result::Result<PropertyValue, String> {
    let numbers = |value: &toml::Value| -> Option<Vec<f64>> {
        value
            .as_array()?
            .iter()
            .map(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
            .collect()
    };
    let converted = match kind {
        ValueKind::Bool => value.as_bool().map(PropertyValue::Bool),
        ValueKind::Int => value.as_integer().map(PropertyValue::Int),
        ValueKind::Float => value
            .as_float()
            .or_else(|| value.as_integer().map(|i| i as f64))
            .map(PropertyValue::Float),
        ValueKind::Text => value.as_str().map(|s| PropertyValue::Text(s.to_string())),
        ValueKind::Vector => numbers(value).and_then(|n| match n.as_slice() {
            [x, y, z] => Some(PropertyValue::Vector(Vector3::new(*x, *y, *z))),
            _ => None,
        }),
        ValueKind::Color => numbers(value).and_then(|n| match n.as_slice() {
            [r, g, b] => Some(PropertyValue::Color([*r, *g, *b, 1.0])),
            [r, g, b, a] => Some(PropertyValue::Color([*r, *g, *b, *a])),
            _ => None,
        }),
        _ => return Err(format!("properties of kind '{}' cannot be set from a script", kind)),
    };
    converted.ok_or_else(|| format!("value {} does not fit a {} property", value, kind))
}

fn declared_kind(session: &EditSession, property: &str) -> std::result::Result<ValueKind, String> {
    let model = session.model();
    let first = model
        .selection()
        .first()
        .ok_or_else(|| "nothing is selected".to_string())?;
    let node = model.tree().get(*first).map_err(|e| e.to_string())?;
    node.kind()
        .property(property)
        .map(|(_, p)| p.kind())
        .ok_or_else(|| format!("'{}' has no property '{}'", node.kind().name(), property))
}

fn apply_step(session: &mut EditSession, step: &ScriptStep) -> std::result::Result<Step, String> {
    let outcome = match step {
        ScriptStep::Select { paths } => {
            session.select_paths(paths).map_err(|e| e.to_string())?;
            return Ok(Step::Done(format!("{} selected", paths.len())));
        }
        ScriptStep::Run { action } => session.execute(action),
        ScriptStep::Translate { vector } => session.execute_action(Rc::new(Translate::new(
            Vector3::new(vector[0], vector[1], vector[2]),
        ))),
        ScriptStep::Set { property, value } => {
            let kind = declared_kind(session, property)?;
            let value = convert_value(kind, value)?;
            session.execute_action(Rc::new(EditProperty::new(property.clone(), value)))
        }
        ScriptStep::MoveInto { target } => {
            let id = session
                .model()
                .resolve_path(target)
                .ok_or_else(|| format!("no node at '{}'", target))?;
            session.execute_action(Rc::new(MoveInto::new(id)))
        }
        ScriptStep::Undo => HistoryCommand::Undo.run(session),
        ScriptStep::Redo => HistoryCommand::Redo.run(session),
        ScriptStep::Repeat => HistoryCommand::Repeat.run(session),
    };
    outcome.map_err(|e| e.to_string())
}

/// Replays `script` on the session. Steps that do not apply are skipped with
/// a warning unless `strict` is set. Returns the number of applied steps.
pub fn replay(session: &mut EditSession, script: &EditScript, strict: bool) -> Result<usize> {
    let mut applied = 0;
    for (i, step) in script.steps.iter().enumerate() {
        let number = i + 1;
        let fail = |message: String| CliError::Script {
            step: number,
            op: step.op().to_string(),
            message,
        };
        match apply_step(session, step).map_err(fail)? {
            Step::Done(description) => {
                info!(step = number, "{}", description);
                applied += 1;
            }
            Step::Unavailable if strict => {
                return Err(fail("not applicable to the current selection".to_string()));
            }
            Step::Unavailable => {
                warn!(step = number, op = step.op(), "Step skipped: nothing to do");
            }
        }
    }
    Ok(applied)
}

pub fn run(args: EditArgs, config: SessionConfig) -> Result<()> {
    let script = EditScript::from_file(&args.script)?;
    let mut session = open_session(&args.input, config)?;

    let applied = replay(&mut session, &script, args.strict)?;
    println!("Applied {} of {} step(s).", applied, script.steps.len());

    if session.has_unsaved_changes() || args.output.is_some() {
        session.file_save(args.output.as_deref())?;
        let target = args.output.as_deref().unwrap_or(&args.input);
        println!("Saved {}", target.display());
    } else {
        println!("No changes to save.");
    }
    Ok(())
}
