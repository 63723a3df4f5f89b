use super::open_session;
use crate::cli::ConvertArgs;
use crate::error::{CliError, Result};
use tracing::info;
use zeoforge::engine::config::SessionConfig;

pub fn run(args: ConvertArgs, config: SessionConfig) -> Result<()> {
    let mut session = open_session(&args.input, config)?;

    if args.only.is_empty() {
        session.file_save(Some(&args.output))?;
    } else {
        let mut nodes = Vec::with_capacity(args.only.len());
        for path in &args.only {
            let id = session.model().resolve_path(path).ok_or_else(|| {
                CliError::Argument(format!("No node at path '{}' in {:?}", path, args.input))
            })?;
            nodes.push(id);
        }
        session.file_save_nodes(&args.output, &nodes)?;
    }

    info!("Wrote {:?}", args.output);
    println!("Converted {} -> {}", args.input.display(), args.output.display());
    Ok(())
}
