//! `specsync status` command.

use std::path::Path;

use crate::adapter::github::GithubAdapter;
use crate::adapter::Status;
use crate::config;
use crate::context::ServiceContext;
use crate::scanner::Scanner;

/// Executes the `status` command, printing one line per spec.
///
/// # Errors
///
/// Returns an error string if the configuration cannot be loaded, the
/// spec tree cannot be scanned, or `name` does not match any spec.
pub fn run(ctx: &ServiceContext, config_path: &str, name: Option<&str>) -> Result<(), String> {
    let config = config::load_from_path(Path::new(config_path)).map_err(|e| e.to_string())?;
    let adapter = GithubAdapter::new(
        ctx.tracker_cli.as_ref(),
        ctx.id_gen.as_ref(),
        config.github.owner.clone(),
        config.github.repo.clone(),
        config.github.labels.clone().into(),
    );
    let scanner = Scanner::new(ctx.fs.as_ref(), config.specs_root.as_str());
    let docs = scanner.scan_all().map_err(|e| e.to_string())?;

    let selected: Vec<_> = match name {
        Some(n) => {
            let doc = docs
                .into_iter()
                .find(|d| d.name == n)
                .ok_or_else(|| format!("no spec found matching {n:?}"))?;
            vec![doc]
        }
        None => docs,
    };

    if selected.is_empty() {
        println!("No specs found under {}.", config.specs_root);
        return Ok(());
    }

    for doc in &selected {
        match adapter.get_status(doc) {
            Ok(status) => println!("{}: {}", doc.name, describe(status.status)),
            Err(err) => println!("{}: error ({err})", doc.name),
        }
    }
    Ok(())
}

fn describe(status: Status) -> &'static str {
    match status {
        Status::Local => "local",
        Status::Draft => "draft",
        Status::Conflict => "conflict",
        Status::Synced => "synced",
        Status::Unknown => "unknown",
    }
}
