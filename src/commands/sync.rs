//! `specsync sync` command.

use std::path::Path;

use crate::adapter::github::GithubAdapter;
use crate::adapter::PushOptions;
use crate::config::{self, SyncConfig};
use crate::context::ServiceContext;
use crate::engine::SyncEngine;
use crate::scanner::Scanner;

/// Executes the `sync` command.
///
/// # Errors
///
/// Returns an error string if the configuration cannot be loaded, neither
/// a spec name nor `--all` was given, or the sync run reports failures.
pub fn run(
    ctx: &ServiceContext,
    config_path: &str,
    name: Option<&str>,
    all: bool,
    dry_run: bool,
    force: bool,
) -> Result<(), String> {
    let config = load_config(config_path)?;
    let adapter = GithubAdapter::new(
        ctx.tracker_cli.as_ref(),
        ctx.id_gen.as_ref(),
        config.github.owner.clone(),
        config.github.repo.clone(),
        config.github.labels.clone().into(),
    );
    let scanner = Scanner::new(ctx.fs.as_ref(), config.specs_root.as_str());
    let engine = SyncEngine::new(scanner, &adapter);
    let opts = PushOptions { force, dry_run };

    let result = match (all, name) {
        (true, _) => engine.sync_all(&opts, config.conflict_strategy).map_err(|e| e.to_string())?,
        (false, Some(n)) => {
            engine.sync_named(n, &opts, config.conflict_strategy).map_err(|e| e.to_string())?
        }
        (false, None) => return Err("specify a spec name or pass --all".to_string()),
    };

    println!("{}", result.message);
    if !result.success {
        return Err(result.errors.join("\n"));
    }
    Ok(())
}

fn load_config(path: &str) -> Result<SyncConfig, String> {
    config::load_from_path(Path::new(path)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_requires_name_or_all() {
        let dir = std::env::temp_dir().join("specsync_sync_cmd_test");
        std::fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("specsync.yml");
        std::fs::write(&config_path, "github:\n  owner: acme\n  repo: demo\n").unwrap();

        let ctx = ServiceContext::live("gh");
        let result = run(&ctx, config_path.to_str().unwrap(), None, false, false, false);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("spec name"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sync_errors_on_missing_config() {
        let ctx = ServiceContext::live("gh");
        let result = run(&ctx, "/nonexistent/specsync.yml", None, true, false, false);
        assert!(result.is_err());
    }
}
