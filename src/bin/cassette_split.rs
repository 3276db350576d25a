//! Splits a monolithic cassette YAML file into per-port cassette files.
//!
//! Usage: `cassette_split <input.yaml> <output_dir>`

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::{env, fs, process};

use chrono::Utc;
use specsync::cassette::format::{Cassette, Interaction};

/// A per-port cassette that links back to the original recording session.
#[derive(serde::Serialize)]
struct PerPortCassette {
    name: String,
    recorded_at: chrono::DateTime<Utc>,
    commit: String,
    source_session: String,
    interactions: Vec<Interaction>,
}

fn split_cassette(input: &str, output_dir: &str) -> Result<(), String> {
    let input_path = PathBuf::from(input);
    let output_path = PathBuf::from(output_dir);

    let content = fs::read_to_string(&input_path)
        .map_err(|e| format!("Failed to read {}: {e}", input_path.display()))?;
    let cassette: Cassette = serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {e}", input_path.display()))?;

    // Group interactions by port
    let mut by_port: BTreeMap<String, Vec<Interaction>> = BTreeMap::new();
    for interaction in &cassette.interactions {
        by_port.entry(interaction.port.clone()).or_default().push(interaction.clone());
    }

    // Write per-port cassette files (skip ports with zero interactions)
    for (port_name, interactions) in &by_port {
        if interactions.is_empty() {
            continue;
        }

        // Renumber sequences starting from 0
        let renumbered: Vec<Interaction> = interactions
            .iter()
            .enumerate()
            .map(|(i, orig)| Interaction {
                seq: i as u64,
                port: orig.port.clone(),
                method: orig.method.clone(),
                input: orig.input.clone(),
                output: orig.output.clone(),
            })
            .collect();

        let per_port = PerPortCassette {
            name: format!("{}-{}", cassette.name, port_name),
            recorded_at: cassette.recorded_at,
            commit: cassette.commit.clone(),
            source_session: cassette.name.clone(),
            interactions: renumbered,
        };

        let port_dir = output_path.join(port_name);
        fs::create_dir_all(&port_dir)
            .map_err(|e| format!("Failed to create {}: {e}", port_dir.display()))?;

        let file_path = port_dir.join(format!("{}.yaml", cassette.name));
        let yaml = serde_yaml::to_string(&per_port)
            .map_err(|e| format!("Failed to serialize cassette for port {port_name}: {e}"))?;
        fs::write(&file_path, yaml)
            .map_err(|e| format!("Failed to write {}: {e}", file_path.display()))?;

        println!("Wrote {}", file_path.display());
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: cassette_split <input.yaml> <output_dir>");
        process::exit(1);
    }

    if let Err(e) = split_cassette(&args[1], &args[2]) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
