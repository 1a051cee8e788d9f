use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Metadata recorded next to a result artifact.
pub struct Payload {
    pub command: &'static str,
    pub params: Value,
    pub inputs: Vec<PathBuf>,
}

impl Payload {
    pub fn new(command: &'static str, params: Value) -> Self {
        Self {
            command,
            params,
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.inputs.push(input.into());
        self
    }
}

/// Provenance block; `lefschetz report` prints it without outputs.
pub fn document(payload: &Payload, outputs: &[&Path]) -> Value {
    json!({
        "code_rev": current_git_rev(),
        "crate_version": lefschetz::VERSION,
        "command": payload.command,
        "params": payload.params,
        "inputs": payload.inputs.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>(),
        "outputs": outputs.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>(),
    })
}

/// Write `<artifact>.provenance.json` with git revision, call site, params, inputs and outputs.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let provenance_path = provenance_path(artifact);
    if let Some(parent) = provenance_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let mut doc = document(&payload, &[artifact]);
    doc["callsite"] = json!({
        "file": callsite.file(),
        "line": callsite.line()
    });
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    Ok(provenance_path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// Build-time `GIT_COMMIT`, then runtime `GIT_COMMIT`, then `git rev-parse HEAD`.
pub fn current_git_rev() -> String {
    let from_env = option_env!("GIT_COMMIT")
        .map(str::to_string)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|s| !s.is_empty());
    if let Some(rev) = from_env {
        return rev;
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn provenance_path_replaces_extension() {
        let derived = provenance_path(Path::new("/tmp/output/k3.json"));
        assert_eq!(derived, Path::new("/tmp/output/k3.provenance.json"));
    }

    #[test]
    fn sidecar_records_command_inputs_and_outputs() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("result.json");
        fs::write(&artifact, "{}").unwrap();
        let payload = Payload::new("homology", json!({"relaxed": false})).with_input("fib.json");
        let prov_path = write_sidecar(&artifact, payload).unwrap();
        assert!(prov_path.exists());
        let parsed: Value = serde_json::from_slice(&fs::read(prov_path).unwrap()).unwrap();
        assert_eq!(parsed["command"], "homology");
        assert_eq!(parsed["inputs"][0], "fib.json");
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert_eq!(parsed["crate_version"], lefschetz::VERSION);
        assert!(parsed["callsite"]["line"].as_u64().is_some());
    }
}
