//! External program execution for `NamedCommand` work units.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::domain::{Invocation, WorkerHost};
use crate::error::SpindleError;

/// Run `program` with the invocation's argv and wait for it.
///
/// - stdout: one string result value per line
/// - stderr: one error-stream message per line
/// - non-zero exit: `SpindleError::ExitStatus`
///
/// The child is killed when the future is dropped, so aborting the worker
/// task also stops the process.
pub async fn run_external(
    program: &str,
    invocation: &Invocation,
    host: &WorkerHost,
) -> Result<Vec<serde_json::Value>, SpindleError> {
    let argv = invocation.to_argv();

    let mut cmd = Command::new(program);
    cmd.args(&argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| SpindleError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let output = child
        .wait_with_output()
        .await
        .map_err(|source| SpindleError::Spawn {
            program: program.to_string(),
            source,
        })?;

    for line in String::from_utf8_lossy(&output.stderr).lines() {
        host.error(line);
    }

    if !output.status.success() {
        return Err(SpindleError::ExitStatus {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::Value::String(line.to_string()))
        .collect())
}

/// Find an executable named `name` in a colon-separated search path.
pub fn resolve_in_path(name: &str, path_var: &str) -> Option<String> {
    if name.contains('/') {
        return Path::new(name).is_file().then(|| name.to_string());
    }

    for dir in path_var.split(':') {
        if dir.is_empty() {
            continue;
        }

        let full_path = format!("{}/{}", dir, name);
        let path = Path::new(&full_path);

        if path.is_file() {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(metadata) = path.metadata()
                    && metadata.permissions().mode() & 0o111 != 0
                {
                    return Some(full_path);
                }
            }

            #[cfg(not(unix))]
            {
                return Some(full_path);
            }
        }
    }

    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::{Stream, StreamPreferences};
    use serde_json::json;

    #[tokio::test]
    async fn stdout_lines_become_values() {
        let host = WorkerHost::new(0, StreamPreferences::all_continue());
        let mut inv = Invocation::new("printf");
        inv.push_positional(json!("a\\nb\\n"));

        let values = run_external("printf", &inv, &host).await.unwrap();
        assert_eq!(values, vec![json!("a"), json!("b")]);
    }

    #[tokio::test]
    async fn stderr_goes_to_error_stream_and_exit_code_fails() {
        let host = WorkerHost::new(0, StreamPreferences::all_continue());
        let mut inv = Invocation::new("sh");
        inv.push_named("c", json!("echo oops >&2; exit 3"));

        let err = run_external("sh", &inv, &host).await.unwrap_err();
        assert!(matches!(err, SpindleError::ExitStatus { code: 3, .. }));
        assert_eq!(host.drain(), vec![(Stream::Error, "oops".to_string())]);
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let host = WorkerHost::new(0, StreamPreferences::all_continue());
        let inv = Invocation::new("no-such-program-xyz");
        let err = run_external("no-such-program-xyz", &inv, &host)
            .await
            .unwrap_err();
        assert!(matches!(err, SpindleError::Spawn { .. }));
    }

    #[test]
    fn resolve_in_path_skips_missing_dirs() {
        assert!(resolve_in_path("sh", "/nonexistent::/bin:/usr/bin").is_some());
        assert!(resolve_in_path("sh", "/nonexistent").is_none());
    }
}
