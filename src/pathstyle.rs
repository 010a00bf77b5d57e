// Path style detection and translation for POSIX-emulation interpreters
//
// An MSYS2/Cygwin Python on a Windows host rejects drive-letter paths on
// its command line; every path handed to such an interpreter must be in
// the /c/... form. Classification shells out to the interpreter itself,
// is keyed by the canonical binary path, and is memoized with
// single-flight semantics so overlapping resolution requests share one
// probe subprocess.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use futures::future::{FutureExt, Shared};
use tracing::debug;

use crate::error::{DetectionError, PathError, ProcessError, PyliftError, Result};
use crate::process::{ProcessConfig, ProcessRunner};

/// Inline program run by the probe. Asks the interpreter for its own build
/// platform and prints exactly one sentinel token.
const PROBE_SCRIPT: &str =
    "import sys; print('MSYS2' if sys.platform.startswith(('msys', 'cygwin')) else 'NATIVE')";

const SENTINEL_EMULATION: &str = "MSYS2";
const SENTINEL_NATIVE: &str = "NATIVE";

/// Probes hang when an interpreter is broken; bound them.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

type ProbeResult = std::result::Result<bool, DetectionError>;
type ProbeFuture = Shared<Pin<Box<dyn Future<Output = ProbeResult> + Send>>>;

/// Classifies interpreter binaries as native or POSIX-emulation builds.
///
/// One instance owns one cache; inject it instead of reaching for process
/// globals so tests can isolate their probes.
pub struct PathStyleDetector {
    probes: Mutex<HashMap<PathBuf, ProbeFuture>>,
    probe_timeout: Duration,
}

impl Default for PathStyleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PathStyleDetector {
    pub fn new() -> Self {
        Self::with_probe_timeout(PROBE_TIMEOUT)
    }

    pub fn with_probe_timeout(probe_timeout: Duration) -> Self {
        Self {
            probes: Mutex::new(HashMap::new()),
            probe_timeout,
        }
    }

    /// Returns true if `interpreter` is a POSIX-emulation build.
    ///
    /// The path may be relative; the canonicalized form is the cache key,
    /// so symlinked and relative references to one binary share a single
    /// classification. Concurrent callers for the same key join the
    /// in-flight probe and observe its outcome, success or failure. A
    /// failed probe is evicted so a later call can retry.
    pub async fn is_posix_emulation(&self, interpreter: &Path) -> Result<bool> {
        let key = interpreter
            .canonicalize()
            .map_err(|e| DetectionError::Resolve {
                interpreter: interpreter.to_path_buf(),
                error: e.to_string(),
            })?;

        let probe = {
            let mut probes = self.probes.lock().unwrap();
            match probes.get(&key) {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let fresh: ProbeFuture =
                        run_probe(key.clone(), self.probe_timeout).boxed().shared();
                    probes.insert(key.clone(), fresh.clone());
                    fresh
                }
            }
        };

        match probe.clone().await {
            Ok(emulation) => Ok(emulation),
            Err(cause) => {
                // Evict so the next call re-probes, but never clobber a
                // fresh probe a retrying caller has already inserted.
                let mut probes = self.probes.lock().unwrap();
                if probes
                    .get(&key)
                    .is_some_and(|current| Shared::ptr_eq(current, &probe))
                {
                    probes.remove(&key);
                }
                Err(cause.into())
            }
        }
    }
}

async fn run_probe(interpreter: PathBuf, probe_timeout: Duration) -> ProbeResult {
    debug!(interpreter = %interpreter.display(), "Probing interpreter path style");

    let config = ProcessConfig::new(&interpreter)
        .with_args(vec!["-c", PROBE_SCRIPT])
        .with_timeout(probe_timeout);

    let output = ProcessRunner::new().run(config).await.map_err(|e| match e {
        PyliftError::Process(process_err) => match *process_err {
            ProcessError::Timeout { duration, .. } => DetectionError::Timeout {
                interpreter: interpreter.clone(),
                duration,
            },
            other => DetectionError::ProbeFailed {
                interpreter: interpreter.clone(),
                error: other.to_string(),
            },
        },
        other => DetectionError::ProbeFailed {
            interpreter: interpreter.clone(),
            error: other.to_string(),
        },
    })?;

    match output.stdout.trim() {
        SENTINEL_EMULATION => Ok(true),
        SENTINEL_NATIVE => Ok(false),
        other => Err(DetectionError::UnexpectedOutput {
            interpreter,
            output: other.to_string(),
        }),
    }
}

/// Converts a path into the canonical POSIX-emulation form
/// `/{lowercased-drive}/{rest}` with forward slashes throughout.
///
/// Accepts paths already in emulation form (idempotent), native
/// drive-letter paths in either slash style, and relative paths (anchored
/// to the current directory first). Anything else, UNC paths included, is
/// an error rather than a silent pass-through.
pub fn translate_to_emulation(path: &str) -> Result<String> {
    if let Some(translated) = emulation_form(path) {
        return Ok(translated);
    }
    if let Some(translated) = drive_form(path) {
        return Ok(translated);
    }

    // Possibly relative: anchor to the current directory, then the
    // drive-letter rule gets one more attempt against the absolute form.
    if let Ok(absolute) = std::path::absolute(Path::new(path)) {
        if let Some(translated) = drive_form(&absolute.to_string_lossy()) {
            return Ok(translated);
        }
    }

    Err(PathError::UnrecognizedForm {
        path: path.to_string(),
    }
    .into())
}

/// Rule 1: already `/{letter}/{rest}` (or bare `/{letter}`).
fn emulation_form(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let bytes = normalized.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'/' || !bytes[1].is_ascii_alphabetic() {
        return None;
    }
    let drive = bytes[1].to_ascii_lowercase() as char;
    match bytes.get(2) {
        None => Some(format!("/{drive}")),
        Some(b'/') => Some(join_emulation(drive, &normalized[3..])),
        Some(_) => None,
    }
}

/// Rule 2: `{letter}:/{rest}` after backslash normalization (or bare `{letter}:`).
fn drive_form(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let bytes = normalized.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_alphabetic() || bytes[1] != b':' {
        return None;
    }
    let drive = bytes[0].to_ascii_lowercase() as char;
    match bytes.get(2) {
        None => Some(format!("/{drive}")),
        Some(b'/') => Some(join_emulation(drive, &normalized[3..])),
        Some(_) => None,
    }
}

/// Collapses duplicate leading separators in the remainder.
fn join_emulation(drive: char, rest: &str) -> String {
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        format!("/{drive}")
    } else {
        format!("/{drive}/{rest}")
    }
}
