use anyhow::{anyhow, bail, Context, Result};
use std::ffi::OsStr;
use std::io::{Read, Write};
use std::process::{Child, ChildStderr, ChildStdout, Command, Output, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL: Duration = Duration::from_millis(20);

/// Runs `exe args...`, optionally feeding `stdin`, and fails on a non-zero exit.
///
/// A `timeout_seconds` of 0 waits forever.
pub fn run_tool<S: AsRef<OsStr>>(
    exe: &str,
    args: &[S],
    stdin: Option<&[u8]>,
    timeout_seconds: u64,
    keep_stderr: bool,
) -> Result<Output> {
    let output = run_tool_unchecked(exe, args, stdin, timeout_seconds)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{exe} failed ({}): {}", output.status, stderr.trim());
    }

    if keep_stderr && !output.stderr.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{exe} stderr: {}", stderr.trim());
    }

    Ok(output)
}

/// Like [`run_tool`] but hands back the output whatever the exit status.
/// Spawn failures and timeouts are still errors.
pub fn run_tool_unchecked<S: AsRef<OsStr>>(
    exe: &str,
    args: &[S],
    stdin: Option<&[u8]>,
    timeout_seconds: u64,
) -> Result<Output> {
    debug!("spawn {exe} timeout={timeout_seconds}s");
    let mut child = Command::new(exe)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning {exe}"))?;

    if let Some(bytes) = stdin {
        let mut pipe = child.stdin.take().ok_or_else(|| anyhow!("{exe}: no stdin"))?;
        pipe.write_all(bytes)
            .with_context(|| format!("writing stdin of {exe}"))?;
    }

    if timeout_seconds == 0 {
        return child
            .wait_with_output()
            .with_context(|| format!("waiting for {exe}"));
    }
    wait_with_deadline(exe, child, Duration::from_secs(timeout_seconds))
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut r) = reader {
            r.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(exe: &str, handle: JoinHandle<std::io::Result<Vec<u8>>>, stream: &str) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("{exe}: {stream} reader panicked"))?
        .with_context(|| format!("{exe}: reading {stream}"))
}

fn wait_with_deadline(exe: &str, mut child: Child, timeout: Duration) -> Result<Output> {
    // Pipes are drained concurrently so the child never stalls on a full buffer.
    let stdout = drain::<ChildStdout>(child.stdout.take());
    let stderr = drain::<ChildStderr>(child.stderr.take());
    let deadline = Instant::now() + timeout;

    let status = loop {
        if let Some(status) = child.try_wait().with_context(|| format!("polling {exe}"))? {
            break status;
        }
        if Instant::now() >= deadline {
            warn!("{exe} still running after {timeout:?}; killing it");
            let _ = child.kill();
            child.wait().with_context(|| format!("reaping {exe}"))?;
            let stderr = collect(exe, stderr, "stderr").unwrap_or_default();
            bail!(
                "{exe} timed out after {timeout:?}: {}",
                String::from_utf8_lossy(&stderr).trim()
            );
        }
        std::thread::sleep(POLL);
    };

    Ok(Output {
        status,
        stdout: collect(exe, stdout, "stdout")?,
        stderr: collect(exe, stderr, "stderr")?,
    })
}

/// First non-empty line of a tool's `--version` style output (some print to stderr).
pub fn first_line(output: &Output) -> Option<String> {
    [&output.stdout, &output.stderr]
        .into_iter()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .flat_map(|s| s.lines().map(str::to_string).collect::<Vec<_>>())
        .map(|l| l.trim().to_string())
        .find(|l| !l.is_empty())
}
