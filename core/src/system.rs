//! Local command execution: `arp`, `ifconfig` and `fping`.
//!
//! Every query shells out and hands back the raw text; the parsers in [`crate::arp`],
//! [`crate::sweep`] and [`descry_common::network::interface`] make sense of it.

use std::env;
use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::Context;
use pnet::ipnetwork::Ipv4Network;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing `{app}`. Try `brew install {app}`, `apt-get install {app}`, etc")]
    Missing { app: String },
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed: {output}")]
    Failed { command: String, output: String },
}

/// Checks that `app` can be found on `$PATH` (or, given a path, that it exists).
pub fn ensure_executable(app: &str) -> Result<(), CommandError> {
    let found = if app.contains('/') {
        Path::new(app).is_file()
    } else {
        env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).any(|dir| dir.join(app).is_file()))
            .unwrap_or(false)
    };

    if found {
        Ok(())
    } else {
        Err(CommandError::Missing { app: app.to_string() })
    }
}

/// Runs `command`, optionally feeding `stdin`, and returns stdout followed by stderr.
///
/// # Errors
/// [`CommandError::Failed`] carries the captured output when the exit status is non-zero.
pub fn run(command: &[&str], stdin: Option<&str>) -> Result<String, CommandError> {
    let (status, output) = capture(command, stdin)?;
    if status.success() {
        Ok(output)
    } else {
        Err(CommandError::Failed {
            command: command.join(" "),
            output,
        })
    }
}

fn capture(command: &[&str], stdin: Option<&str>) -> Result<(ExitStatus, String), CommandError> {
    let spawn_error = |source| CommandError::Spawn {
        command: command.join(" "),
        source,
    };
    let Some((program, args)) = command.split_first() else {
        return Err(spawn_error(io::Error::new(io::ErrorKind::InvalidInput, "empty command")));
    };

    debug!("Running {}", command.join(" "));
    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input.as_bytes()).map_err(spawn_error)?;
    }

    let output = child.wait_with_output().map_err(spawn_error)?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    trace!("{program} exited with {}", output.status);

    Ok((output.status, text))
}

/// fping exits with 1 when some hosts did not answer, which is the normal outcome of a sweep.
fn run_fping(command: &[&str], stdin: Option<&str>) -> Result<String, CommandError> {
    let (status, output) = capture(command, stdin)?;
    match status.code() {
        Some(0 | 1) => Ok(output),
        _ => Err(CommandError::Failed {
            command: command.join(" "),
            output,
        }),
    }
}

/// Defines the contract for querying the local machine's network state.
pub trait SystemRepository {
    /// The neighbor (ARP) table, as printed by `arp -n -a`.
    fn neighbor_table(&self) -> anyhow::Result<String>;
    /// `ifconfig` output for one interface, or all of them.
    fn interface_config(&self, name: Option<&str>) -> anyhow::Result<String>;
    /// Per-host `fping` summaries after pinging every address of `network`.
    fn sweep(&self, network: Ipv4Network) -> anyhow::Result<String>;
    /// `fping` verdicts (`<ip> is alive`) for `hosts`.
    fn ping(&self, hosts: &[Ipv4Addr]) -> anyhow::Result<String>;
}

pub struct SystemRepo;

impl SystemRepository for SystemRepo {
    fn neighbor_table(&self) -> anyhow::Result<String> {
        // -n skips reverse DNS, the names are of no use here.
        run(&["arp", "-n", "-a"], None).context("failed to read the neighbor table")
    }

    fn interface_config(&self, name: Option<&str>) -> anyhow::Result<String> {
        let mut command = vec!["ifconfig"];
        command.extend(name);
        run(&command, None).context("failed to read interface configuration")
    }

    fn sweep(&self, network: Ipv4Network) -> anyhow::Result<String> {
        ensure_executable("fping")?;
        let cidr = network.to_string();
        // Small packets, two per host (the second wakes sleeping boards), one retry, short
        // timeout, 1ms apart. Runs without root.
        let command = [
            "fping", "--size", "40", "--count", "2", "--retry", "1", "--timeout=50",
            "--interval", "1", "--generate", cidr.as_str(),
        ];
        run_fping(&command, None).with_context(|| format!("failed to sweep {cidr}"))
    }

    fn ping(&self, hosts: &[Ipv4Addr]) -> anyhow::Result<String> {
        ensure_executable("fping")?;
        let list = hosts
            .iter()
            .map(Ipv4Addr::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        run_fping(&["fping"], Some(&list)).context("failed to ping hosts")
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
