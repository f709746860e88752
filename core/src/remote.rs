//! Remote work on the boards over `ssh`: reading their routes, rotating the password and
//! installing keys. The boards warn on every login while the factory password is set.

use std::net::Ipv4Addr;

use anyhow::Context;
use descry_common::config::DEFAULT_SSH_USER;
use descry_common::network::interface::{Interface, InterfaceParser};
use tracing::{debug, info};

use crate::system::{self, CommandError};

/// Password the boards ship with.
pub const FACTORY_PASSWORD: &str = "raspberry";

/// -T: no pseudo-tty, nothing here is interactive.
const SSH_OPTIONS: &[&str] = &["-T", "-o", "StrictHostKeyChecking=no"];

/// How one host fared in a multi-host operation.
#[derive(Debug)]
pub struct HostOutcome {
    pub host: String,
    pub result: Result<String, CommandError>,
}

impl HostOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Ssh {
    user: String,
    routes: InterfaceParser,
}

impl Ssh {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            routes: InterfaceParser::new(),
        }
    }

    pub fn user_host(&self, host: &str) -> String {
        format!("{}@{host}", self.user)
    }

    /// Full argument vector for running `remote` on `host`.
    pub fn command_line(&self, host: &str, remote: &[&str]) -> Vec<String> {
        std::iter::once("ssh")
            .chain(SSH_OPTIONS.iter().copied())
            .map(str::to_string)
            .chain(std::iter::once(self.user_host(host)))
            .chain(remote.iter().map(|arg| arg.to_string()))
            .collect()
    }

    pub fn run(&self, host: &str, remote: &[&str], stdin: Option<&str>) -> Result<String, CommandError> {
        let command = self.command_line(host, remote);
        let args: Vec<&str> = command.iter().map(String::as_str).collect();
        system::run(&args, stdin)
    }

    /// `ip route` as seen from `host`.
    pub fn route_table(&self, host: &str) -> Result<String, CommandError> {
        self.run(host, &["ip", "route"], None)
    }

    /// The interface `host` reaches its default route through.
    pub fn remote_interface(&self, host: Ipv4Addr) -> anyhow::Result<Option<Interface>> {
        let routes = self
            .route_table(&host.to_string())
            .with_context(|| format!("failed to read the route table of {host}"))?;
        Ok(self.routes.parse_route_query(&routes, host)?)
    }

    /// Runs `passwd` on every host. A host that fails does not stop the others.
    pub fn change_password(&self, hosts: &[String], current: &str, new: &str) -> Vec<HostOutcome> {
        let input = passwd_input(current, new);
        self.for_each_host(hosts, "Changing password", |host| {
            self.run(host, &["/usr/bin/passwd"], Some(&input))
        })
    }

    /// Installs the local public key on every host with `ssh-copy-id`.
    pub fn copy_id(&self, hosts: &[String], password: &str) -> Vec<HostOutcome> {
        if system::ensure_executable("ssh-copy-id").is_err() {
            return hosts
                .iter()
                .map(|host| HostOutcome {
                    host: host.clone(),
                    result: Err(CommandError::Missing {
                        app: "ssh-copy-id".to_string(),
                    }),
                })
                .collect();
        }

        let input = format!("{password}\n");
        self.for_each_host(hosts, "Installing SSH keys", |host| {
            let target = self.user_host(host);
            system::run(&["ssh-copy-id", target.as_str()], Some(&input))
        })
    }

    fn for_each_host<F>(&self, hosts: &[String], action: &str, mut op: F) -> Vec<HostOutcome>
    where
        F: FnMut(&str) -> Result<String, CommandError>,
    {
        hosts
            .iter()
            .map(|host| {
                info!("{action} on {} ...", self.user_host(host));
                let result = op(host);
                if let Err(e) = &result {
                    debug!("{host}: {e}");
                }
                HostOutcome {
                    host: host.clone(),
                    result,
                }
            })
            .collect()
    }
}

impl Default for Ssh {
    fn default() -> Self {
        Self::new(DEFAULT_SSH_USER)
    }
}

/// What `passwd` reads: the current password once, the new one twice.
pub fn passwd_input(current: &str, new: &str) -> String {
    format!("{current}\n{new}\n{new}\n")
}
