use std::{
    ffi::OsStr,
    process::{Command, Stdio},
};

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    record::Record,
};

/// Runs the actual ssh session for a resolved host.
pub trait Connector {
    /// Verifies that `record` can log in. Must not start an interactive session.
    fn check(&self, record: &Record) -> Result<()>;

    /// Starts the interactive session. On unix this only returns on failure.
    fn exec(&self, record: &Record) -> Result<()>;
}

/// Password login through `sshpass`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshPass;

impl SshPass {
    fn sshpass(program: impl AsRef<OsStr>, record: &Record) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("-p")
            .arg(&record.secret)
            .args(["ssh", "-p", record.port_or_default()])
            .arg(record.destination());
        cmd
    }
}

impl Connector for SshPass {
    fn check(&self, record: &Record) -> Result<()> {
        // host keys of reinstalled machines change often, start from a clean entry
        let entry = record.known_hosts_entry();
        run_quiet(Command::new("ssh-keygen").args(["-R", entry.as_str()]), "ssh-keygen")?;

        let mut cmd = Self::sshpass("sshpass", record);
        cmd.arg("true");
        info!(destination = %record.destination(), port = record.port_or_default(), "testing connection");
        run_quiet(&mut cmd, "sshpass")?;

        println!("Connection test passed, proceeding with login...");
        Ok(())
    }

    fn exec(&self, record: &Record) -> Result<()> {
        let binary = which::which("sshpass").map_err(|_| Error::MissingBinary("sshpass"))?;
        let mut cmd = Self::sshpass(binary, record);
        debug!(destination = %record.destination(), "starting session");

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            let err = cmd.exec();
            Err(Error::Spawn {
                program: "sshpass".to_string(),
                source: err,
            })
        }

        #[cfg(not(unix))]
        {
            let status = cmd.status().map_err(|source| Error::Spawn {
                program: "sshpass".to_string(),
                source,
            })?;
            if status.success() {
                Ok(())
            } else {
                Err(Error::Command {
                    program: "sshpass".to_string(),
                    stderr: status.to_string(),
                })
            }
        }
    }
}

fn run_quiet(cmd: &mut Command, program: &str) -> Result<()> {
    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| Error::Spawn {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }
    Err(Error::Command {
        program: program.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
