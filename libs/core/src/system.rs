// Privileged system operations
//
// Service control and package installation run through sudo. The updaters and
// the button handler only see the `SystemControl` trait so their logic can be
// exercised without root.

use crate::error::Result;
use crate::utils::{run_success, sudo};
use std::path::Path;

pub trait SystemControl {
    /// `systemctl start <service>`
    fn start_service(&self, service: &str) -> Result<()>;

    /// `systemctl restart <service>`
    fn restart_service(&self, service: &str) -> Result<()>;

    /// `apt install ./<file_name>`, run inside `dir`
    fn install_package(&self, dir: &Path, file_name: &str) -> Result<()>;
}

/// Production implementation shelling out to `sudo systemctl` and `sudo apt`
#[derive(Debug, Default, Clone, Copy)]
pub struct SudoSystem;

impl SystemControl for SudoSystem {
    fn start_service(&self, service: &str) -> Result<()> {
        run_success(&mut sudo("systemctl", &["start", service]))?;
        Ok(())
    }

    fn restart_service(&self, service: &str) -> Result<()> {
        run_success(&mut sudo("systemctl", &["restart", service]))?;
        Ok(())
    }

    fn install_package(&self, dir: &Path, file_name: &str) -> Result<()> {
        let local = format!("./{file_name}");
        let mut command = sudo("apt", &["install", &local]);
        command.current_dir(dir);
        run_success(&mut command)?;
        Ok(())
    }
}
