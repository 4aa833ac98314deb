//! .NET workload restore

use std::path::Path;

use tracing::info;

use crate::process::{CommandSpec, ProcessError, ProcessRunner};

/// Run `dotnet workload restore` for a solution or project file
pub async fn restore_workloads(
    runner: &dyn ProcessRunner,
    solution: &Path,
) -> Result<(), ProcessError> {
    info!("Restoring workloads for {}", solution.display());

    // The argument is resolved against the working directory, so it is
    // reduced to the file name once the solution's directory is entered.
    let dir = solution.parent().filter(|dir| !dir.as_os_str().is_empty());
    let target = match (dir, solution.file_name()) {
        (Some(_), Some(name)) => Path::new(name),
        _ => solution,
    };

    let mut command = CommandSpec::new("dotnet")
        .args(["workload", "restore"])
        .arg(target.display().to_string());
    if let Some(dir) = dir {
        command = command.current_dir(dir);
    }

    runner.run(&command).await?;
    Ok(())
}
