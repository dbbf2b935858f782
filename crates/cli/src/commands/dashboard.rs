use std::process::Command;

use sourcing_core::config::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

/// Launch the external dashboard front end. The command line comes from
/// `sourcing.dashboard_command` and is split on whitespace; rendering the
/// dashboard itself is the subprocess's job.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "dashboard",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let Some(command_line) = config.sourcing.dashboard_command else {
        return CommandResult::failure(
            "dashboard",
            "config_validation",
            "no dashboard command configured; set sourcing.dashboard_command or SOURCING_DASHBOARD_COMMAND",
            2,
        );
    };

    let mut parts = command_line.split_whitespace();
    let Some(program) = parts.next() else {
        return CommandResult::failure(
            "dashboard",
            "config_validation",
            "configured dashboard command is empty",
            2,
        );
    };

    let status = Command::new(program).args(parts).status();
    match status {
        Ok(status) if status.success() => {
            CommandResult::success("dashboard", format!("dashboard exited cleanly: `{command_line}`"))
        }
        Ok(status) => CommandResult::failure(
            "dashboard",
            "subprocess",
            format!("dashboard exited with {status}: `{command_line}`"),
            4,
        ),
        Err(error) => CommandResult::failure(
            "dashboard",
            "subprocess",
            format!("failed to launch `{command_line}`: {error}"),
            4,
        ),
    }
}
