use std::fs;
use std::path::Path;

use crate::commands::CommandResult;

const CONFIG_FILE: &str = "sourcing.toml";

// Every key commented out: config loading fails fast on unresolvable
// ${VAR} placeholders, so the template must be inert until edited.
const CONFIG_TEMPLATE: &str = r#"# Sourcing agent configuration.
# Uncomment and fill in at least one model credential before running
# `sourcing analyze`. Values may reference environment variables as ${VAR}.

[llm]
# openai_api_key = "${OPENAI_API_KEY}"
# google_api_key = "${GOOGLE_API_KEY}"
# openai_model = "gpt-4"
# google_model = "gemini-pro"

[search]
# tavily_api_key = "${TAVILY_API_KEY}"
# serper_api_key = "${SERPER_API_KEY}"

[database]
# url = "sqlite://data/sourcing.db"

[sourcing]
# max_suppliers = 50
# reports_dir = "data/reports"
# dashboard_command = "streamlit run dashboard.py"

[logging]
# level = "info"
# format = "compact"
"#;

/// Scaffold the working directories and a template credentials file. Safe
/// to re-run; existing files are left untouched.
pub fn run() -> CommandResult {
    let mut created = Vec::new();

    for dir in ["data", "data/reports", "logs"] {
        match ensure_dir(dir) {
            Ok(true) => created.push(format!("{dir}/")),
            Ok(false) => {}
            Err(error) => {
                return CommandResult::failure(
                    "setup",
                    "io",
                    format!("failed to create `{dir}`: {error}"),
                    4,
                );
            }
        }
    }

    if !Path::new(CONFIG_FILE).exists() {
        if let Err(error) = fs::write(CONFIG_FILE, CONFIG_TEMPLATE) {
            return CommandResult::failure(
                "setup",
                "io",
                format!("failed to write `{CONFIG_FILE}`: {error}"),
                4,
            );
        }
        created.push(CONFIG_FILE.to_string());
    }

    let message = if created.is_empty() {
        "workspace already scaffolded, nothing to do".to_string()
    } else {
        format!("created: {}", created.join(", "))
    };
    CommandResult::success("setup", message)
}

fn ensure_dir(path: &str) -> std::io::Result<bool> {
    if Path::new(path).is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)?;
    Ok(true)
}
