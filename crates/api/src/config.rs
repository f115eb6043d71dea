use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight script runs (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Script execution settings.
    pub scripting: ScriptingConfig,
}

/// Settings for the script execution coordinator.
#[derive(Debug, Clone)]
pub struct ScriptingConfig {
    /// Interpreter for `bash` tasks (default: `bash`).
    pub shell_bin: String,
    /// Interpreter for `python` tasks (default: `python3`).
    pub python_bin: String,
    /// Parent directory for per-run workspaces; `None` uses the system temp dir.
    pub workspace_root: Option<PathBuf>,
    /// Maximum number of scripts running at once (default: `4`).
    pub max_concurrency: usize,
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            shell_bin: "bash".to_string(),
            python_bin: "python3".to_string(),
            workspace_root: None,
            max_concurrency: 4,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            scripting: ScriptingConfig::from_env(),
        }
    }
}

impl ScriptingConfig {
    /// Load scripting settings from environment variables with defaults.
    ///
    /// | Env Var                  | Default        |
    /// |--------------------------|----------------|
    /// | `SCRIPT_SHELL_BIN`       | `bash`         |
    /// | `SCRIPT_PYTHON_BIN`      | `python3`      |
    /// | `SCRIPT_WORKSPACE_ROOT`  | system temp    |
    /// | `SCRIPT_MAX_CONCURRENCY` | `4`            |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let shell_bin = std::env::var("SCRIPT_SHELL_BIN").unwrap_or(defaults.shell_bin);
        let python_bin = std::env::var("SCRIPT_PYTHON_BIN").unwrap_or(defaults.python_bin);

        let workspace_root = std::env::var("SCRIPT_WORKSPACE_ROOT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let max_concurrency: usize = std::env::var("SCRIPT_MAX_CONCURRENCY")
            .unwrap_or_else(|_| defaults.max_concurrency.to_string())
            .parse()
            .expect("SCRIPT_MAX_CONCURRENCY must be a valid usize");
        assert!(max_concurrency > 0, "SCRIPT_MAX_CONCURRENCY must be at least 1");

        Self {
            shell_bin,
            python_bin,
            workspace_root,
            max_concurrency,
        }
    }
}
