/// Constants shared across the pawnforge workspace.
// Compiler conventions
/// Substring the compiler prints into its log when a compile fails. The exit
/// code is not a reliable signal, so this marker is the only classification
/// input.
pub const COMPILE_FAILED_MARKER: &str = "(compile failed)";

/// Extension of the compiled artifact.
pub const ARTIFACT_EXTENSION: &str = "amxx";

/// Default compiler executable, resolved via PATH unless configured.
pub const DEFAULT_COMPILER_COMMAND: &str = "amxxpc";

// Directory layout under the base directory
pub const PLUGINS_DIR_NAME: &str = "plugins";
pub const JOBS_DIR_NAME: &str = "jobs";

/// Default store file, relative to the base directory.
pub const DEFAULT_STORE_FILE: &str = "db.json";

// Environment variable overrides
pub const BASE_DIR_ENV_VAR: &str = "PAWNFORGE_BASE_DIR";
pub const COMPILER_ENV_VAR: &str = "PAWNFORGE_COMPILER";
pub const LOG_ENV_VAR: &str = "PAWNFORGE_LOG";
