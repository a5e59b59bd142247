//! Error types for forum-core

use thiserror::Error;

/// Core error type for the forum backend
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Unit file does not carry the recognized extension
    #[error("[E003] Unit file '{path}' must end in .{expected}")]
    UnknownExtension { path: String, expected: &'static str },

    /// E004: Unit file missing from every asset layer
    #[error("[E004] Unit file not found: {path}")]
    UnitFileNotFound { path: String },

    /// E005: Unit file could not be decoded
    #[error("[E005] Failed to decode unit file '{path}': {source}")]
    UnitDecode {
        path: String,
        source: serde_yaml::Error,
    },

    /// E006: Unit name derived from the file path is empty
    #[error("[E006] Unit file '{path}' yields an empty unit name")]
    EmptyUnitName { path: String },

    /// E007: Two unit files derive the same name
    #[error("[E007] Duplicate unit name: {name}")]
    DuplicateUnit { name: String },

    /// E008: IO error with file path context
    #[error("[E008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E009: Config file parse error
    #[error("[E009] Failed to parse config '{path}': {source}")]
    ConfigParse {
        path: String,
        source: serde_yaml::Error,
    },

    /// G001: Unit not present in the graph
    #[error("[G001] Unit not found: {name}")]
    UnitNotFound { name: String },

    /// G002: Unit stored under a key that is not its own name
    #[error("[G002] Unit stored as '{key}' is named '{name}'")]
    NameMismatch { key: String, name: String },

    /// G003: Pending unit declares no dependencies at all
    #[error("[G003] Unit '{name}' has an empty depends_on (use 'nothing')")]
    NoDependencies { name: String },

    /// G004: Dependency does not resolve to a unit in the graph
    #[error("[G004] Unit '{unit}' depends on missing unit '{dependency}'")]
    MissingDependency { unit: String, dependency: String },

    /// G005: Subgraph root is not a target
    #[error("[G005] Unit '{name}' is a {kind}, not a target")]
    NotATarget { name: String, kind: String },

    /// G006: Target unit carries SQL
    #[error("[G006] Target '{name}' must not carry SQL")]
    TargetHasSql { name: String },

    /// ID001: Generator epoch lies in the future
    #[error("[ID001] Snowflake start time {start_time} is after current time {now}")]
    FutureStartTime { start_time: i64, now: i64 },

    /// ID002: Instance id outside the instance field
    #[error("[ID002] Snowflake instance id {instance_id} must be in 0..{max}")]
    InvalidInstance { instance_id: i64, max: i64 },

    /// ID003: Malformed base58 input
    #[error("[ID003] Invalid base58 id '{input}': {reason}")]
    InvalidBase58 { input: String, reason: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
