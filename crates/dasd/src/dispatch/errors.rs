//! Error types for DAS command failures.
//!
//! Each [`DasError`] variant corresponds to one DAS status code, which the
//! transport reports in the `X-DAS-Status` header. Backend failures arrive as
//! [`SourceError`] and are converted at the dispatch boundary.

use std::sync::Arc;

use das_types::ModelError;
use strum::Display;
use thiserror::Error;

use super::merge::MergeError;
use crate::source::SourceError;

/// DAS status codes reported for failed commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DasStatus {
    /// 400: unrecognised command.
    BadCommand,
    /// 401: unknown data source.
    BadDataSource,
    /// 402: malformed command arguments.
    BadCommandArguments,
    /// 403: unknown reference object.
    BadReferenceObject,
    /// 404: stylesheet unavailable.
    BadStylesheet,
    /// 405: coordinates outside the reference object.
    CoordinateError,
    /// 500: data source or server failure.
    ServerError,
    /// 501: operation not implemented.
    Unimplemented,
}

impl DasStatus {
    /// Numeric status code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::BadCommand => 400,
            Self::BadDataSource => 401,
            Self::BadCommandArguments => 402,
            Self::BadReferenceObject => 403,
            Self::BadStylesheet => 404,
            Self::CoordinateError => 405,
            Self::ServerError => 500,
            Self::Unimplemented => 501,
        }
    }
}

/// Errors surfaced by command dispatch.
#[derive(Debug, Clone, Error)]
pub enum DasError {
    /// Command name is not recognised.
    #[error("unknown command: {command}")]
    BadCommand { command: String },

    /// Data source is not registered.
    #[error("unknown data source: {dsn}")]
    BadDataSource { dsn: String },

    /// Query string is malformed or incomplete.
    #[error("invalid command arguments: {message}")]
    BadCommandArguments { message: String },

    /// Segment is unknown to the data source.
    #[error("unknown reference object '{segment_id}': {message}")]
    BadReferenceObject { segment_id: String, message: String },

    /// No stylesheet is available.
    #[error("stylesheet unavailable: {message}")]
    BadStylesheet { message: String },

    /// Coordinates fall outside the segment.
    #[error("coordinate error on '{segment_id}': {message}")]
    CoordinateError { segment_id: String, message: String },

    /// The data source does not implement the command.
    #[error("not implemented: {message}")]
    Unimplemented { message: String },

    /// The data source or the server failed.
    #[error("data source failure: {message}")]
    DataSourceFailure {
        message: String,
        #[source]
        source: Option<Arc<SourceError>>,
    },
}

impl DasError {
    /// Returns the DAS status for this error.
    #[must_use]
    pub const fn status(&self) -> DasStatus {
        match self {
            Self::BadCommand { .. } => DasStatus::BadCommand,
            Self::BadDataSource { .. } => DasStatus::BadDataSource,
            Self::BadCommandArguments { .. } => DasStatus::BadCommandArguments,
            Self::BadReferenceObject { .. } => DasStatus::BadReferenceObject,
            Self::BadStylesheet { .. } => DasStatus::BadStylesheet,
            Self::CoordinateError { .. } => DasStatus::CoordinateError,
            Self::Unimplemented { .. } => DasStatus::Unimplemented,
            Self::DataSourceFailure { .. } => DasStatus::ServerError,
        }
    }

    /// Creates an unknown command error.
    pub fn bad_command(command: impl Into<String>) -> Self {
        Self::BadCommand {
            command: command.into(),
        }
    }

    /// Creates an unknown data source error.
    pub fn bad_data_source(dsn: impl Into<String>) -> Self {
        Self::BadDataSource { dsn: dsn.into() }
    }

    /// Creates a malformed arguments error.
    pub fn bad_arguments(message: impl Into<String>) -> Self {
        Self::BadCommandArguments {
            message: message.into(),
        }
    }

    /// Creates a stylesheet error.
    pub fn bad_stylesheet(message: impl Into<String>) -> Self {
        Self::BadStylesheet {
            message: message.into(),
        }
    }

    /// Creates an unimplemented command error.
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::Unimplemented {
            message: message.into(),
        }
    }

    /// Creates a data source failure without an underlying error.
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSourceFailure {
            message: message.into(),
            source: None,
        }
    }
}

impl From<SourceError> for DasError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::BadReference {
                segment_id,
                message,
            } => Self::BadReferenceObject {
                segment_id,
                message,
            },
            SourceError::Coordinate {
                segment_id,
                message,
            } => Self::CoordinateError {
                segment_id,
                message,
            },
            SourceError::Unimplemented { operation } => {
                Self::unimplemented(format!("data source does not implement {operation}"))
            }
            failure @ SourceError::Failure { .. } => Self::DataSourceFailure {
                message: failure.to_string(),
                source: Some(Arc::new(failure)),
            },
        }
    }
}

impl From<MergeError> for DasError {
    fn from(error: MergeError) -> Self {
        Self::data_source(error.to_string())
    }
}

impl From<ModelError> for DasError {
    fn from(error: ModelError) -> Self {
        Self::bad_arguments(error.to_string())
    }
}
