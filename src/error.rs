//! Error types for rendering and submitting Argo CD applications.
use std::path::PathBuf;

use http::StatusCode;
use thiserror::Error;

use crate::{template::TemplateError, types::RemoteApplication};

/// Message surfaced when a failed create response carries no usable `message`.
pub const CREATE_FAILED_MESSAGE: &str = "error creating argo cd app";
/// Message surfaced when a failed get response could not be decoded.
pub const READ_FAILED_MESSAGE: &str = "error get argo cd app";

/// Possible errors when creating or reading an Argo CD `Application`.
#[derive(Debug, Error)]
pub enum Error {
    /// The application template could not be read from disk.
    #[error("failed to read application template {}: {source}", .path.display())]
    TemplateSourceUnavailable {
        /// Path the template was read from.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// The template text is not valid template syntax.
    #[error("failed to parse application template: {0}")]
    TemplateParse(#[source] TemplateError),

    /// The template references data the request does not provide.
    #[error("failed to render application template: {0}")]
    TemplateExecution(#[source] TemplateError),

    /// In-cluster credentials or configuration could not be discovered.
    #[error("failed to load in-cluster config: {0}")]
    TransportConfig(#[source] kube::config::InClusterError),

    /// A client could not be built from the discovered configuration.
    #[error("failed to build cluster client: {0}")]
    ClientBuild(#[source] kube::Error),

    /// The request is missing something the API path needs.
    #[error("invalid application request: {0}")]
    InvalidRequest(String),

    /// The create request failed.
    ///
    /// Carries the `message` of the failed response when one could be decoded.
    #[error("{message}")]
    ApplicationCreate {
        /// Server supplied message, or [`CREATE_FAILED_MESSAGE`].
        message: String,
    },

    /// The get request failed and its response body was not a JSON object.
    #[error("{}", READ_FAILED_MESSAGE)]
    ApplicationRead,

    /// The get request failed; the decoded response body is kept alongside the failure.
    #[error("{source}")]
    ApplicationGet {
        /// Decoded body of the failed response.
        resource: RemoteApplication,
        /// Original transport failure.
        #[source]
        source: TransportError,
    },
}

/// Failures of a single raw request against the API server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The http request could not be assembled.
    #[error("failed to build request: {0}")]
    Build(#[source] http::Error),

    /// The request never produced a complete response.
    #[error("request failed: {0}")]
    Request(#[source] kube::Error),

    /// The server answered with a non-success status.
    #[error("the server responded with status {status}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Raw response body.
        body: Vec<u8>,
    },
}

impl TransportError {
    /// Raw response body, empty when no response was received.
    pub fn body(&self) -> &[u8] {
        match self {
            TransportError::Status { body, .. } => body,
            _ => &[],
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_error_displays_server_message_verbatim() {
        let err = Error::ApplicationCreate {
            message: "conflict".to_string(),
        };
        assert_eq!(err.to_string(), "conflict");
    }

    #[test]
    fn transport_body_only_present_for_status_errors() {
        let err = TransportError::Status {
            status: StatusCode::NOT_FOUND,
            body: b"{}".to_vec(),
        };
        assert_eq!(err.body(), b"{}");
        let err = TransportError::Build(http::Request::get("\n").body(()).unwrap_err());
        assert!(err.body().is_empty());
    }
}
