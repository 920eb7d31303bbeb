// Copyright 2024 the oscompute authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error and result types.

use std::borrow::Cow;
use std::error;
use std::fmt;

use reqwest::StatusCode;

/// Kind of an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failure.
    ///
    /// Maps to HTTP 401.
    AuthenticationFailed,

    /// Access denied.
    ///
    /// Maps to HTTP 403.
    AccessDenied,

    /// Requested resource was not found.
    ///
    /// Maps to HTTP 404 and 410.
    ResourceNotFound,

    /// Request returned a conflict.
    ///
    /// Maps to HTTP 409.
    Conflict,

    /// Requested operation is not supported by the server.
    ///
    /// Maps to HTTP 405 and 501.
    OperationNotSupported,

    /// The API version requested is not supported by the server.
    ///
    /// Maps to HTTP 406, also returned when a microversion fails local
    /// validation.
    IncompatibleApiVersion,

    /// The request timed out.
    ///
    /// Maps to HTTP 408 and client-side timeouts.
    RequestTimeout,

    /// An operation on a resource ended in an unexpected state.
    ///
    /// Returned by status waits when the server reports an error status
    /// instead of the awaited one.
    OperationFailed,

    /// The service catalog does not contain a suitable endpoint.
    EndpointNotFound,

    /// Invalid value passed to one of the parameters.
    ///
    /// May be a programming error.
    InvalidInput,

    /// Invalid configuration (e.g. environment variables).
    InvalidConfig,

    /// The server response was malformed or unexpected.
    InvalidResponse,

    /// An owner-dependent method was called on an object without an owner.
    ///
    /// Happens when a resource or reference is constructed by hand (for
    /// example, deserialized directly) instead of being fetched through a
    /// client. Always a programming error.
    DetachedObject,

    /// Server-side error.
    ///
    /// Maps to HTTP 5xx codes other than 501.
    InternalServerError,

    /// A problem at the protocol level: connection failures, malformed
    /// requests and responses that cannot be attributed to the server.
    ProtocolError,
}

impl ErrorKind {
    /// Short human-readable description of the kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailed => "authentication failed",
            ErrorKind::AccessDenied => "access denied",
            ErrorKind::ResourceNotFound => "resource not found",
            ErrorKind::Conflict => "requested operation conflicts with the resource state",
            ErrorKind::OperationNotSupported => "operation not supported",
            ErrorKind::IncompatibleApiVersion => "incompatible API version",
            ErrorKind::RequestTimeout => "request timed out",
            ErrorKind::OperationFailed => "operation ended in an unexpected state",
            ErrorKind::EndpointNotFound => "suitable endpoint not found",
            ErrorKind::InvalidInput => "invalid value provided",
            ErrorKind::InvalidConfig => "invalid configuration",
            ErrorKind::InvalidResponse => "malformed response from the server",
            ErrorKind::DetachedObject => "object is not attached to a client",
            ErrorKind::InternalServerError => "server-side error",
            ErrorKind::ProtocolError => "protocol-level error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<StatusCode> for ErrorKind {
    fn from(value: StatusCode) -> ErrorKind {
        match value {
            StatusCode::UNAUTHORIZED => ErrorKind::AuthenticationFailed,
            StatusCode::FORBIDDEN => ErrorKind::AccessDenied,
            StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::ResourceNotFound,
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                ErrorKind::OperationNotSupported
            }
            StatusCode::NOT_ACCEPTABLE => ErrorKind::IncompatibleApiVersion,
            StatusCode::REQUEST_TIMEOUT => ErrorKind::RequestTimeout,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            _ if value.is_server_error() => ErrorKind::InternalServerError,
            _ => ErrorKind::ProtocolError,
        }
    }
}

/// Error from an OpenStack call.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    status: Option<StatusCode>,
}

impl Error {
    /// Create a new error of the provided kind.
    pub fn new<S: Into<Cow<'static, str>>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Create an `EndpointNotFound` error for a service type.
    pub(crate) fn new_endpoint_not_found<D: fmt::Display>(service_type: D) -> Error {
        Error::new(
            ErrorKind::EndpointNotFound,
            format!("endpoint for service {} was not found", service_type),
        )
    }

    /// Error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status code, if this error was caused by a failed request.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Add an HTTP status code to the error.
    pub(crate) fn with_status(mut self, status: StatusCode) -> Error {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        Ok(())
    }
}

impl error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let kind = if value.is_timeout() {
            ErrorKind::RequestTimeout
        } else if value.is_decode() {
            ErrorKind::InvalidResponse
        } else if let Some(status) = value.status() {
            status.into()
        } else {
            ErrorKind::ProtocolError
        };
        let result = Error::new(kind, value.to_string());
        match value.status() {
            Some(status) => result.with_status(status),
            None => result,
        }
    }
}
