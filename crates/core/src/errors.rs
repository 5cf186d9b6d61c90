use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid route")]
    InvalidRoute,
    #[error("invalid price")]
    InvalidPrice,
    #[error("invalid idn")]
    InvalidIdn,
    #[error("invalid shipment id")]
    InvalidShipmentId,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("upstream rejected request: {0}")]
    UpstreamRejected(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded { operation: &'static str },
    #[error("internal failure: {0}")]
    Internal(String),
}

/// Closed set of failure classes shared by every boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    InvalidInput,
    NotFound,
    UpstreamUnavailable,
    UpstreamRejected,
    Internal,
}

impl ApplicationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Domain(_) => ErrorClass::InvalidInput,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::UpstreamUnavailable(_) => ErrorClass::UpstreamUnavailable,
            Self::UpstreamRejected(_) => ErrorClass::UpstreamRejected,
            Self::Persistence(_) | Self::DeadlineExceeded { .. } | Self::Internal(_) => {
                ErrorClass::Internal
            }
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

/// Caller-facing error. `message` is always safe to return to clients.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";
pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "customer service unavailable";

impl InterfaceError {
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::NotFound { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::UpstreamRejected(message) => {
                Self::BadRequest { message, correlation_id }
            }
            ApplicationError::NotFound { entity } => {
                Self::NotFound { message: format!("{entity} not found"), correlation_id }
            }
            ApplicationError::UpstreamUnavailable(_) => Self::ServiceUnavailable {
                message: UPSTREAM_UNAVAILABLE_MESSAGE.to_owned(),
                correlation_id,
            },
            ApplicationError::Persistence(_)
            | ApplicationError::DeadlineExceeded { .. }
            | ApplicationError::Internal(_) => {
                Self::Internal { message: INTERNAL_ERROR_MESSAGE.to_owned(), correlation_id }
            }
        }
    }
}
