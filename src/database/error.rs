use std::convert::Infallible;
use std::fmt::{self, Display};

use serde::Serialize;
use warp::http::StatusCode;
use warp::reject::Rejection;

/// Boundary error carried through every action. `code` follows HTTP status
/// semantics so the warp layer can translate it without inspection.
#[derive(Debug, Clone)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            Some(info) => write!(f, "[{}] {}", self.code, info),
            None => write!(f, "[{}]", self.code),
        }
    }
}

impl std::error::Error for Error {}
impl warp::reject::Reject for Error {}

/// Constructors for the client-facing error taxonomy. Validation failures are
/// `InvalidRequest`, duplicate favorite/cart/subscription rows are `Conflict`,
/// absent rows are `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    InvalidRequest,
    Unauthorized,
    InvalidSession,
    NotFound,
    Conflict,
    InternalServerError,
}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest => 400,
            ApiError::Unauthorized => 401,
            ApiError::InvalidSession => 401,
            ApiError::NotFound => 404,
            ApiError::Conflict => 409,
            ApiError::InternalServerError => 500,
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
        }
    }

    pub fn default(self) -> Error {
        let info = match self {
            ApiError::InvalidRequest => "Invalid request",
            ApiError::Unauthorized => "You don't have permission to perform this action",
            ApiError::InvalidSession => "Invalid session",
            ApiError::NotFound => "Not found",
            ApiError::Conflict => "Already exists",
            ApiError::InternalServerError => "Internal server error",
        };

        self.new(info)
    }
}

pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

impl Into<Error> for QueryError {
    fn into(self) -> Error {
        Error {
            code: 500,
            info: Some(self.info),
        }
    }
}

pub struct CacheError {
    info: String,
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl CacheError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl Into<Error> for CacheError {
    fn into(self) -> Error {
        Error {
            code: 500,
            info: Some(self.info),
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl Into<Error> for TypeError {
    fn into(self) -> Error {
        ApiError::InvalidRequest.new(&self.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}
impl Into<Rejection> for TypeError {
    fn into(self) -> Rejection {
        warp::reject::custom::<Error>(ApiError::InvalidRequest.new(&self.info))
    }
}

#[derive(Serialize)]
struct ErrorPayload {
    code: u16,
    message: String,
}

/// Recovery handler translating rejections into the structured JSON error
/// payload served to clients.
pub async fn handle_rejection(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let payload = if let Some(e) = err.find::<Error>() {
        ErrorPayload {
            code: e.code,
            message: e.info.clone().unwrap_or_else(|| String::from("Error")),
        }
    } else if err.is_not_found() {
        ErrorPayload {
            code: 404,
            message: String::from("Not found"),
        }
    } else {
        log::error!("Unhandled rejection: {err:?}");
        ErrorPayload {
            code: 500,
            message: String::from("Internal server error"),
        }
    };

    let status = StatusCode::from_u16(payload.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(warp::reply::with_status(
        warp::reply::json(&payload),
        status,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_codes() {
        assert_eq!(ApiError::InvalidRequest.code(), 400);
        assert_eq!(ApiError::Conflict.code(), 409);
        assert_eq!(ApiError::NotFound.code(), 404);
        assert_eq!(ApiError::InternalServerError.code(), 500);
    }

    #[test]
    fn api_error_carries_info() {
        let e = ApiError::Conflict.new("Recipe is already in favorites");
        assert_eq!(e.code, 409);
        assert_eq!(e.info.as_deref(), Some("Recipe is already in favorites"));
    }

    #[test]
    fn type_error_maps_to_invalid_request() {
        let e: Error = TypeError::new("Invalid variant").into();
        assert_eq!(e.code, 400);
    }

    #[test]
    fn error_rejects_and_is_recoverable() {
        let rejection: Rejection = warp::reject::custom(ApiError::Conflict.default());

        let found = rejection.find::<Error>().unwrap();
        assert_eq!(found.code, 409);
    }
}
