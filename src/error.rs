use snafu::Snafu;

/// Crate-wide result alias. Every fallible operation in this crate returns
/// this type; the HTTP layer is the only place that turns an [`Error`] into
/// a status code.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{resource} not found"))]
    NotFound { resource: String },

    #[snafu(display("invalid input: {message}"))]
    InvalidInput { message: String },

    #[snafu(display("database unavailable: {message}"))]
    DatabaseUnavailable { message: String },

    #[snafu(display("database query failed"))]
    Database { source: tokio_postgres::Error },

    #[snafu(display("failed to acquire a pooled connection"))]
    Pool {
        source: bb8::RunError<tokio_postgres::Error>,
    },

    #[snafu(display("remote geoprocessing service returned an error: {message}"))]
    RemoteServiceError { status: u16, message: String },

    #[snafu(display("remote geoprocessing service timed out"))]
    RemoteTimeout,

    #[snafu(display("geometry operation failed: {message}"))]
    GeometryError { message: String },

    #[snafu(display("configuration error: {message}"))]
    ConfigurationError { message: String },

    #[snafu(display("internal error: {message}"))]
    Internal { message: String },
}

impl Error {
    /// The error kind name as used in the `{code, message}` wire body and in
    /// log lines; stable across releases, unlike `Display`'s message text.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NotFound",
            Error::InvalidInput { .. } => "InvalidInput",
            Error::DatabaseUnavailable { .. } | Error::Database { .. } | Error::Pool { .. } => {
                "DatabaseUnavailable"
            }
            Error::RemoteServiceError { .. } => "RemoteServiceError",
            Error::RemoteTimeout => "RemoteTimeout",
            Error::GeometryError { .. } => "GeometryError",
            Error::ConfigurationError { .. } => "ConfigurationError",
            Error::Internal { .. } => "Internal",
        }
    }

    pub fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Error::DatabaseUnavailable { .. }
            | Error::Database { .. }
            | Error::Pool { .. }
            | Error::GeometryError { .. }
            | Error::Internal { .. }
            | Error::RemoteServiceError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::RemoteTimeout => StatusCode::GATEWAY_TIMEOUT,
            Error::ConfigurationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Error::NotFound {
            resource: resource.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(source: tokio_postgres::Error) -> Self {
        Error::Database { source }
    }
}

impl From<bb8::RunError<tokio_postgres::Error>> for Error {
    fn from(source: bb8::RunError<tokio_postgres::Error>) -> Self {
        Error::Pool { source }
    }
}

/// Wire body for every non-2xx response: `{code, message}`, never a stack
/// trace (spec.md §7).
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> actix_web::http::StatusCode {
        Error::status_code(self)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let body = ErrorBody {
            code: self.kind(),
            message: self.to_string(),
        };
        actix_web::HttpResponse::build(self.status_code()).json(body)
    }
}
