//! HTTP status codes as a typed enum.
//!
//! Only the codes the functions actually answer with are listed. A status of
//! 400 or above marks the response as an error, and the chain runner halts on
//! it (see [`Chain::run`](crate::Chain::run)).
//!
//! ```rust
//! use quill::Status;
//!
//! assert_eq!(u16::from(Status::NoContent), 204);
//! assert!(Status::NotFound.is_error());
//! assert!(!Status::Ok.is_error());
//! ```

/// A response status.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    Ok,                  // 200
    NoContent,           // 204
    BadRequest,          // 400
    NotFound,            // 404
    MethodNotAllowed,    // 405
    InternalServerError, // 500
}

impl Status {
    /// Numeric code, e.g. `404`.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                  => 200,
            Self::NoContent           => 204,
            Self::BadRequest          => 400,
            Self::NotFound            => 404,
            Self::MethodNotAllowed    => 405,
            Self::InternalServerError => 500,
        }
    }

    /// `true` for 4xx and 5xx.
    pub fn is_error(self) -> bool {
        self.code() >= 400
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes() {
        assert!(!Status::Ok.is_error());
        assert!(!Status::NoContent.is_error());
        assert!(Status::BadRequest.is_error());
        assert!(Status::MethodNotAllowed.is_error());
        assert!(Status::InternalServerError.is_error());
    }
}
