use axum::Router;

pub mod student;
pub mod system;
pub mod token;

/// Token verification endpoints, mounted under `/api/token`.
pub fn token_router() -> Router {
    token::router()
}

/// Session-protected student endpoints, mounted under `/api/student`.
pub fn student_router() -> Router {
    student::router()
}
