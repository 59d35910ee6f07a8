pub mod middleware;
pub mod token;

pub use middleware::{auth_middleware, AuthFailureLimiter, AuthState, CallerContext};
pub use token::{AuthError, TokenService};
