//! External service integrations.

pub mod services {
    pub use crate::services::*;
}

pub mod countries {
    pub use crate::countries::*;
}

pub mod circuit_breaker {
    pub use crate::circuit_breaker::*;
}
