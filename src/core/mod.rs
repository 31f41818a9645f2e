// Scoring pipeline and shared errors/models
pub mod aggregator {
    pub use crate::aggregator::*;
}

pub mod evaluator {
    pub use crate::evaluator::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod normalize {
    pub use crate::normalize::*;
}

pub mod providers {
    pub use crate::providers::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}

pub mod validator {
    pub use crate::validator::*;
}

pub mod errors {
    pub use crate::errors::*;
}
