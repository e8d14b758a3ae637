pub mod config;
pub mod expression;
pub mod host;

pub use config::EngineConfig;
pub use expression::{
    evaluate, AttributeLookup, EvaluationContext, EvaluationError, Expression, ResultType,
    TypedResult, Value,
};
