use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseStepError {
    #[error("unknown application step '{0}'")]
    UnknownStep(String),
}
