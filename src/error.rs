use thiserror::Error;

#[derive(Debug, Error)]
pub enum SymnaError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Undefined reference: {0} does not exist")]
    UndefinedReference(String),

    #[error("Unsupported measurement: {kind} is not defined for {device}")]
    UnsupportedMeasurement { kind: String, device: String },

    #[error("Singular system: unable to solve for {0}, the circuit has no unique solution")]
    SingularSystem(String),

    #[error("No unique operating point: {0}")]
    NoUniqueSolution(String),

    #[error("Zero value: {0}")]
    ZeroValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SymnaError>;
