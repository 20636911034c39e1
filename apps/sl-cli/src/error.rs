//! Error type for the command-line front-end.

/// Wraps errors from the library crates behind one interface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scenario error: {0}")]
    Scenario(#[from] sl_scenario::ScenarioError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] sl_sim::SimError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] sl_core::CoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
