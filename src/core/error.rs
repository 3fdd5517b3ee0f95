use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("For {ages} ages there must be exactly {expected} salaries, not {salaries}", expected = .ages.saturating_sub(1))]
    ShapeMismatch { ages: usize, salaries: usize },

    #[error("Growth rate is zero in {context}; the closed-form solution divides by it")]
    DivisionUndefined { context: String },

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },
}

impl ProjectionError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub(crate) fn ensure_finite(field: &str, value: f64) -> ProjectionResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::invalid(field, "must be a finite number"))
    }
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;
