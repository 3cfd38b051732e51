use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Transport(String),
    LoadFailed(String),
    Validation(Vec<FieldError>),
    MutationRejected(String),
    InvalidInput(String),
    InvalidData(String),
    Io(String),
}

impl AppError {
    pub fn transport<M: Into<String>>(message: M) -> Self {
        Self::Transport(message.into())
    }

    pub fn load_failed<M: Into<String>>(message: M) -> Self {
        Self::LoadFailed(message.into())
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }

    pub fn mutation_rejected<M: Into<String>>(message: M) -> Self {
        Self::MutationRejected(message.into())
    }

    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::LoadFailed(_) => "load_failed",
            Self::Validation(_) => "validation_error",
            Self::MutationRejected(_) => "mutation_rejected",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Transport(message)
            | Self::LoadFailed(message)
            | Self::MutationRejected(message)
            | Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::Io(message) => message.clone(),
            Self::Validation(errors) => errors
                .iter()
                .map(FieldError::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::{AppError, FieldError};

    #[test]
    fn validation_error_joins_field_messages() {
        let err = AppError::validation(vec![
            FieldError::new("task", "task is required"),
            FieldError::new("dueDate", "due date cannot be in the past"),
        ]);

        assert_eq!(err.code(), "validation_error");
        assert_eq!(
            err.message(),
            "task: task is required; dueDate: due date cannot be in the past"
        );
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = AppError::transport("connection refused");
        assert_eq!(err.to_string(), "transport_error - connection refused");
    }
}
