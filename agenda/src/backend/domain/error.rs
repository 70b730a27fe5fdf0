//! Error taxonomy of the agenda domain.
//!
//! Remote failures carry the collaborator's raw error text so screens can
//! show it verbatim. None of them is retried and none is fatal.

/// Client-side validation failures; raised before any remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Por favor, selecione um cliente.")]
    MissingClient,
    #[error("Por favor, selecione uma data.")]
    MissingDate,
    #[error("Por favor, selecione uma hora.")]
    MissingTime,
    #[error("Por favor, selecione um profissional.")]
    MissingProfessional,
    #[error("Por favor, preencha todos os campos.")]
    MissingClientFields,
    #[error("Informe seu e-mail.")]
    MissingEmail,
    #[error("Hora inválida: {0}")]
    InvalidTime(String),
    #[error("Data inválida: {0}")]
    InvalidDate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgendaError {
    #[error("{0}")]
    RemoteFetch(String),
    /// Insert, update, delete or upload rejected
    #[error("{0}")]
    RemoteWrite(String),
    #[error("{0}")]
    RemoteSubscribe(String),
    /// Sign-in, sign-out or password reset rejected
    #[error("{0}")]
    RemoteAuth(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Nenhum usuário autenticado.")]
    NoSession,
}

fn raw_text(error: &anyhow::Error) -> String {
    format!("{:#}", error)
}

impl AgendaError {
    pub fn fetch(error: anyhow::Error) -> Self {
        AgendaError::RemoteFetch(raw_text(&error))
    }

    pub fn write(error: anyhow::Error) -> Self {
        AgendaError::RemoteWrite(raw_text(&error))
    }

    pub fn subscribe(error: anyhow::Error) -> Self {
        AgendaError::RemoteSubscribe(raw_text(&error))
    }

    pub fn auth(error: anyhow::Error) -> Self {
        AgendaError::RemoteAuth(raw_text(&error))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AgendaError::Validation(_))
    }
}

pub type AgendaResult<T> = Result<T, AgendaError>;
