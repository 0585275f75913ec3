use crate::ledger::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Discord API error: {0}")]
    Discord(#[from] Box<serenity::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<serenity::Error> for Error {
    fn from(err: serenity::Error) -> Self {
        Error::Discord(Box::new(err))
    }
}

impl Error {
    /// True for transfers the ledger refused. These are the user's mistake,
    /// not an outage, and don't need to be logged as errors.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Ledger(LedgerError::Rejected(_)))
    }

    pub fn user_message(&self) -> String {
        match self {
            Error::Discord(_) => "Failed to communicate with Discord. Please try again.".into(),
            Error::Config(msg) => msg.clone(),
            Error::Ledger(LedgerError::Rejected(rejection)) => rejection.to_string(),
            Error::Ledger(_) => {
                "The cookie jar is stuck. Please try again later.".into()
            }
        }
    }
}
