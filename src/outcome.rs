use crate::{Cid, Error, RecordRef};
use serde::{Serialize, Serializer};

const SUCCESS_MESSAGE: &str = "Record created successfully";

/// The single result of a [`publish`][`crate::publish`] run.
///
/// Serializes as `{"success": bool, "message": string}`, with `"cid"` added on success.
#[derive(Clone, Debug, Eq, PartialEq)]
#[must_use]
pub enum Outcome {
    /// The post was created.
    Success {
        /// Human-readable summary.
        message: String,
        /// Content identifier of the new record.
        cid: Option<Cid>,
    },
    /// Nothing was posted.
    Failure {
        /// What went wrong.
        message: String,
    },
}

impl Outcome {
    /// Returns true for [`Outcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The summary or failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message, .. } | Outcome::Failure { message } => message,
        }
    }

    /// The new record's CID, if the post was created.
    #[must_use]
    pub fn cid(&self) -> Option<&Cid> {
        match self {
            Outcome::Success { cid, .. } => cid.as_ref(),
            Outcome::Failure { .. } => None,
        }
    }
}

impl From<Result<RecordRef, Error>> for Outcome {
    fn from(result: Result<RecordRef, Error>) -> Outcome {
        match result {
            Ok(record) => Outcome::Success {
                message: SUCCESS_MESSAGE.into(),
                cid: Some(record.cid),
            },
            Err(err) => Outcome::Failure {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct ApiOutcome<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cid: Option<&'a Cid>,
}

impl Serialize for Outcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ApiOutcome {
            success: self.is_success(),
            message: self.message(),
            cid: self.cid(),
        }
        .serialize(serializer)
    }
}
