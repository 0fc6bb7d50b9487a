#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;

/// Lifecycle state of a question.
///
/// Never stored: it is derived from which lifecycle timestamps are set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionStatus {
    /// Waiting in the queue.
    Asked,
    /// A staff member is currently helping.
    Active,
    /// Help finished.
    Answered,
    /// The asker left the queue.
    Withdrawn,
    /// Staff removed the question from the queue.
    Rejected,
}

impl QuestionStatus {
    pub const ALL: &'static [QuestionStatus] = &[
        Self::Asked,
        Self::Active,
        Self::Answered,
        Self::Withdrawn,
        Self::Rejected,
    ];

    /// Derive the state from which lifecycle timestamps are present.
    ///
    /// Withdrawal and rejection take precedence over progress markers.
    pub fn derive(started: bool, answered: bool, withdrawn: bool, rejected: bool) -> Self {
        if withdrawn {
            Self::Withdrawn
        } else if rejected {
            Self::Rejected
        } else if answered {
            Self::Answered
        } else if started {
            Self::Active
        } else {
            Self::Asked
        }
    }

    /// Returns true if no further transition is possible.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Answered | Self::Withdrawn | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asked => "ASKED",
            Self::Active => "ACTIVE",
            Self::Answered => "ANSWERED",
            Self::Withdrawn => "WITHDRAWN",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new(
                    "question status",
                    s,
                    &Self::ALL.iter().map(|st| st.as_str()).collect::<Vec<_>>(),
                )
            })
    }
}

/// Why staff rejected a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// The student did not respond when called.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "NOT_HERE"))]
    NotHere,
    /// Office hours ended before the question was reached.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "OH_ENDED"))]
    OhEnded,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "NOT_SPECIFIC"))]
    NotSpecific,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "WRONG_QUEUE"))]
    WrongQueue,
    /// Free-text reason supplied separately.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "OTHER"))]
    Other,
}

impl RejectionReason {
    /// Returns true if this reason must be accompanied by free text.
    pub fn requires_text(&self) -> bool {
        matches!(self, Self::Other)
    }
}
