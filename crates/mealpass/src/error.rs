use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 核销被拒绝的原因，按检查顺序排列
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    #[error("member has no subscription")]
    NoSubscription,
    #[error("subscription has expired")]
    Expired,
    #[error("all meal credits have been used")]
    Exhausted,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("No member matches scan token {0:?}")]
    IdentityNotFound(String),
    #[error("Unrecognized plan or diet value: {0:?}")]
    InvalidPlan(String),
    #[error("Invalid duration: {0} days")]
    InvalidDuration(i64),
    #[error("Invalid member details: {0}")]
    InvalidMember(&'static str),
    #[error("Unrecognized meal type: {0:?}")]
    InvalidMealType(String),
    #[error("Phone number {0} is already registered")]
    DuplicatePhone(String),
    #[error("Redemption denied: {0}")]
    Denied(#[from] Denial),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<native_db::db_type::Error> for Error {
    fn from(e: native_db::db_type::Error) -> Self {
        Error::PersistenceFailure(Box::new(e))
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ErrorKind {
    IdentityNotFound,
    InvalidPlan,
    InvalidDuration,
    InvalidMember,
    InvalidMealType,
    DuplicatePhone,
    NoSubscription,
    Expired,
    Exhausted,
    PersistenceFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IdentityNotFound(_) => ErrorKind::IdentityNotFound,
            Error::InvalidPlan(_) => ErrorKind::InvalidPlan,
            Error::InvalidDuration(_) => ErrorKind::InvalidDuration,
            Error::InvalidMember(_) => ErrorKind::InvalidMember,
            Error::InvalidMealType(_) => ErrorKind::InvalidMealType,
            Error::DuplicatePhone(_) => ErrorKind::DuplicatePhone,
            Error::Denied(Denial::NoSubscription) => ErrorKind::NoSubscription,
            Error::Denied(Denial::Expired) => ErrorKind::Expired,
            Error::Denied(Denial::Exhausted) => ErrorKind::Exhausted,
            Error::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
        }
    }

    pub fn denial(&self) -> Option<Denial> {
        match self {
            Error::Denied(denial) => Some(*denial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_denial() {
        assert_eq!(Error::from(Denial::Expired).kind(), ErrorKind::Expired);
        assert_eq!(Error::from(Denial::Exhausted).denial(), Some(Denial::Exhausted));
        assert_eq!(Error::InvalidDuration(0).denial(), None);
        assert_eq!(
            serde_json::to_string(&ErrorKind::IdentityNotFound).unwrap(),
            r#""IdentityNotFound""#
        );
    }
}
