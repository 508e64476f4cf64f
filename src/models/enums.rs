//! Closed domain enums stored as text columns

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Cover
// ---------------------------------------------------------------------------

/// Book cover type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Cover {
    Hard,
    Soft,
}

impl Cover {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cover::Hard => "Hard",
            Cover::Soft => "Soft",
        }
    }
}

impl std::fmt::Display for Cover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Cover {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hard" => Ok(Cover::Hard),
            "soft" => Ok(Cover::Soft),
            _ => Err(format!("Invalid cover: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for Cover {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Cover {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Cover {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

// ---------------------------------------------------------------------------
// PaymentStatus
// ---------------------------------------------------------------------------

/// Payment lifecycle status
///
/// `Pending` payments are recorded but have no checkout session yet,
/// `InProcess` ones have an open provider session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentStatus {
    Pending,
    InProcess,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::InProcess => "InProcess",
            PaymentStatus::Paid => "Paid",
        }
    }

    /// Whether the payment still blocks its owner from borrowing
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, PaymentStatus::Paid)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "InProcess" | "IN_PROCESS" => Ok(PaymentStatus::InProcess),
            "Paid" | "PAID" => Ok(PaymentStatus::Paid),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for PaymentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for PaymentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for PaymentStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_accepts_only_hard_and_soft() {
        assert_eq!("Hard".parse::<Cover>(), Ok(Cover::Hard));
        assert_eq!("SOFT".parse::<Cover>(), Ok(Cover::Soft));
        assert!("Paperback".parse::<Cover>().is_err());

        let parsed: Result<Cover, _> = serde_json::from_str("\"Spiral\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn only_paid_payments_are_settled() {
        assert!(PaymentStatus::Pending.is_outstanding());
        assert!(PaymentStatus::InProcess.is_outstanding());
        assert!(!PaymentStatus::Paid.is_outstanding());
    }

    #[test]
    fn payment_status_serializes_as_variant_name() {
        let json = serde_json::to_string(&PaymentStatus::InProcess).unwrap();
        assert_eq!(json, "\"InProcess\"");
        assert_eq!("IN_PROCESS".parse::<PaymentStatus>(), Ok(PaymentStatus::InProcess));
    }
}
