//! Closed domain enums, stored as lowercase text columns

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Implements string conversions and the sqlx TEXT mapping for a unit enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $slug:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $slug),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($slug => Ok($name::$variant),)+
                    _ => Err(format!(
                        "invalid {} '{}', expected one of: {}",
                        stringify!($name),
                        s,
                        [$($slug),+].join(", ")
                    )),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// VehicleType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Sedan,
    Suv,
    Truck,
    Van,
}

text_enum!(VehicleType {
    Sedan => "sedan",
    Suv => "suv",
    Truck => "truck",
    Van => "van",
});

// ---------------------------------------------------------------------------
// VehicleStatus
// ---------------------------------------------------------------------------

/// Operational status of a vehicle.
///
/// `Assigned` belongs to the assignment lifecycle: it is set when an
/// assignment starts and cleared when it ends, never through a direct edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Assigned,
    Maintenance,
    OutOfService,
}

text_enum!(VehicleStatus {
    Available => "available",
    Assigned => "assigned",
    Maintenance => "maintenance",
    OutOfService => "out_of_service",
});

impl VehicleStatus {
    /// Whether a caller may set this status through a direct edit
    pub fn is_editable(&self) -> bool {
        !matches!(self, VehicleStatus::Assigned)
    }

    /// Maintenance and out-of-service vehicles are grounded
    pub fn is_grounded(&self) -> bool {
        matches!(self, VehicleStatus::Maintenance | VehicleStatus::OutOfService)
    }
}

// ---------------------------------------------------------------------------
// ClientType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    New,
    Existing,
}

text_enum!(ClientType {
    New => "new",
    Existing => "existing",
});

// ---------------------------------------------------------------------------
// AssignmentStatus
// ---------------------------------------------------------------------------

/// Assignment lifecycle state. `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Completed,
    Cancelled,
}

text_enum!(AssignmentStatus {
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl AssignmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AssignmentStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("SUV".parse::<VehicleType>(), Ok(VehicleType::Suv));
        assert_eq!(" Out_Of_Service ".parse::<VehicleStatus>(), Ok(VehicleStatus::OutOfService));
        assert_eq!("existing".parse::<ClientType>(), Ok(ClientType::Existing));
    }

    #[test]
    fn rejects_unknown_values_listing_members() {
        let err = "boat".parse::<VehicleType>().unwrap_err();
        assert!(err.contains("sedan, suv, truck, van"), "{}", err);
    }

    #[test]
    fn serde_names_match_text_column_values() {
        for status in VehicleStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
        for status in AssignmentStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
    }

    #[test]
    fn only_active_is_non_terminal() {
        assert!(!AssignmentStatus::Active.is_terminal());
        assert!(AssignmentStatus::Completed.is_terminal());
        assert!(AssignmentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn assigned_is_not_directly_editable() {
        assert!(!VehicleStatus::Assigned.is_editable());
        assert!(VehicleStatus::Maintenance.is_editable());
        assert!(VehicleStatus::Available.is_editable());
    }
}
