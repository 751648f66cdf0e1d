//! Strongly-typed record identifiers.
//!
//! Identifiers are opaque strings: clients may supply their own (`"mat_001"`),
//! otherwise a UUIDv7 string is generated.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a material (raw stock, finishing supplies, hardware).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaterialId(String);

/// Identifier of a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PurchaseOrderId(String);

/// Identifier of a goods receipt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GoodsReceiptId(String);

/// Identifier of a sub-assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubAssemblyId(String);

/// Identifier of a project item (the parent of sub-assemblies).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectItemId(String);

/// Identifier of a customer project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SupplierId(String);

/// Identifier of a bill-of-materials line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BomItemId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MachineId(String);

/// Identifier of a production task (one step of one item on the floor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductionLogId(String);

macro_rules! impl_record_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Generate a fresh identifier (UUIDv7, time-ordered).
            ///
            /// Prefer passing IDs explicitly in tests for determinism.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                if value.chars().any(char::is_whitespace) {
                    return Err(DomainError::invalid_id(format!(
                        "{}: contains whitespace",
                        $name
                    )));
                }
                Ok(Self(value))
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_from(s.to_string())
            }
        }
    };
}

impl_record_id!(MaterialId, "MaterialId");
impl_record_id!(PurchaseOrderId, "PurchaseOrderId");
impl_record_id!(GoodsReceiptId, "GoodsReceiptId");
impl_record_id!(SubAssemblyId, "SubAssemblyId");
impl_record_id!(ProjectItemId, "ProjectItemId");
impl_record_id!(ProjectId, "ProjectId");
impl_record_id!(SupplierId, "SupplierId");
impl_record_id!(BomItemId, "BomItemId");
impl_record_id!(MachineId, "MachineId");
impl_record_id!(TaskId, "TaskId");
impl_record_id!(ProductionLogId, "ProductionLogId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_supplied_ids_round_trip_through_json() {
        let id: MaterialId = serde_json::from_str("\"test_mat_001\"").unwrap();
        assert_eq!(id.as_str(), "test_mat_001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"test_mat_001\"");
    }

    #[test]
    fn empty_or_spaced_ids_are_rejected() {
        assert!("".parse::<PurchaseOrderId>().is_err());
        assert!("po 1".parse::<PurchaseOrderId>().is_err());
        assert!(serde_json::from_str::<SubAssemblyId>("\"  \"").is_err());
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(GoodsReceiptId::generate(), GoodsReceiptId::generate());
    }
}
