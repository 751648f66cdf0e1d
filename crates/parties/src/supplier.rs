use serde::{Deserialize, Serialize};

use shopfloor_core::error::require_text;
use shopfloor_core::{DomainResult, SupplierId};

/// A supplier that purchase orders are placed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Free-form contact line (person, phone, e-mail).
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDraft {
    #[serde(default)]
    pub id: Option<SupplierId>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

impl SupplierDraft {
    pub fn into_supplier(self, id: SupplierId) -> DomainResult<Supplier> {
        require_text("name", &self.name)?;
        Ok(Supplier {
            id,
            name: self.name,
            address: blank_to_none(self.address),
            contact: blank_to_none(self.contact),
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfloor_core::DomainError;

    #[test]
    fn supplier_requires_a_name() {
        let draft = SupplierDraft {
            id: None,
            name: "  ".to_string(),
            address: None,
            contact: None,
        };
        assert!(matches!(
            draft.into_supplier(SupplierId::generate()),
            Err(DomainError::Validation(msg)) if msg.contains("name")
        ));
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let json = serde_json::json!({
            "name": "PT Baja Makmur",
            "address": "",
            "contact": "Budi 0812"
        });
        let draft: SupplierDraft = serde_json::from_value(json).unwrap();
        let supplier = draft.into_supplier("sup1".parse().unwrap()).unwrap();

        assert_eq!(supplier.address, None);
        assert_eq!(supplier.contact.as_deref(), Some("Budi 0812"));
        let out = serde_json::to_value(&supplier).unwrap();
        assert_eq!(out["id"], "sup1");
        assert_eq!(out["name"], "PT Baja Makmur");
    }
}
