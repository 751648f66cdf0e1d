use core::str::FromStr;

use serde::{Deserialize, Serialize};

use shopfloor_core::error::{require_non_negative, require_non_negative_amount, require_text};
use shopfloor_core::{DomainError, DomainResult, MaterialId};

/// Material category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialCategory {
    Raw,
    Finishing,
    Hardware,
}

impl MaterialCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialCategory::Raw => "RAW",
            MaterialCategory::Finishing => "FINISHING",
            MaterialCategory::Hardware => "HARDWARE",
        }
    }
}

impl FromStr for MaterialCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RAW" => Ok(MaterialCategory::Raw),
            "FINISHING" => Ok(MaterialCategory::Finishing),
            "HARDWARE" => Ok(MaterialCategory::Hardware),
            other => Err(DomainError::validation(format!(
                "category must be one of: RAW, FINISHING, HARDWARE (got {other})"
            ))),
        }
    }
}

/// A stocked material.
///
/// `current_stock` is the running sum of every adjustment ever applied. It is
/// validated as non-negative on direct edits only; stock adjustments are not
/// clamped, so a material can go negative through receipts or manual deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: MaterialId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub current_stock: i64,
    pub safety_stock: i64,
    pub price_per_unit: f64,
    pub category: MaterialCategory,
}

impl Material {
    /// True when stock has fallen under the configured safety level.
    pub fn below_safety_stock(&self) -> bool {
        self.current_stock < self.safety_stock
    }
}

/// Create/replace payload for a material.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDraft {
    #[serde(default)]
    pub id: Option<MaterialId>,
    pub code: String,
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub safety_stock: i64,
    pub price_per_unit: f64,
    pub category: MaterialCategory,
}

impl MaterialDraft {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("code", &self.code)?;
        require_text("name", &self.name)?;
        require_text("unit", &self.unit)?;
        require_non_negative("currentStock", self.current_stock)?;
        require_non_negative("safetyStock", self.safety_stock)?;
        require_non_negative_amount("pricePerUnit", self.price_per_unit)?;
        Ok(())
    }

    /// Validate and turn the draft into a material with the given identity.
    ///
    /// The draft's own `id` is ignored; callers decide between client-supplied,
    /// generated, or path identifiers.
    pub fn into_material(self, id: MaterialId) -> DomainResult<Material> {
        self.validate()?;
        Ok(Material {
            id,
            code: self.code,
            name: self.name,
            unit: self.unit,
            current_stock: self.current_stock,
            safety_stock: self.safety_stock,
            price_per_unit: self.price_per_unit,
            category: self.category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> MaterialDraft {
        MaterialDraft {
            id: None,
            code: "PLT-2MM".to_string(),
            name: "Plate 2mm".to_string(),
            unit: "Sheet".to_string(),
            current_stock: 100,
            safety_stock: 10,
            price_per_unit: 125.5,
            category: MaterialCategory::Raw,
        }
    }

    #[test]
    fn draft_becomes_material_with_given_id() {
        let m = draft().into_material("mat_1".parse().unwrap()).unwrap();
        assert_eq!(m.id.as_str(), "mat_1");
        assert_eq!(m.current_stock, 100);
        assert!(!m.below_safety_stock());
    }

    #[test]
    fn negative_stock_on_direct_edit_is_rejected() {
        let mut d = draft();
        d.current_stock = -1;
        let err = d.into_material(MaterialId::generate()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("currentStock")));
    }

    #[test]
    fn missing_code_is_rejected() {
        let mut d = draft();
        d.code = " ".to_string();
        assert!(d.validate().is_err());
    }

    #[test]
    fn category_uses_upper_case_wire_names() {
        let json = serde_json::to_value(MaterialCategory::Finishing).unwrap();
        assert_eq!(json, "FINISHING");
        assert_eq!("HARDWARE".parse::<MaterialCategory>().unwrap(), MaterialCategory::Hardware);
        assert!("PAINT".parse::<MaterialCategory>().is_err());
    }

    #[test]
    fn below_safety_stock_is_strict() {
        let mut m = draft().into_material(MaterialId::generate()).unwrap();
        m.current_stock = 10;
        assert!(!m.below_safety_stock());
        m.current_stock = -5;
        assert!(m.below_safety_stock());
    }

    #[test]
    fn material_serializes_with_camel_case_fields() {
        let m = draft().into_material("mat_1".parse().unwrap()).unwrap();
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["currentStock"], 100);
        assert_eq!(json["pricePerUnit"], 125.5);
        assert_eq!(json["category"], "RAW");
    }
}
