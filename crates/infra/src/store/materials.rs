use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::MaterialId;
use shopfloor_inventory::{Material, MaterialCategory};

use super::MaterialStore;
use crate::error::{StoreError, StoreResult, corrupt, map_sqlx_error};

const SELECT_MATERIAL: &str = r#"
    SELECT id, code, name, unit, current_stock, safety_stock, price_per_unit, category
    FROM materials
"#;

#[derive(Debug, Clone)]
pub struct SqliteMaterialStore {
    pool: SqlitePool,
}

impl SqliteMaterialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaterialStore for SqliteMaterialStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Material>> {
        let rows = sqlx::query(&format!("{SELECT_MATERIAL} ORDER BY name"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_materials", e))?;

        rows.iter().map(material_from_row).collect()
    }

    #[instrument(skip(self), fields(material_id = %id), err)]
    async fn get(&self, id: &MaterialId) -> StoreResult<Material> {
        let row = sqlx::query(&format!("{SELECT_MATERIAL} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_material", e))?
            .ok_or(StoreError::NotFound("material"))?;

        material_from_row(&row)
    }

    #[instrument(skip(self, material), fields(material_id = %material.id), err)]
    async fn insert(&self, material: &Material) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO materials (
                id, code, name, unit, current_stock, safety_stock, price_per_unit, category
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(material.id.as_str())
        .bind(&material.code)
        .bind(&material.name)
        .bind(&material.unit)
        .bind(material.current_stock)
        .bind(material.safety_stock)
        .bind(material.price_per_unit)
        .bind(material.category.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_material", e))?;
        Ok(())
    }

    #[instrument(skip(self, material), fields(material_id = %material.id), err)]
    async fn update(&self, material: &Material) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE materials
            SET code = ?, name = ?, unit = ?, current_stock = ?, safety_stock = ?,
                price_per_unit = ?, category = ?
            WHERE id = ?
            "#,
        )
        .bind(&material.code)
        .bind(&material.name)
        .bind(&material.unit)
        .bind(material.current_stock)
        .bind(material.safety_stock)
        .bind(material.price_per_unit)
        .bind(material.category.as_str())
        .bind(material.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_material", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("material"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(material_id = %id), err)]
    async fn delete(&self, id: &MaterialId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM materials WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_material", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("material"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(material_id = %id), err)]
    async fn adjust_stock(&self, id: &MaterialId, delta: i64) -> StoreResult<i64> {
        let row = sqlx::query(
            r#"
            UPDATE materials
            SET current_stock = current_stock + ?
            WHERE id = ?
            RETURNING current_stock
            "#,
        )
        .bind(delta)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error("adjust_stock", e) {
            StoreError::Validation(_) => {
                StoreError::Validation(format!("adjusting stock by {delta} overflows currentStock"))
            }
            other => other,
        })?
        .ok_or(StoreError::NotFound("material"))?;

        row.try_get("current_stock")
            .map_err(|e| corrupt("materials.current_stock", e))
    }
}

#[derive(Debug)]
struct MaterialRow {
    id: String,
    code: String,
    name: String,
    unit: String,
    current_stock: i64,
    safety_stock: i64,
    price_per_unit: f64,
    category: String,
}

impl<'r> FromRow<'r, SqliteRow> for MaterialRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(MaterialRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            unit: row.try_get("unit")?,
            current_stock: row.try_get("current_stock")?,
            safety_stock: row.try_get("safety_stock")?,
            price_per_unit: row.try_get("price_per_unit")?,
            category: row.try_get("category")?,
        })
    }
}

fn material_from_row(row: &SqliteRow) -> StoreResult<Material> {
    let row = MaterialRow::from_row(row).map_err(|e| corrupt("materials", e))?;
    Ok(Material {
        id: MaterialId::try_from(row.id).map_err(|e| corrupt("materials.id", e))?,
        code: row.code,
        name: row.name,
        unit: row.unit,
        current_stock: row.current_stock,
        safety_stock: row.safety_stock,
        price_per_unit: row.price_per_unit,
        category: row
            .category
            .parse::<MaterialCategory>()
            .map_err(|e| corrupt("materials.category", e))?,
    })
}
