use reqwest::StatusCode;
use serde_json::{Value, json};

use shopfloor_api::app::{build_app, services::AppServices};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, fresh in-memory database, ephemeral port.
        let services = AppServices::in_memory()
            .await
            .expect("failed to open in-memory database");
        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> StatusCode {
        self.client.delete(self.url(path)).send().await.unwrap().status()
    }

    async fn seed_material(&self, id: &str, code: &str, name: &str, stock: i64) {
        let (status, _) = self
            .post(
                "/api/materials",
                json!({
                    "id": id,
                    "code": code,
                    "name": name,
                    "unit": "Pcs",
                    "currentStock": stock,
                    "safetyStock": 10,
                    "pricePerUnit": 10.0,
                    "category": "RAW"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn ensure_supplier(&self, id: &str) {
        if self.get(&format!("/api/suppliers/{id}")).await.0 == StatusCode::OK {
            return;
        }
        let (status, _) = self
            .post("/api/suppliers", json!({ "id": id, "name": format!("Supplier {id}") }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    /// Project item under project `prj1` plus material `mat1`, both created on
    /// first use.
    async fn seed_item(&self, id: &str) {
        if self.get("/api/projects/prj1").await.0 != StatusCode::OK {
            let (status, _) = self
                .post(
                    "/api/projects",
                    json!({
                        "id": "prj1",
                        "code": "PRJ-001",
                        "name": "Rak Gudang",
                        "customer": "PT Sinar",
                        "startDate": "2024-03-01",
                        "deadline": "2024-06-30",
                        "qtyPerUnit": 1,
                        "procurementQty": 0,
                        "totalQty": 10,
                        "unit": "Set"
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        if self.get("/api/materials/mat1").await.0 != StatusCode::OK {
            self.seed_material("mat1", "PLT-01", "Plate", 0).await;
        }
        let (status, _) = self
            .post(
                "/api/project-items",
                json!({
                    "id": id,
                    "projectId": "prj1",
                    "name": format!("Item {id}"),
                    "qtySet": 1,
                    "quantity": 10,
                    "unit": "Pcs"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn seed_order(&self, id: &str, items: Value) {
        self.ensure_supplier("sup1").await;
        let (status, _) = self
            .post(
                "/api/purchase-orders",
                json!({
                    "id": id,
                    "code": format!("PO-{id}"),
                    "date": "2024-03-01",
                    "supplierId": "sup1",
                    "items": items
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn stock_of(&self, id: &str) -> i64 {
        let (status, body) = self.get(&format!("/api/materials/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        body["currentStock"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn receipt_matched_by_id_adds_received_qty() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m1", "STL-01", "Steel Plate", 100).await;
    srv.seed_order(
        "po1",
        json!([{ "materialId": "m1", "materialName": "Steel Plate", "materialCode": "STL-01", "qty": 50, "unitPrice": 10.0 }]),
    )
    .await;

    let (status, body) = srv
        .post(
            "/api/receiving-goods",
            json!({
                "code": "GR-001",
                "date": "2024-03-05",
                "poId": "po1",
                "items": [{ "materialId": "m1", "receivedQty": 30 }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["poId"], "po1");
    assert_eq!(body["reconciliation"]["applied"][0]["resultingStock"], 130);
    assert_eq!(srv.stock_of("m1").await, 130);
}

#[tokio::test]
async fn receipt_matched_by_code_uses_qty() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m2", "BLT-08", "Bolt", 0).await;
    srv.seed_order(
        "po1",
        json!([{ "materialId": "m2", "materialCode": "BLT-08", "qty": 100, "unitPrice": 0.5 }]),
    )
    .await;

    let (status, body) = srv
        .post(
            "/api/receiving-goods",
            json!({
                "code": "GR-002",
                "date": "2024-03-05",
                "poId": "po1",
                "items": [{ "materialCode": "BLT-08", "qty": 10 }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["reconciliation"]["applied"][0]["matchedBy"], "materialCode");
    assert_eq!(srv.stock_of("m2").await, 10);
}

#[tokio::test]
async fn unmatched_line_is_skipped_but_receipt_is_kept() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m1", "STL-01", "Steel Plate", 100).await;
    srv.seed_material("m9", "ODD-99", "Odd", 7).await;
    srv.seed_order("po1", json!([{ "materialId": "m1", "qty": 50, "unitPrice": 10.0 }]))
        .await;

    let (status, body) = srv
        .post(
            "/api/receiving-goods",
            json!({
                "id": "gr1",
                "code": "GR-003",
                "date": "2024-03-05",
                "poId": "po1",
                "items": [{ "materialId": "m9", "receivedQty": 5 }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["reconciliation"]["unmatched"][0]["lineIndex"], 0);
    assert_eq!(srv.stock_of("m9").await, 7);
    assert_eq!(srv.stock_of("m1").await, 100);

    let (status, stored) = srv.get("/api/receiving-goods/gr1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["code"], "GR-003");
}

#[tokio::test]
async fn receipt_for_unknown_order_is_404_and_stock_untouched() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m1", "STL-01", "Steel Plate", 100).await;

    let (status, body) = srv
        .post(
            "/api/receiving-goods",
            json!({
                "code": "GR-404",
                "date": "2024-03-05",
                "poId": "po404",
                "items": [{ "materialId": "m1", "receivedQty": 5 }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(srv.stock_of("m1").await, 100);
}

#[tokio::test]
async fn receipt_edit_and_delete_leave_stock_alone() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m1", "STL-01", "Steel Plate", 0).await;
    srv.seed_order("po1", json!([{ "materialId": "m1", "qty": 50, "unitPrice": 10.0 }]))
        .await;

    let receipt = json!({
        "id": "gr1",
        "code": "GR-001",
        "date": "2024-03-05",
        "poId": "po1",
        "items": [{ "materialId": "m1", "receivedQty": 20 }]
    });
    srv.post("/api/receiving-goods", receipt).await;
    assert_eq!(srv.stock_of("m1").await, 20);

    let (status, _) = srv
        .put(
            "/api/receiving-goods/gr1",
            json!({
                "code": "GR-001",
                "date": "2024-03-05",
                "poId": "po1",
                "items": [{ "materialId": "m1", "receivedQty": 99 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(srv.stock_of("m1").await, 20);

    assert_eq!(srv.delete("/api/receiving-goods/gr1").await, StatusCode::NO_CONTENT);
    assert_eq!(srv.stock_of("m1").await, 20);
}

#[tokio::test]
async fn empty_receipt_is_rejected() {
    let srv = TestServer::spawn().await;
    srv.seed_order("po1", json!([])).await;

    let (status, body) = srv
        .post(
            "/api/receiving-goods",
            json!({ "code": "GR-0", "date": "2024-03-05", "poId": "po1", "items": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn manual_adjust_stock_applies_delta() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m1", "STL-01", "Steel Plate", 12).await;

    let (status, body) = srv
        .put("/api/materials/m1/adjust-stock", json!({ "amount": -5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStock"], 7);
    assert_eq!(body["belowSafetyStock"], true);

    let (status, _) = srv
        .put("/api/materials/missing/adjust-stock", json!({ "amount": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv
        .put("/api/materials/m1/adjust-stock", json!({ "amount": "lots" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn material_validation_and_conflicts() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m1", "STL-01", "Steel Plate", 0).await;

    let (status, _) = srv
        .post(
            "/api/materials",
            json!({ "code": "STL-01", "name": "Dup", "unit": "Pcs", "pricePerUnit": 1.0, "category": "RAW" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = srv
        .post(
            "/api/materials",
            json!({ "code": "X", "name": "Bad", "unit": "Pcs", "pricePerUnit": 1.0, "category": "PLASTIC" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv
        .post(
            "/api/materials",
            json!({ "code": "Y", "name": "Neg", "unit": "Pcs", "safetyStock": -1, "pricePerUnit": 1.0, "category": "RAW" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn purchase_order_defaults_totals_and_blocks_delete_with_receipts() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m1", "STL-01", "Steel Plate", 0).await;
    srv.seed_order("po1", json!([{ "materialId": "m1", "qty": 4, "unitPrice": 2.5 }]))
        .await;

    let (status, body) = srv.get("/api/purchase-orders/po1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grandTotal"], 10.0);
    assert_eq!(body["status"], "OPEN");

    srv.post(
        "/api/receiving-goods",
        json!({ "code": "GR-1", "date": "2024-03-05", "poId": "po1", "items": [{ "materialId": "m1", "qty": 1 }] }),
    )
    .await;
    assert_eq!(srv.delete("/api/purchase-orders/po1").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn sub_assembly_creation_seeds_first_step() {
    let srv = TestServer::spawn().await;
    srv.seed_item("item1").await;

    let (status, body) = srv
        .post(
            "/api/sub-assemblies",
            json!({
                "id": "sa1",
                "itemId": "item1",
                "materialId": "mat1",
                "name": "Frame",
                "qtyPerParent": 2,
                "totalNeeded": 200,
                "processes": ["POTONG", "PLONG"]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["stepStats"],
        json!({
            "POTONG": { "produced": 0, "available": 200 },
            "PLONG": { "produced": 0, "available": 0 }
        })
    );
    assert_eq!(body["isLocked"], false);
}

#[tokio::test]
async fn sub_assembly_update_preserves_progress_and_adds_steps() {
    let srv = TestServer::spawn().await;
    srv.seed_item("item1").await;
    srv.post(
        "/api/sub-assemblies",
        json!({
            "id": "sa1",
            "itemId": "item1",
            "materialId": "mat1",
            "name": "Frame",
            "qtyPerParent": 2,
            "totalNeeded": 200,
            "processes": ["POTONG"],
            "stepStats": { "POTONG": { "produced": 50, "available": 150 } }
        }),
    )
    .await;

    // Creation re-seeds POTONG.available; record progress explicitly.
    srv.put(
        "/api/sub-assemblies/sa1",
        json!({
            "itemId": "item1",
            "materialId": "mat1",
            "name": "Frame",
            "qtyPerParent": 2,
            "totalNeeded": 200,
            "stepStats": { "POTONG": { "produced": 50, "available": 150 } }
        }),
    )
    .await;

    let (status, body) = srv
        .put(
            "/api/sub-assemblies/sa1",
            json!({
                "itemId": "item1",
                "materialId": "mat1",
                "name": "Frame",
                "qtyPerParent": 2,
                "totalNeeded": 200,
                "processes": ["POTONG", "PLONG"]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["stepStats"],
        json!({
            "POTONG": { "produced": 50, "available": 150 },
            "PLONG": { "produced": 0, "available": 0 }
        })
    );

    let (_, reread) = srv.get("/api/sub-assemblies/sa1").await;
    assert_eq!(reread["stepStats"], body["stepStats"]);
}

#[tokio::test]
async fn unknown_process_step_is_rejected() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv
        .post(
            "/api/sub-assemblies",
            json!({
                "itemId": "item1",
                "materialId": "mat1",
                "name": "Frame",
                "qtyPerParent": 1,
                "totalNeeded": 10,
                "processes": ["POTONG", "GRINDING"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn lock_by_item_and_listing() {
    let srv = TestServer::spawn().await;
    for item in ["item1", "item2", "item3"] {
        srv.seed_item(item).await;
    }
    for (id, item) in [("sa1", "item1"), ("sa2", "item1"), ("sa3", "item2")] {
        srv.post(
            "/api/sub-assemblies",
            json!({
                "id": id,
                "itemId": item,
                "materialId": "mat1",
                "name": format!("Part {id}"),
                "qtyPerParent": 1,
                "totalNeeded": 10,
                "processes": ["LAS"]
            }),
        )
        .await;
    }

    let (status, body) = srv
        .put("/api/sub-assemblies/item/item1/lock", json!({ "isLocked": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(body["subAssemblies"]
        .as_array()
        .unwrap()
        .iter()
        .all(|sa| sa["isLocked"] == true));

    let (_, item2) = srv.get("/api/sub-assemblies/item/item2").await;
    assert_eq!(item2[0]["isLocked"], false);

    let (status, body) = srv
        .put("/api/sub-assemblies/item/none/lock", json!({ "isLocked": true }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    // Existing item that simply has no sub-assemblies.
    let (status, body) = srv
        .put("/api/sub-assemblies/item/item3/lock", json!({ "isLocked": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["subAssemblies"], json!([]));

    let (status, _) = srv.get("/api/sub-assemblies/item/none").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv
        .put("/api/sub-assemblies/item/item1/lock", json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn backfill_reseeds_first_step() {
    let srv = TestServer::spawn().await;
    srv.seed_item("item1").await;
    srv.post(
        "/api/sub-assemblies",
        json!({
            "id": "sa1",
            "itemId": "item1",
            "materialId": "mat1",
            "name": "Frame",
            "qtyPerParent": 1,
            "totalNeeded": 10,
            "processes": ["CAT", "PACKING"]
        }),
    )
    .await;
    srv.put(
        "/api/sub-assemblies/sa1",
        json!({
            "itemId": "item1",
            "materialId": "mat1",
            "name": "Frame",
            "qtyPerParent": 1,
            "totalNeeded": 25,
            "stepStats": { "CAT": { "produced": 3, "available": 0 } }
        }),
    )
    .await;

    let (status, body) = srv
        .post("/api/admin/sub-assemblies/backfill-step-stats", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rewritten"], 1);

    let (_, sa) = srv.get("/api/sub-assemblies/sa1").await;
    assert_eq!(sa["stepStats"]["CAT"], json!({ "produced": 3, "available": 25 }));
    assert_eq!(sa["stepStats"]["PACKING"], json!({ "produced": 0, "available": 0 }));
}

#[tokio::test]
async fn sub_assembly_delete_then_get_is_404() {
    let srv = TestServer::spawn().await;
    srv.seed_item("item1").await;
    srv.post(
        "/api/sub-assemblies",
        json!({ "id": "sa1", "itemId": "item1", "materialId": "mat1", "name": "Frame", "qtyPerParent": 1, "totalNeeded": 1 }),
    )
    .await;

    assert_eq!(srv.delete("/api/sub-assemblies/sa1").await, StatusCode::NO_CONTENT);
    let (status, _) = srv.get("/api/sub-assemblies/sa1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn adjust_stock_overflow_is_rejected_and_stock_kept() {
    let srv = TestServer::spawn().await;
    srv.seed_material("m1", "STL-01", "Steel Plate", 100).await;

    let (status, body) = srv
        .put("/api/materials/m1/adjust-stock", json!({ "amount": i64::MAX }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(srv.stock_of("m1").await, 100);
}

#[tokio::test]
async fn sub_assembly_requires_existing_item_and_material() {
    let srv = TestServer::spawn().await;
    srv.seed_item("item1").await;

    let (status, body) = srv
        .post(
            "/api/sub-assemblies",
            json!({ "itemId": "item1", "name": "Frame", "qtyPerParent": 1, "totalNeeded": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");

    let (status, body) = srv
        .post(
            "/api/sub-assemblies",
            json!({ "itemId": "item9", "materialId": "mat1", "name": "Frame", "qtyPerParent": 1, "totalNeeded": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv
        .post(
            "/api/sub-assemblies",
            json!({ "itemId": "item1", "materialId": "mat9", "name": "Frame", "qtyPerParent": 1, "totalNeeded": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn purchase_order_needs_a_known_supplier_and_pins_it() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post(
            "/api/purchase-orders",
            json!({ "code": "PO-X", "date": "2024-03-01", "supplierId": "ghost", "items": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    srv.seed_order("po1", json!([])).await;
    assert_eq!(srv.delete("/api/suppliers/sup1").await, StatusCode::CONFLICT);

    let (status, list) = srv.get("/api/suppliers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], "sup1");
}

#[tokio::test]
async fn supplier_crud() {
    let srv = TestServer::spawn().await;

    let (status, created) = srv
        .post("/api/suppliers", json!({ "name": "PT Baja Makmur", "contact": "Budi" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = srv
        .put(
            &format!("/api/suppliers/{id}"),
            json!({ "name": "PT Baja Makmur", "address": "Jl. Industri 4" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["address"], "Jl. Industri 4");

    let (status, _) = srv.post("/api/suppliers", json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(srv.delete(&format!("/api/suppliers/{id}")).await, StatusCode::NO_CONTENT);
    let (status, _) = srv.get(&format!("/api/suppliers/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn project_items_list_by_project() {
    let srv = TestServer::spawn().await;
    srv.seed_item("item1").await;
    srv.seed_item("item2").await;

    let (status, items) = srv.get("/api/project-items/project/prj1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items.as_array().unwrap().len(), 2);
    assert_eq!(items[0]["flowType"], "NEW");

    let (status, _) = srv.get("/api/project-items/project/prj9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = srv
        .post(
            "/api/project-items",
            json!({ "projectId": "prj9", "name": "Orphan", "qtySet": 1, "quantity": 1, "unit": "Pcs" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    assert_eq!(srv.delete("/api/projects/prj1").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn project_progress_must_be_a_percentage() {
    let srv = TestServer::spawn().await;
    let (status, _) = srv
        .post(
            "/api/projects",
            json!({
                "code": "PRJ-9",
                "name": "Over",
                "customer": "C",
                "startDate": "2024-03-01",
                "deadline": "2024-04-01",
                "progress": 140,
                "qtyPerUnit": 1,
                "procurementQty": 0,
                "totalQty": 1,
                "unit": "Set"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bom_lines_hang_off_items() {
    let srv = TestServer::spawn().await;
    srv.seed_item("item1").await;

    let (status, line) = srv
        .post(
            "/api/bom-items",
            json!({ "itemId": "item1", "materialId": "mat1", "quantityPerUnit": 4, "totalRequired": 40 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(line["allocated"], 0);

    let (status, lines) = srv.get("/api/bom-items/item/item1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lines[0]["materialId"], "mat1");

    let (status, _) = srv.get("/api/bom-items/item/item9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn machine_maintenance_toggles() {
    let srv = TestServer::spawn().await;
    let (status, machine) = srv
        .post(
            "/api/machines",
            json!({ "id": "mc1", "code": "LAS-01", "name": "Las 1", "type": "LAS", "capacityPerHour": 40 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(machine["isMaintenance"], false);
    assert_eq!(machine["status"], "IDLE");

    let (status, toggled) = srv.put("/api/machines/mc1/toggle-maintenance", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["isMaintenance"], true);

    let (_, again) = srv.put("/api/machines/mc1/toggle-maintenance", json!({})).await;
    assert_eq!(again["isMaintenance"], false);

    let (status, _) = srv.put("/api/machines/mc9/toggle-maintenance", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tasks_and_production_logs() {
    let srv = TestServer::spawn().await;
    srv.seed_item("item1").await;

    let (status, task) = srv
        .post(
            "/api/tasks",
            json!({
                "id": "t1",
                "projectId": "prj1",
                "projectName": "Rak Gudang",
                "itemId": "item1",
                "itemName": "Item item1",
                "step": "LAS",
                "targetQty": 100
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], "PENDING");

    let (status, log) = srv
        .post(
            "/api/production-logs",
            json!({
                "id": "l1",
                "taskId": "t1",
                "itemId": "item1",
                "projectId": "prj1",
                "step": "LAS",
                "shift": "SHIFT_1",
                "goodQty": 30,
                "defectQty": 1,
                "operator": "Andi",
                "type": "OUTPUT"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let recorded_at = log["timestamp"].clone();

    let (status, edited) = srv
        .put(
            "/api/production-logs/l1",
            json!({
                "taskId": "t1",
                "itemId": "item1",
                "projectId": "prj1",
                "step": "LAS",
                "shift": "SHIFT_2",
                "goodQty": 28,
                "operator": "Andi",
                "type": "OUTPUT"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["timestamp"], recorded_at);

    // The log is a journal; the task keeps its own counters.
    let (_, task) = srv.get("/api/tasks/t1").await;
    assert_eq!(task["completedQty"], 0);

    let (status, logs) = srv.get("/api/production-logs/task/t1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs[0]["shift"], "SHIFT_2");

    let (status, tasks) = srv.get("/api/tasks/item/item1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    assert_eq!(srv.delete("/api/tasks/t1").await, StatusCode::CONFLICT);
    let (status, _) = srv.get("/api/production-logs/task/t9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
