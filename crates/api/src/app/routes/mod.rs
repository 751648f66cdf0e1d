use axum::Router;

pub mod admin;
pub mod bom_items;
pub mod machines;
pub mod materials;
pub mod production_logs;
pub mod project_items;
pub mod projects;
pub mod purchase_orders;
pub mod receiving_goods;
pub mod sub_assemblies;
pub mod suppliers;
pub mod system;
pub mod tasks;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/materials", materials::router())
        .nest("/suppliers", suppliers::router())
        .nest("/purchase-orders", purchase_orders::router())
        .nest("/receiving-goods", receiving_goods::router())
        .nest("/projects", projects::router())
        .nest("/project-items", project_items::router())
        .nest("/bom-items", bom_items::router())
        .nest("/sub-assemblies", sub_assemblies::router())
        .nest("/machines", machines::router())
        .nest("/tasks", tasks::router())
        .nest("/production-logs", production_logs::router())
        .nest("/admin", admin::router())
}
