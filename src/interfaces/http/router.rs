//! API router

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::modules::{
    customers, dashboard, events, health, metrics as metrics_module, orders, pcs,
    request_id::request_id_middleware, sessions,
};
use crate::application::services::{
    CustomerService, DashboardService, ExpiryMonitor, OrderWorkflow, ResourcePool, SessionManager,
};
use crate::notifications::SharedEventBus;

/// Everything the HTTP layer needs, built once at startup.
#[derive(Clone)]
pub struct ApiContext {
    pub db: DatabaseConnection,
    pub event_bus: SharedEventBus,
    pub pool: Arc<ResourcePool>,
    pub customers: Arc<CustomerService>,
    pub sessions: Arc<SessionManager>,
    pub monitor: Arc<ExpiryMonitor>,
    pub orders: Arc<OrderWorkflow>,
    pub dashboard: Arc<DashboardService>,
    pub prometheus: PrometheusHandle,
}

pub fn create_api_router(ctx: ApiContext) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            db: ctx.db.clone(),
            pool: ctx.pool.clone(),
            started_at: Arc::new(Instant::now()),
        });

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_module::prometheus_metrics))
        .with_state(metrics_module::MetricsState {
            handle: ctx.prometheus.clone(),
        });

    let event_routes = Router::new()
        .route("/api/v1/events", get(events::event_stream))
        .with_state(events::EventStreamState {
            event_bus: ctx.event_bus.clone(),
        });

    let pc_routes = Router::new()
        .route("/api/v1/pcs", get(pcs::list_pcs).post(pcs::register_pc))
        .route("/api/v1/pcs/available", get(pcs::list_available_pcs))
        .route("/api/v1/pcs/{id}", get(pcs::get_pc))
        .route(
            "/api/v1/pcs/{id}/maintenance",
            post(pcs::set_maintenance).delete(pcs::clear_maintenance),
        )
        .route("/api/v1/pcs/{id}/session", get(pcs::get_pc_session))
        .with_state(pcs::PcState {
            pool: ctx.pool.clone(),
            sessions: ctx.sessions.clone(),
        });

    let customer_routes = Router::new()
        .route("/api/v1/customers", post(customers::register_customer))
        .route("/api/v1/customers/lookup", get(customers::lookup_customer))
        .route("/api/v1/customers/{id}", get(customers::get_customer))
        .route(
            "/api/v1/customers/{id}/session",
            get(customers::get_customer_session),
        )
        .with_state(customers::CustomerState {
            customers: ctx.customers.clone(),
            sessions: ctx.sessions.clone(),
        });

    let session_routes = Router::new()
        .route(
            "/api/v1/sessions",
            get(sessions::list_sessions).post(sessions::start_session),
        )
        .route("/api/v1/sessions/{id}", get(sessions::get_session))
        .route("/api/v1/sessions/{id}/extend", post(sessions::extend_session))
        .route("/api/v1/sessions/{id}/pause", post(sessions::pause_session))
        .route("/api/v1/sessions/{id}/resume", post(sessions::resume_session))
        .route(
            "/api/v1/sessions/{id}/terminate",
            post(sessions::terminate_session),
        )
        .route(
            "/api/v1/sessions/{id}/complete",
            post(sessions::complete_session),
        )
        .route("/api/v1/sessions/{id}/poll", get(sessions::poll_session))
        .with_state(sessions::SessionState {
            sessions: ctx.sessions.clone(),
            monitor: ctx.monitor.clone(),
        });

    let order_routes = Router::new()
        .route("/api/v1/menu", get(orders::get_menu))
        .route("/api/v1/menu/{id}", patch(orders::update_menu_item))
        .route(
            "/api/v1/sessions/{id}/orders",
            get(orders::list_session_orders).post(orders::create_order),
        )
        .route("/api/v1/orders/pending", get(orders::pending_orders))
        .route("/api/v1/orders/{id}", get(orders::get_order))
        .route("/api/v1/orders/{id}/advance", post(orders::advance_order))
        .route("/api/v1/orders/{id}/cancel", post(orders::cancel_order))
        .route("/api/v1/orders/{id}/items", put(orders::replace_order_items))
        .with_state(orders::OrderState {
            orders: ctx.orders.clone(),
        });

    let dashboard_routes = Router::new()
        .route("/api/v1/dashboard", get(dashboard::get_dashboard))
        .with_state(dashboard::DashboardState {
            dashboard: ctx.dashboard.clone(),
        });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health_routes)
        .merge(metrics_routes)
        .merge(event_routes)
        .merge(pc_routes)
        .merge(customer_routes)
        .merge(session_routes)
        .merge(order_routes)
        .merge(dashboard_routes)
        .layer(middleware::from_fn(metrics_module::http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::catalog::{ItemExtra, MenuCategory, MenuItem};
    use crate::domain::pc::Pc;
    use crate::domain::pricing::{BillingCalculator, PricingTable};
    use crate::domain::RepositoryProvider;
    use crate::infrastructure::database::{memory_db, SeaOrmRepositoryProvider};
    use crate::notifications::create_event_bus;

    struct TestApi {
        router: Router,
        pc_id: i32,
        burger_id: i32,
        cheese_id: i32,
    }

    async fn api() -> TestApi {
        let db = memory_db().await;
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let pc_id = repos.pcs().save(Pc::new(1, None)).await.unwrap().id;
        let burger = repos
            .catalog()
            .save_item(MenuItem::new("Burger", MenuCategory::Food, 599))
            .await
            .unwrap();
        let cheese = repos
            .catalog()
            .save_extra(ItemExtra::new(burger.id, "Cheese", 100))
            .await
            .unwrap();

        let event_bus = create_event_bus();
        let billing = BillingCalculator::new(PricingTable::default()).unwrap();
        let pool = Arc::new(ResourcePool::new(repos.clone(), event_bus.clone()));
        let sessions = Arc::new(SessionManager::new(
            repos.clone(),
            pool.clone(),
            billing,
            event_bus.clone(),
        ));
        let ctx = ApiContext {
            db,
            event_bus: event_bus.clone(),
            pool,
            customers: Arc::new(CustomerService::new(repos.clone())),
            monitor: Arc::new(ExpiryMonitor::new(sessions.clone(), event_bus.clone())),
            sessions,
            orders: Arc::new(OrderWorkflow::new(repos.clone(), event_bus.clone())),
            dashboard: Arc::new(DashboardService::new(repos.clone())),
            prometheus: PrometheusBuilder::new().build_recorder().handle(),
        };
        TestApi {
            router: create_api_router(ctx),
            pc_id,
            burger_id: burger.id,
            cheese_id: cheese.id,
        }
    }

    async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register_customer(router: &Router) -> i64 {
        let (status, body) = call(
            router,
            "POST",
            "/api/v1/customers",
            Some(json!({"name": "Sara", "civil_id": "290010100001", "phone": "55500000"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let t = api().await;
        let (status, body) = call(&t.router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["pcs_available"], 1);
    }

    #[tokio::test]
    async fn rental_flow_over_http() {
        let t = api().await;
        let user_id = register_customer(&t.router).await;

        let (status, body) = call(
            &t.router,
            "POST",
            "/api/v1/sessions",
            Some(json!({
                "user_id": user_id,
                "pc_id": t.pc_id,
                "duration_minutes": 60,
                "payment_method": "Apple Pay"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["payment_amount"], 500);
        assert_eq!(body["data"]["payment_display"], "5.00 USD");
        assert_eq!(body["data"]["payment_method"], "apple_pay");
        let session_id = body["data"]["id"].as_i64().unwrap();

        // Same PC again
        let (status, body) = call(
            &t.router,
            "POST",
            "/api/v1/sessions",
            Some(json!({
                "user_id": user_id,
                "pc_id": t.pc_id,
                "duration_minutes": 60,
                "payment_method": "cash"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (status, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/extend", session_id),
            Some(json!({"extra_minutes": 60, "payment_method": "knet"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["duration_minutes"], 120);
        assert_eq!(body["data"]["payment_amount"], 1000);

        let (_, body) = call(
            &t.router,
            "GET",
            &format!("/api/v1/pcs/{}/session", t.pc_id),
            None,
        )
        .await;
        assert_eq!(body["data"]["id"], session_id);

        let (status, body) = call(
            &t.router,
            "GET",
            &format!("/api/v1/sessions/{}/poll", session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["remaining_seconds"].as_i64().unwrap() > 7000);
        assert_eq!(body["data"]["expired_now"], false);

        let (_, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/complete", session_id),
            None,
        )
        .await;
        assert_eq!(body["data"]["applied"], true);
        assert_eq!(body["data"]["session"]["status"], "completed");
        assert_eq!(body["data"]["session"]["remaining_seconds"], 0);

        let (_, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/complete", session_id),
            None,
        )
        .await;
        assert_eq!(body["data"]["applied"], false);

        let (status, _) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/terminate", session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(&t.router, "GET", "/api/v1/pcs/available", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_validation() {
        let t = api().await;
        let user_id = register_customer(&t.router).await;

        let (status, _) = call(
            &t.router,
            "POST",
            "/api/v1/sessions",
            Some(json!({
                "user_id": user_id,
                "pc_id": t.pc_id,
                "duration_minutes": 0,
                "payment_method": "cash"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            &t.router,
            "POST",
            "/api/v1/sessions",
            Some(json!({
                "user_id": user_id,
                "pc_id": t.pc_id,
                "duration_minutes": 1441,
                "payment_method": "cash"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = call(
            &t.router,
            "POST",
            "/api/v1/sessions",
            Some(json!({
                "user_id": user_id,
                "pc_id": t.pc_id,
                "duration_minutes": 60,
                "payment_method": "cash"
            })),
        )
        .await;
        let session_id = body["data"]["id"].as_i64().unwrap();
        let (status, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/extend", session_id),
            Some(json!({"extra_minutes": i32::MAX - 10, "payment_method": "cash"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("extra_minutes"));

        let (status, body) = call(
            &t.router,
            "POST",
            "/api/v1/sessions",
            Some(json!({
                "user_id": user_id,
                "pc_id": t.pc_id,
                "duration_minutes": 60,
                "payment_method": "bitcoin"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("payment_method"));

        let (status, _) = call(&t.router, "GET", "/api/v1/sessions/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &t.router,
            "POST",
            "/api/v1/customers",
            Some(json!({"name": "", "civil_id": "1", "phone": "2"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn kiosk_sign_in_by_civil_id_or_phone() {
        let t = api().await;
        let user_id = register_customer(&t.router).await;

        for q in ["290010100001", "55500000"] {
            let (status, body) =
                call(&t.router, "GET", &format!("/api/v1/customers/lookup?q={q}"), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["id"], user_id);
        }

        let (status, _) = call(&t.router, "GET", "/api/v1/customers/lookup?q=123", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn staff_menu_edits() {
        let t = api().await;
        let uri = format!("/api/v1/menu/{}", t.burger_id);

        let (status, body) =
            call(&t.router, "PATCH", &uri, Some(json!({"price": 649, "available": false}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["price"], 649);
        assert_eq!(body["data"]["available"], false);

        let (_, menu) = call(&t.router, "GET", "/api/v1/menu", None).await;
        assert!(menu["data"].as_array().unwrap().is_empty());

        let (status, _) = call(&t.router, "PATCH", &uri, Some(json!({"price": -5}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) =
            call(&t.router, "PATCH", "/api/v1/menu/999", Some(json!({"available": true}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn order_flow_over_http() {
        let t = api().await;
        let user_id = register_customer(&t.router).await;
        let (_, body) = call(
            &t.router,
            "POST",
            "/api/v1/sessions",
            Some(json!({
                "user_id": user_id,
                "pc_id": t.pc_id,
                "duration_minutes": 60,
                "payment_method": "cash"
            })),
        )
        .await;
        let session_id = body["data"]["id"].as_i64().unwrap();

        let (_, menu) = call(&t.router, "GET", "/api/v1/menu", None).await;
        assert_eq!(menu["data"][0]["extras"][0]["name"], "Cheese");

        let (status, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/orders", session_id),
            Some(json!({"items": [
                {"menu_item_id": t.burger_id, "quantity": 2, "extra_ids": [t.cheese_id]}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["total_amount"], 1398);
        assert_eq!(body["data"]["items"][0]["line_total"], 1398);
        let order_id = body["data"]["id"].as_i64().unwrap();

        let (status, _) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/orders", session_id),
            Some(json!({"items": []})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/orders", session_id),
            Some(json!({"items": [{"menu_item_id": t.burger_id, "quantity": 0}]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("items[0].quantity"));

        let (status, _) = call(
            &t.router,
            "POST",
            &format!("/api/v1/sessions/{}/orders", session_id),
            Some(json!({"items": [{"menu_item_id": 999, "quantity": 1}]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, queue) = call(&t.router, "GET", "/api/v1/orders/pending", None).await;
        assert_eq!(queue["data"].as_array().unwrap().len(), 1);

        let (status, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/orders/{}/advance", order_id),
            Some(json!({"status": "preparing"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "preparing");

        // Customer may no longer cancel
        let (status, _) = call(
            &t.router,
            "POST",
            &format!("/api/v1/orders/{}/cancel?session_id={}", order_id, session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Staff can
        let (status, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/orders/{}/cancel", order_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "cancelled");

        let (status, _) = call(
            &t.router,
            "POST",
            &format!("/api/v1/orders/{}/advance", order_id),
            Some(json!({"status": "delivered"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(&t.router, "GET", "/api/v1/dashboard", None).await;
        assert_eq!(body["data"]["active_sessions"], 1);
        assert_eq!(body["data"]["open_orders"], 0);
    }

    #[tokio::test]
    async fn pc_administration() {
        let t = api().await;
        let (status, body) = call(
            &t.router,
            "POST",
            "/api/v1/pcs",
            Some(json!({"number": 2, "specs": "RTX 4090"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, _) = call(
            &t.router,
            "POST",
            "/api/v1/pcs",
            Some(json!({"number": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(
            &t.router,
            "POST",
            &format!("/api/v1/pcs/{}/maintenance", id),
            None,
        )
        .await;
        assert_eq!(body["data"]["status"], "maintenance");

        let (_, body) = call(
            &t.router,
            "DELETE",
            &format!("/api/v1/pcs/{}/maintenance", id),
            None,
        )
        .await;
        assert_eq!(body["data"]["status"], "available");

        let (_, body) = call(&t.router, "GET", "/api/v1/pcs", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let t = api().await;
        let req = Request::builder()
            .uri("/health")
            .header("x-request-id", "kiosk-7")
            .body(Body::empty())
            .unwrap();
        let resp = t.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.headers()["x-request-id"], "kiosk-7");
    }
}
