use httpmock::prelude::*;
use service_dashboard::adapters::export::CsvExporter;
use service_dashboard::core::detail::{DismissReason, PopupState, NO_DETAILS_MESSAGE};
use service_dashboard::domain::model::{DetailKey, Period};
use service_dashboard::{
    DashboardConfig, DashboardEngine, HttpDashboardApi, LoadOutcome, LocalStorage,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn engine_for(base_url: &str) -> DashboardEngine<HttpDashboardApi> {
    let mut config = DashboardConfig::default();
    config.api.base_url = base_url.to_string();
    config.api.timeout_seconds = Some(5);
    config.display.resize_debounce_ms = Some(20);
    let api = HttpDashboardApi::from_config(&config).unwrap();
    DashboardEngine::from_config(api, &config)
}

fn dashboard_body(records: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "data": {
            "totalServices": 120,
            "totalExperts": 8,
            "servicesWithAssist": 14,
            "repeatedServices": records.as_array().map(|r| r.len()).unwrap_or(0),
            "servicesByExpert": {"labels": ["Ana", "Bruno"], "data": [70, 50]},
            "servicesByCategory": {"labels": [], "data": []},
            "servicesWithAssistChart": {"labels": ["Sem Auxílio", "Com Auxílio"], "data": [106, 14]},
            "repeatedServicesList": records
        },
        "filters": {"month": 3, "year": 2024, "month_name": "Março"}
    })
}

fn repeated(contract: &str, second_date: &str, days: u32) -> serde_json::Value {
    serde_json::json!({
        "contract": contract,
        "category": "Fibra",
        "experts": ["Ana"],
        "firstServiceId": 100,
        "secondServiceId": 200,
        "firstServiceDate": "2024-02-20",
        "secondServiceDate": second_date,
        "daysBetween": days
    })
}

#[tokio::test]
async fn test_initialize_loads_current_month() {
    let server = MockServer::start();
    let months_mock = server.mock(|when, then| {
        when.method(GET).path("/api/available-months");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "success": true,
                "data": [
                    {"year": 2024, "month": 3},
                    {"year": 2024, "month": 2},
                    {"year": 2023, "month": 12}
                ]
            }));
    });
    let data_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/data")
            .query_param("month", "3")
            .query_param("year", "2024");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(dashboard_body(serde_json::json!([
                repeated("A", "2024-03-01", 5),
                repeated("B", "2024-03-02", 20)
            ])));
    });

    let engine = engine_for(&server.base_url());
    let outcome = engine
        .initialize(chrono::NaiveDate::from_ymd_opt(2024, 3, 18).unwrap())
        .await;

    months_mock.assert();
    data_mock.assert();

    let view = match outcome {
        LoadOutcome::Applied(view) => view,
        other => panic!("unexpected outcome: {:?}", other),
    };
    let contracts: Vec<&str> = view.table.rows.iter().map(|r| r.contract.as_str()).collect();
    assert_eq!(contracts, vec!["B", "A"]);
    assert_eq!(view.table.rows[0].children[0].badge_class, "status-completed");
    assert_eq!(view.table.rows[1].children[0].badge_class, "status-pending");
    assert_eq!(view.table.rows[0].children[0].second_service_date, "02/03/2024");
    assert_eq!(view.metrics[0].value, 120);
    assert!(view.charts[1].1.is_empty());
    assert!(!view.charts[0].1.is_empty());

    let years = engine.with_state(|s| s.available_years.clone()).await;
    assert_eq!(years, vec![2024, 2023]);
}

#[tokio::test]
async fn test_pagination_over_contract_groups() {
    let server = MockServer::start();
    let records: Vec<serde_json::Value> = (0..31)
        .map(|i| repeated(&format!("C-{:02}", i), "2024-03-01", 3))
        .collect();
    server.mock(|when, then| {
        when.method(GET).path("/api/data");
        then.status(200)
            .json_body(dashboard_body(serde_json::Value::Array(records)));
    });

    let engine = engine_for(&server.base_url());
    engine.load(Period::new(3, 2024)).await;

    let first = engine.table().await;
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.rows.len(), 30);
    assert_eq!(first.rows[0].contract, "C-00");

    assert!(!engine.go_to_page(0).await);
    assert!(!engine.go_to_page(3).await);
    assert_eq!(engine.table().await.page, 1);

    assert!(engine.next_page().await);
    let second = engine.table().await;
    assert_eq!(second.rows.len(), 1);
    assert_eq!(second.rows[0].contract, "C-30");
    assert!(engine.previous_page().await);
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/data").query_param("month", "2");
        then.status(200)
            .delay(Duration::from_millis(300))
            .json_body(dashboard_body(serde_json::json!([repeated("OLD", "2024-02-10", 4)])));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/data").query_param("month", "3");
        then.status(200)
            .json_body(dashboard_body(serde_json::json!([repeated("NEW", "2024-03-10", 4)])));
    });

    let engine = engine_for(&server.base_url());
    let (slow, fast) = tokio::join!(engine.load(Period::new(2, 2024)), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.load(Period::new(3, 2024)).await
    });

    assert_eq!(slow, LoadOutcome::Stale);
    assert!(matches!(fast, LoadOutcome::Applied(_)));

    let view = engine.view().await;
    assert_eq!(view.period, Some(Period::new(3, 2024)));
    assert_eq!(view.table.rows[0].contract, "NEW");
}

#[tokio::test]
async fn test_transport_failure_shows_banner() {
    // 沒有服務監聽的埠
    let engine = engine_for("http://127.0.0.1:9");
    let outcome = engine.load(Period::new(3, 2024)).await;

    match outcome {
        LoadOutcome::Failed { message, .. } => {
            assert_eq!(message, "Erro de conexão com o servidor")
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(engine.view().await.error.is_some());
}

#[tokio::test]
async fn test_detail_drilldown_and_rework_update() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/data");
        then.status(200)
            .json_body(dashboard_body(serde_json::json!([repeated("A", "2024-03-01", 5)])));
    });
    let details_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/details-order-service")
            .json_body(serde_json::json!({
                "contract_id": "A",
                "id_order_first": 100,
                "id_order_secund": 200
            }));
        then.status(200).json_body(serde_json::json!([
            {"id": 100, "descricao": "Sem sinal", "resolucao": "Reset", "data_finalizacao": "2024-02-20 10:00:00", "retrabalho": false},
            {"id": 200, "descricao": "Sem sinal", "resolucao": "Troca de ONU", "data_finalizacao": "2024-03-01 15:30:00", "retrabalho": false}
        ]));
    });
    let update_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/update-order-service")
            .json_body(serde_json::json!({"os_id": 200, "retrabalho": true}));
        then.status(200).json_body(serde_json::json!({"success": true}));
    });

    let engine = engine_for(&server.base_url());
    engine.load(Period::new(3, 2024)).await;

    let key = engine.table().await.rows[0].children[0]
        .detail_key
        .clone()
        .unwrap();
    let popup = engine.open_detail(key.clone()).await.unwrap();
    assert_eq!(popup.lines[0].id, 200);
    assert_eq!(popup.lines[0].completed_at, "01/03/2024 15:30");
    assert!(popup.lines[0].editable);
    assert!(!popup.lines[1].editable);

    let saved = assert_ok!(engine.save_rework(true).await).unwrap();
    assert!(saved.lines[0].rework);
    assert!(matches!(engine.popup_state().await, PopupState::Saved { .. }));

    engine.dismiss_detail(DismissReason::Backdrop).await;
    let reopened = engine.open_detail(key).await.unwrap();
    assert!(reopened.lines[0].rework);

    details_mock.assert_hits(1);
    update_mock.assert();
}

#[tokio::test]
async fn test_rework_persisted_after_popup_closed_mid_save() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/data");
        then.status(200)
            .json_body(dashboard_body(serde_json::json!([repeated("A", "2024-03-01", 5)])));
    });
    let details_mock = server.mock(|when, then| {
        when.method(POST).path("/api/details-order-service");
        then.status(200).json_body(serde_json::json!([
            {"id": 200, "descricao": "Sem sinal", "resolucao": "Troca de ONU", "data_finalizacao": "2024-03-01 15:30:00", "retrabalho": false}
        ]));
    });
    let update_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/update-order-service")
            .json_body(serde_json::json!({"os_id": 200, "retrabalho": true}));
        then.status(200)
            .delay(Duration::from_millis(300))
            .json_body(serde_json::json!({"success": true}));
    });

    let engine = engine_for(&server.base_url());
    engine.load(Period::new(3, 2024)).await;

    let key = DetailKey {
        contract: "A".to_string(),
        first_service_id: 100,
        second_service_id: 200,
    };
    engine.open_detail(key.clone()).await.unwrap();

    let (saved, _) = tokio::join!(engine.save_rework(true), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.dismiss_detail(DismissReason::Escape).await;
    });

    assert!(assert_ok!(saved).is_none());
    update_mock.assert();

    let reopened = engine.open_detail(key).await.unwrap();
    assert!(reopened.lines[0].rework);
    details_mock.assert_hits(1);
}

#[tokio::test]
async fn test_empty_details_and_failed_details() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/details-order-service")
            .json_body_partial(r#"{"contract_id": "EMPTY"}"#);
        then.status(200).json_body(serde_json::json!([]));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/details-order-service")
            .json_body_partial(r#"{"contract_id": "BROKEN"}"#);
        then.status(500)
            .json_body(serde_json::json!({"error": "Erro interno"}));
    });

    let engine = engine_for(&server.base_url());

    let empty = engine
        .open_detail(DetailKey {
            contract: "EMPTY".to_string(),
            first_service_id: 1,
            second_service_id: 2,
        })
        .await
        .unwrap();
    assert_eq!(empty.message.as_deref(), Some(NO_DETAILS_MESSAGE));
    assert!(empty.error.is_none());

    let broken = engine
        .open_detail(DetailKey {
            contract: "BROKEN".to_string(),
            first_service_id: 1,
            second_service_id: 2,
        })
        .await
        .unwrap();
    assert!(broken.error.is_some());
    assert_err!(engine.save_rework(true).await);
}

#[tokio::test]
async fn test_resize_burst_refetches_once() {
    let server = MockServer::start();
    let data_mock = server.mock(|when, then| {
        when.method(GET).path("/api/data");
        then.status(200)
            .json_body(dashboard_body(serde_json::json!([repeated("CONTRATO-LONGO-0001", "2024-03-01", 5)])));
    });

    let engine = engine_for(&server.base_url());
    engine.load(Period::new(3, 2024)).await;

    let (first, second, last) = tokio::join!(
        engine.on_resize(900),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            engine.on_resize(600).await
        },
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            engine.on_resize(400).await
        }
    );

    assert!(first.is_none());
    assert!(second.is_none());
    assert!(matches!(last, Some(LoadOutcome::Applied(_))));
    data_mock.assert_hits(2);

    engine.toggle_group("CONTRATO-LONGO-0001").await;
    let table = engine.table().await;
    assert_eq!(table.rows[0].children[0].contract, "CONTRAT...");
}

#[tokio::test]
async fn test_export_sorted_records_to_csv() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/data");
        then.status(200).json_body(dashboard_body(serde_json::json!([
            repeated("A", "2024-03-01", 5),
            repeated("B", "2024-03-02", 20)
        ])));
    });

    let engine = engine_for(&server.base_url());
    engine.load(Period::new(3, 2024)).await;

    let exporter = CsvExporter::new(LocalStorage::new(temp_dir.path()));
    let count = exporter
        .export("repetidos.csv", &engine.sorted_records().await)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let content = std::fs::read_to_string(temp_dir.path().join("repetidos.csv")).unwrap();
    let rows: Vec<&str> = content.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("B,"));
    assert!(rows[2].starts_with("A,"));
}
