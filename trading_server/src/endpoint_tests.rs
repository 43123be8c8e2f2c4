use actix_web::{
    http::StatusCode,
    test::{call_service, init_service, read_body_json, TestRequest},
    web,
    App,
};
use serde_json::Value;
use trading_engine::{
    create_database_if_missing,
    db_types::{NewCompany, OrderSide, OrderType},
    events::EventProducers,
    ExchangeDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use ue_common::Rupees;

use crate::{
    data_objects::PlaceOrderRequest,
    routes::{health, CancelOrderRoute, CompaniesRoute, DepositRoute, MyOrdersRoute, MyWalletRoute, PlaceOrderRoute, WithdrawRoute},
};

async fn test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let path = std::env::temp_dir().join(format!("ue_server_test_{}.db", rand::random::<u64>()));
    let url = format!("sqlite://{}", path.display());
    create_database_if_missing(&url).await.unwrap();
    let db = SqliteDatabase::new_with_url(&url, 5).await.unwrap();
    db.run_migrations().await.unwrap();
    db
}

macro_rules! test_app {
    ($db:expr) => {{
        let api = OrderFlowApi::new($db.clone(), EventProducers::default());
        init_service(
            App::new().app_data(web::Data::new(api)).service(health).service(
                web::scope("/api")
                    .service(PlaceOrderRoute::<SqliteDatabase>::new())
                    .service(MyOrdersRoute::<SqliteDatabase>::new())
                    .service(CancelOrderRoute::<SqliteDatabase>::new())
                    .service(CompaniesRoute::<SqliteDatabase>::new())
                    .service(MyWalletRoute::<SqliteDatabase>::new())
                    .service(DepositRoute::<SqliteDatabase>::new())
                    .service(WithdrawRoute::<SqliteDatabase>::new()),
            ),
        )
        .await
    }};
}

async fn seed_company(db: &SqliteDatabase) -> i64 {
    let company = db
        .upsert_company(NewCompany {
            name: "Acme Ltd".to_string(),
            symbol: "ACME".to_string(),
            active: true,
            available_shares: 1_000_000,
            current_price: Rupees::from_rupees(100),
        })
        .await
        .unwrap();
    company.id
}

async fn seed_trader(db: &SqliteDatabase, id: &str, funds: Rupees) {
    db.upsert_user(id, id).await.unwrap();
    db.set_kyc_verified(id, true).await.unwrap();
    if funds.value() > 0 {
        db.deposit(id, funds).await.unwrap();
    }
}

#[actix_web::test]
async fn health_check() {
    let db = test_db().await;
    let app = test_app!(db);
    let req = TestRequest::get().uri("/health").to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn requests_without_a_user_header_are_unauthorized() {
    let db = test_db().await;
    let app = test_app!(db);
    let req = TestRequest::get().uri("/api/orders").to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn place_list_and_cancel_an_order() {
    let db = test_db().await;
    let company_id = seed_company(&db).await;
    seed_trader(&db, "alice", Rupees::from_rupees(2_000)).await;
    let app = test_app!(db);

    let body = PlaceOrderRequest {
        company_id,
        side: OrderSide::Buy,
        order_type: OrderType::Limit,
        quantity: 5,
        price: Some(Rupees::from_rupees(100)),
    };
    let req = TestRequest::post()
        .uri("/api/orders")
        .insert_header(("X-User-Id", "alice"))
        .set_json(&body)
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let outcome: Value = read_body_json(res).await;
    assert_eq!(outcome["order"]["status"], "Pending");
    let order_id = outcome["order"]["id"].as_i64().unwrap();

    let req = TestRequest::get().uri("/api/orders").insert_header(("X-User-Id", "alice")).to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let orders: Value = read_body_json(res).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let req = TestRequest::delete()
        .uri(&format!("/api/orders/{order_id}"))
        .insert_header(("X-User-Id", "alice"))
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    // A second cancellation conflicts with the order's terminal state.
    let req = TestRequest::delete()
        .uri(&format!("/api/orders/{order_id}"))
        .insert_header(("X-User-Id", "alice"))
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn rejected_orders_report_the_reason() {
    let db = test_db().await;
    let company_id = seed_company(&db).await;
    seed_trader(&db, "alice", Rupees::from_rupees(10)).await;
    let app = test_app!(db);

    let body = PlaceOrderRequest {
        company_id,
        side: OrderSide::Buy,
        order_type: OrderType::Limit,
        quantity: 5,
        price: Some(Rupees::from_rupees(100)),
    };
    let req = TestRequest::post()
        .uri("/api/orders")
        .insert_header(("X-User-Id", "alice"))
        .set_json(&body)
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let err: Value = read_body_json(res).await;
    assert!(err["error"].as_str().unwrap().contains("Insufficient funds"));
}

#[actix_web::test]
async fn wallet_deposit_and_withdraw() {
    let db = test_db().await;
    seed_trader(&db, "bob", Rupees::from_rupees(0)).await;
    let app = test_app!(db);

    let req = TestRequest::post()
        .uri("/api/wallet/deposit")
        .insert_header(("X-User-Id", "bob"))
        .set_json(serde_json::json!({ "amount": Rupees::from_rupees(500) }))
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let balance: Value = read_body_json(res).await;
    assert_eq!(balance["balance"], serde_json::to_value(Rupees::from_rupees(500)).unwrap());

    let req = TestRequest::post()
        .uri("/api/wallet/withdraw")
        .insert_header(("X-User-Id", "bob"))
        .set_json(serde_json::json!({ "amount": Rupees::from_rupees(600) }))
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let req = TestRequest::get().uri("/api/wallet").insert_header(("X-User-Id", "bob")).to_request();
    let res = call_service(&app, req).await;
    let balance: Value = read_body_json(res).await;
    assert_eq!(balance["user_id"], "bob");
    assert_eq!(balance["balance"], serde_json::to_value(Rupees::from_rupees(500)).unwrap());
}

#[actix_web::test]
async fn company_catalogue_is_public_to_api_users() {
    let db = test_db().await;
    seed_company(&db).await;
    let app = test_app!(db);
    let req = TestRequest::get().uri("/api/companies").to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let companies: Value = read_body_json(res).await;
    assert_eq!(companies.as_array().unwrap().len(), 1);
    assert_eq!(companies[0]["symbol"], "ACME");
}
