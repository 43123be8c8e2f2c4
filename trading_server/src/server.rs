use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use trading_engine::{
    create_database_if_missing,
    events::{EventHandlers, EventHooks, EventProducers},
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        CancelOrderRoute,
        CompaniesRoute,
        CompanyTradesRoute,
        DepositRoute,
        MyOrdersRoute,
        MyPortfolioRoute,
        MyWalletRoute,
        PlaceOrderRoute,
        WithdrawRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    create_database_if_missing(&config.database_url).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(&config.database_url, config.database_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Database at {} is ready", config.database_url);
    let producers = start_audit_log().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Subscribes a logging handler to the engine's event hooks. A real deployment would hang the
/// notification service and market-data feed off the same hooks.
async fn start_audit_log() -> EventProducers {
    let mut hooks = EventHooks::default();
    hooks.on_trade_executed(|event| {
        Box::pin(async move {
            let t = &event.trade;
            info!("⚖️ Trade #{}: {} share(s) of company {} @ {} (buyer {}, seller {})", t.id, t.quantity, t.company_id, t.price, t.buyer_id, t.seller_id);
        })
    });
    hooks.on_order_cancelled(|event| {
        Box::pin(async move {
            info!("❌️ Order #{} cancelled by {}", event.order.id, event.order.user_id);
        })
    });
    let handlers = EventHandlers::new(25, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    producers
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ue::access_log"))
            .app_data(web::Data::new(orders_api));
        let api_scope = web::scope("/api")
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(CompaniesRoute::<SqliteDatabase>::new())
            .service(CompanyTradesRoute::<SqliteDatabase>::new())
            .service(MyPortfolioRoute::<SqliteDatabase>::new())
            .service(MyWalletRoute::<SqliteDatabase>::new())
            .service(DepositRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
