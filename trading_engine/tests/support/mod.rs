//! Shared fixtures for the integration tests: a throwaway SQLite database per test, plus seeding helpers.

use trading_engine::{
    create_database_if_missing,
    db_types::{Company, NewCompany},
    events::EventProducers,
    ExchangeDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use ue_common::Rupees;

pub struct TestExchange {
    pub db: SqliteDatabase,
    pub api: OrderFlowApi<SqliteDatabase>,
}

pub async fn new_exchange() -> TestExchange {
    let _ = env_logger::try_init();
    let path = std::env::temp_dir().join(format!("ue_test_{}.db", rand::random::<u64>()));
    let url = format!("sqlite://{}", path.display());
    create_database_if_missing(&url).await.expect("Error creating test database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
    db.run_migrations().await.expect("Error running migrations");
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    TestExchange { db, api }
}

impl TestExchange {
    /// A KYC-verified user with the given wallet balance (in whole rupees).
    pub async fn trader(&self, id: &str, funds_rs: i64) -> String {
        self.db.upsert_user(id, id).await.unwrap();
        self.db.set_kyc_verified(id, true).await.unwrap();
        if funds_rs > 0 {
            self.db.deposit(id, Rupees::from_rupees(funds_rs)).await.unwrap();
        }
        id.to_string()
    }

    /// A trader who additionally holds shares of the company, granted at the given cost basis.
    pub async fn holder(&self, id: &str, funds_rs: i64, company_id: i64, shares: i64, basis_rs: i64) -> String {
        let id = self.trader(id, funds_rs).await;
        self.db.grant_shares(&id, company_id, shares, Rupees::from_rupees(basis_rs)).await.unwrap();
        id
    }

    pub async fn company(&self, symbol: &str, price_rs: i64) -> Company {
        self.db
            .upsert_company(NewCompany {
                name: format!("{symbol} Ltd"),
                symbol: symbol.to_string(),
                active: true,
                available_shares: 1_000_000,
                current_price: Rupees::from_rupees(price_rs),
            })
            .await
            .unwrap()
    }
}
