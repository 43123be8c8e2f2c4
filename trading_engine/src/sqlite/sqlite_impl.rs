//! `SqliteDatabase` is the concrete SQLite backend for the trading engine.
//!
//! Each mutating method wraps its whole unit of work in a single transaction: order intake, the matching
//! pass and the settlement of every discovered trade either all commit or none do.

use std::fmt::Debug;

use log::*;
use sqlx::{Sqlite, SqlitePool, Transaction};
use ue_common::Rupees;

use super::db::{companies, db_url, new_pool, orders, positions, trades, users, wallets};
use crate::{
    db_types::{Company, NewCompany, NewOrder, Order, OrderSide, OrderStatus, OrderType, Position, Trade, User},
    matching::plan_matches,
    order_objects::OrderQueryFilter,
    traits::{ExchangeDatabase, MarketQuery, OrderFlowError, OrderOutcome},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), OrderFlowError> {
        sqlx::migrate!("./migrations").run(&self.pool).await.map_err(|e| OrderFlowError::Database(e.to_string()))?;
        info!("🚀️ Migrations complete");
        Ok(())
    }

    /// Resolves the price an order trades against: the limit price, or for market orders the last traded
    /// price with the company reference price as fallback.
    async fn execution_price(
        order: &NewOrder,
        company: &Company,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<Rupees, OrderFlowError> {
        let price = match order.order_type {
            OrderType::Limit => order
                .limit_price
                .ok_or_else(|| OrderFlowError::Validation("A limit order requires a limit price".to_string()))?,
            OrderType::Market => {
                trades::last_trade_price(company.id, tx).await?.unwrap_or(company.current_price)
            },
        };
        if price.value() <= 0 {
            return Err(OrderFlowError::NoReferencePrice(company.id));
        }
        Ok(price)
    }

    /// Runs one matching-and-settlement pass over the company's book. Called inside the intake transaction,
    /// under the caller's per-company lock.
    async fn run_matching_pass(
        company_id: i64,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<Vec<Trade>, OrderFlowError> {
        let book = orders::open_orders_for_company(company_id, tx).await?;
        let proposals = plan_matches(&book);
        let mut result = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let trade = trades::insert_trade(&proposal, company_id, tx).await?;
            let amount = trade.total_amount;
            orders::apply_fill(proposal.buy_order_id, proposal.quantity, amount, tx).await?;
            orders::apply_fill(proposal.sell_order_id, proposal.quantity, amount, tx).await?;
            positions::apply_buy_fill(&proposal.buyer_id, company_id, proposal.quantity, amount, tx).await?;
            positions::apply_sell_fill(&proposal.seller_id, company_id, proposal.quantity, tx).await?;
            wallets::credit(&proposal.seller_id, amount, tx).await?;
            // The buyer reserved at their own price but the trade cleared at the seller's. Hand the
            // difference straight back.
            let improvement = (proposal.buy_price - proposal.price) * proposal.quantity;
            if improvement.value() > 0 {
                wallets::credit(&proposal.buyer_id, improvement, tx).await?;
            }
            companies::set_last_price(company_id, trade.price, tx).await?;
            debug!(
                "⚖️ Trade #{}: {} × {} @ {} (buy #{} / sell #{})",
                trade.id, trade.quantity, company_id, trade.price, trade.buy_order_id, trade.sell_order_id
            );
            result.push(trade);
        }
        Ok(result)
    }
}

impl ExchangeDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn process_new_order(&self, order: NewOrder) -> Result<OrderOutcome, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        // The KYC gate comes before any other validation.
        match users::kyc_verified(&order.user_id, &mut tx).await? {
            None => return Err(OrderFlowError::UserNotFound(order.user_id)),
            Some(false) => return Err(OrderFlowError::KycRequired),
            Some(true) => {},
        }
        let company = companies::fetch_company(order.company_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::CompanyNotFound(order.company_id))?;
        if !company.active {
            return Err(OrderFlowError::CompanyInactive(company.id));
        }
        let price = Self::execution_price(&order, &company, &mut tx).await?;
        // Reserve before the order row exists, so a failure leaves nothing behind and a concurrent order
        // cannot double-commit the same funds or shares.
        match order.side {
            OrderSide::Buy => {
                let required = price * order.quantity;
                if wallets::try_debit(&order.user_id, required, &mut tx).await?.is_none() {
                    let available = wallets::balance(&order.user_id, &mut tx).await?.unwrap_or_default();
                    return Err(OrderFlowError::InsufficientFunds { required, available });
                }
            },
            OrderSide::Sell => {
                if !positions::reserve_shares(&order.user_id, company.id, order.quantity, &mut tx).await? {
                    let available = positions::position(&order.user_id, company.id, &mut tx)
                        .await?
                        .map(|p| p.sellable())
                        .unwrap_or(0);
                    return Err(OrderFlowError::InsufficientHoldings { required: order.quantity, available });
                }
            },
        }
        let placed =
            orders::insert_order(&order.user_id, company.id, order.side, order.order_type, order.quantity, price, &mut tx)
                .await?;
        debug!("🗃️ Order #{} ({} {} × {} @ {}) saved", placed.id, placed.side, placed.quantity, company.symbol, price);
        let trades = Self::run_matching_pass(company.id, &mut tx).await?;
        let order = orders::fetch_order(placed.id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(placed.id))?;
        tx.commit().await?;
        debug!("🗃️ Order #{} intake complete: {} with {} trade(s)", order.id, order.status, trades.len());
        Ok(OrderOutcome { order, trades })
    }

    async fn cancel_order(&self, user_id: &str, order_id: i64) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        // The status check happens here, inside the transaction, not from any earlier snapshot.
        let order = orders::fetch_order(order_id, &mut tx)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !order.status.is_open() {
            return Err(OrderFlowError::InvalidState { id: order.id, status: order.status });
        }
        let unfilled = order.remaining();
        match order.side {
            OrderSide::Buy => {
                let refund = order.price * unfilled;
                if refund.value() > 0 {
                    wallets::credit(user_id, refund, &mut tx).await?;
                    debug!("🗃️ Refunded {refund} of unspent reservation for cancelled order #{order_id}");
                }
            },
            OrderSide::Sell => {
                if unfilled > 0 {
                    positions::release_shares(user_id, order.company_id, unfilled, &mut tx).await?;
                    debug!("🗃️ Released {unfilled} reserved share(s) for cancelled order #{order_id}");
                }
            },
        }
        let order = orders::update_order_status(order_id, OrderStatus::Cancelled, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn upsert_user(&self, user_id: &str, display_name: &str) -> Result<User, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let user = users::upsert_user(user_id, display_name, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn set_kyc_verified(&self, user_id: &str, verified: bool) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        users::set_kyc_verified(user_id, verified, &mut conn).await?;
        debug!("🔑️ KYC verification for {user_id} set to {verified}");
        Ok(())
    }

    async fn upsert_company(&self, company: NewCompany) -> Result<Company, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        companies::upsert_company(company, &mut conn).await
    }

    async fn grant_shares(
        &self,
        user_id: &str,
        company_id: i64,
        quantity: i64,
        cost_basis: Rupees,
    ) -> Result<(), OrderFlowError> {
        if quantity < 1 || cost_basis.value() <= 0 {
            return Err(OrderFlowError::Validation(format!(
                "Share grants need a positive quantity and cost basis, got {quantity} @ {cost_basis}"
            )));
        }
        let mut tx = self.pool.begin().await?;
        positions::apply_buy_fill(user_id, company_id, quantity, cost_basis * quantity, &mut tx).await?;
        tx.commit().await?;
        debug!("📊️ Granted {quantity} share(s) of company {company_id} to {user_id} @ {cost_basis}");
        Ok(())
    }

    async fn deposit(&self, user_id: &str, amount: Rupees) -> Result<Rupees, OrderFlowError> {
        if amount.value() <= 0 {
            return Err(OrderFlowError::Validation(format!("Deposit amount must be positive, got {amount}")));
        }
        let mut tx = self.pool.begin().await?;
        let balance = wallets::credit(user_id, amount, &mut tx).await?;
        tx.commit().await?;
        debug!("💰️ Deposited {amount} for {user_id}; balance is now {balance}");
        Ok(balance)
    }

    async fn withdraw(&self, user_id: &str, amount: Rupees) -> Result<Rupees, OrderFlowError> {
        if amount.value() <= 0 {
            return Err(OrderFlowError::Validation(format!("Withdrawal amount must be positive, got {amount}")));
        }
        let mut tx = self.pool.begin().await?;
        let balance = match wallets::try_debit(user_id, amount, &mut tx).await? {
            Some(balance) => balance,
            None => {
                let available = wallets::balance(user_id, &mut tx).await?.unwrap_or_default();
                return Err(OrderFlowError::InsufficientFunds { required: amount, available });
            },
        };
        tx.commit().await?;
        debug!("💰️ Withdrew {amount} for {user_id}; balance is now {balance}");
        Ok(balance)
    }
}

impl MarketQuery for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    async fn fetch_company(&self, company_id: i64) -> Result<Option<Company>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        companies::fetch_company(company_id, &mut conn).await
    }

    async fn list_companies(&self) -> Result<Vec<Company>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        companies::list_companies(&mut conn).await
    }

    async fn trades_for_company(&self, company_id: i64) -> Result<Vec<Trade>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        trades::trades_for_company(company_id, &mut conn).await
    }

    async fn trades_for_order(&self, order_id: i64) -> Result<Vec<Trade>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        trades::trades_for_order(order_id, &mut conn).await
    }

    async fn position(&self, user_id: &str, company_id: i64) -> Result<Option<Position>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        positions::position(user_id, company_id, &mut conn).await
    }

    async fn positions_for_user(&self, user_id: &str) -> Result<Vec<Position>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        positions::positions_for_user(user_id, &mut conn).await
    }

    async fn wallet_balance(&self, user_id: &str) -> Result<Rupees, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(wallets::balance(user_id, &mut conn).await?.unwrap_or_default())
    }

    async fn is_kyc_verified(&self, user_id: &str) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::kyc_verified(user_id, &mut conn).await?.unwrap_or(false))
    }
}
