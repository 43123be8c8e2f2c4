//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every `/api` route resolves the calling user from the `X-User-Id` header (see
//! [`crate::helpers::authenticated_user`]); handlers never take a user id from the request body or
//! path, so one user cannot act on another's wallet or orders.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use trading_engine::{
    db_types::{Order, Trade},
    order_objects::OrderQueryFilter,
    traits::ExchangeDatabase,
    OrderFlowApi,
};

use crate::{
    data_objects::{OrderSearchQuery, PlaceOrderRequest, WalletAmountRequest, WalletBalanceResult},
    errors::ServerError,
    helpers::authenticated_user,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl ExchangeDatabase);
/// Route handler for the order placement endpoint
///
/// The order is validated, funded (wallet debit for buys, share reservation for sells) and matched
/// against the company's book in a single transaction. The response carries the order in its
/// post-matching state together with any trades the placement produced.
pub async fn place_order<B: ExchangeDatabase>(
    req: HttpRequest,
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticated_user(&req)?;
    let order = body.into_inner().into_new_order(&user_id);
    debug!("💻️ POST order for {user_id}: {} {} x{} on company {}", order.order_type, order.side, order.quantity, order.company_id);
    let outcome = api.place_order(order).await?;
    Ok(HttpResponse::Created().json(outcome))
}

route!(cancel_order => Delete "/orders/{id}" impl ExchangeDatabase);
/// Route handler for the order cancellation endpoint
///
/// Only the order's owner can cancel it, and only while it is still open. The unfilled part of the
/// reservation (money for buys, shares for sells) is returned in the same transaction.
pub async fn cancel_order<B: ExchangeDatabase>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticated_user(&req)?;
    let order_id = path.into_inner();
    debug!("💻️ DELETE order {order_id} for {user_id}");
    let order = api.cancel_order(&user_id, order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(my_orders => Get "/orders" impl ExchangeDatabase);
/// Route handler for the orders endpoint
///
/// Returns the calling user's orders, newest first, optionally narrowed by company, side, status or
/// to open orders only via query parameters.
pub async fn my_orders<B: ExchangeDatabase>(
    req: HttpRequest,
    query: web::Query<OrderSearchQuery>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticated_user(&req)?;
    let filter: OrderQueryFilter = query.into_inner().into();
    debug!("💻️ GET orders for {user_id}");
    let orders: Vec<Order> = api.list_orders(&user_id, filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Companies  ----------------------------------------------------
route!(companies => Get "/companies" impl ExchangeDatabase);
/// The catalogue of companies, including inactive ones. `current_price` is the last traded price.
pub async fn companies<B: ExchangeDatabase>(api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET companies");
    let companies = api.db().list_companies().await?;
    Ok(HttpResponse::Ok().json(companies))
}

route!(company_trades => Get "/companies/{id}/trades" impl ExchangeDatabase);
/// The trade tape for a company, most recent first.
pub async fn company_trades<B: ExchangeDatabase>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let company_id = path.into_inner();
    trace!("💻️ GET trades for company {company_id}");
    let trades: Vec<Trade> = api.db().trades_for_company(company_id).await?;
    Ok(HttpResponse::Ok().json(trades))
}

//----------------------------------------------   Portfolio  ----------------------------------------------------
route!(my_portfolio => Get "/portfolio" impl ExchangeDatabase);
/// The calling user's holdings, one row per company, with reserved (on-sale) quantities broken out.
pub async fn my_portfolio<B: ExchangeDatabase>(
    req: HttpRequest,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticated_user(&req)?;
    debug!("💻️ GET portfolio for {user_id}");
    let positions = api.db().positions_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(positions))
}

//----------------------------------------------   Wallet  ----------------------------------------------------
route!(my_wallet => Get "/wallet" impl ExchangeDatabase);
pub async fn my_wallet<B: ExchangeDatabase>(
    req: HttpRequest,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticated_user(&req)?;
    debug!("💻️ GET wallet for {user_id}");
    let balance = api.db().wallet_balance(&user_id).await?;
    Ok(HttpResponse::Ok().json(WalletBalanceResult { user_id, balance }))
}

route!(deposit => Post "/wallet/deposit" impl ExchangeDatabase);
pub async fn deposit<B: ExchangeDatabase>(
    req: HttpRequest,
    body: web::Json<WalletAmountRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticated_user(&req)?;
    let amount = body.into_inner().amount;
    debug!("💻️ POST deposit of {amount} for {user_id}");
    let balance = api.db().deposit(&user_id, amount).await?;
    Ok(HttpResponse::Ok().json(WalletBalanceResult { user_id, balance }))
}

route!(withdraw => Post "/wallet/withdraw" impl ExchangeDatabase);
/// Withdrawals are refused rather than clipped when the balance is too low. Funds reserved against
/// open buy orders are not withdrawable; cancel the order first.
pub async fn withdraw<B: ExchangeDatabase>(
    req: HttpRequest,
    body: web::Json<WalletAmountRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticated_user(&req)?;
    let amount = body.into_inner().amount;
    debug!("💻️ POST withdrawal of {amount} for {user_id}");
    match api.db().withdraw(&user_id, amount).await {
        Ok(balance) => Ok(HttpResponse::Ok().json(WalletBalanceResult { user_id, balance })),
        Err(e) => {
            debug!("💻️ Withdrawal for {user_id} refused. {e}");
            Err(e.into())
        },
    }
}
