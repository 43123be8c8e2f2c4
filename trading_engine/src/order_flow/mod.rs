mod api;
pub mod order_objects;

pub use api::OrderFlowApi;
