pub mod backup;
pub mod portfolio_store;
pub mod store;
