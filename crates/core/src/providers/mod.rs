pub mod coinbase;
pub mod coincap;
pub mod coingecko;
pub mod crypto_ids;
pub mod registry;
pub mod traits;
pub mod yahoo_finance;
