pub mod chart_service;
pub mod quote_service;
pub mod refresh_service;
pub mod session_service;
pub mod valuation_service;
