//! External collaborators: backend API, credentials and the stock list

pub mod credentials;
pub mod reports_api;
pub mod stock_directory;

pub use credentials::{Anonymous, CredentialProvider, EnvCredentials, StaticToken};
pub use reports_api::{ReportsApi, ReportsClient};
pub use stock_directory::{StockDirectory, StockListError};
