//! Uploaded stock list, used to resolve company names for job symbols

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::models::StockInfo;

#[derive(Debug, Error)]
pub enum StockListError {
    #[error("failed to read stock list: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid stock list: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StockListFile {
    List(Vec<StockInfo>),
    Wrapped { stocks: Vec<StockInfo> },
}

/// Symbol-keyed lookup over an uploaded stock list
#[derive(Debug, Clone, Default)]
pub struct StockDirectory {
    stocks: Vec<StockInfo>,
    index: HashMap<String, usize>,
}

impl StockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stocks(stocks: impl IntoIterator<Item = StockInfo>) -> Self {
        let mut directory = Self::new();
        for stock in stocks {
            directory.insert(stock);
        }
        directory
    }

    /// Parse a JSON stock list, either a bare array or `{"stocks": [...]}`
    pub fn from_json_str(json: &str) -> Result<Self, StockListError> {
        let stocks = match serde_json::from_str::<StockListFile>(json)? {
            StockListFile::List(stocks) => stocks,
            StockListFile::Wrapped { stocks } => stocks,
        };
        Ok(Self::from_stocks(stocks))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StockListError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Insert or replace a stock; symbols are matched case-insensitively
    pub fn insert(&mut self, mut stock: StockInfo) {
        stock.symbol = stock.symbol.trim().to_ascii_uppercase();
        if stock.symbol.is_empty() {
            return;
        }
        match self.index.get(&stock.symbol) {
            Some(&position) => self.stocks[position] = stock,
            None => {
                self.index.insert(stock.symbol.clone(), self.stocks.len());
                self.stocks.push(stock);
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&StockInfo> {
        self.index
            .get(&symbol.trim().to_ascii_uppercase())
            .map(|&position| &self.stocks[position])
    }

    /// Company name for `symbol`, or the symbol itself when unknown
    pub fn display_name(&self, symbol: &str) -> String {
        self.get(symbol)
            .map(|stock| stock.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| symbol.to_string())
    }

    /// Metadata for each symbol in order, synthesising entries for unknown ones
    pub fn stocks_for<'a>(&self, symbols: impl IntoIterator<Item = &'a str>) -> Vec<StockInfo> {
        symbols
            .into_iter()
            .map(|symbol| {
                self.get(symbol)
                    .cloned()
                    .unwrap_or_else(|| StockInfo::new(symbol, symbol))
            })
            .collect()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.stocks.iter().map(|stock| stock.symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }
}
