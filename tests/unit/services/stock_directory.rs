//! Unit tests for the stock list directory

use stockdesk::models::StockInfo;
use stockdesk::services::{StockDirectory, StockListError};

#[test]
fn loads_bare_array_stock_list() {
    let directory = StockDirectory::from_json_str(
        r#"[{"symbol": "aapl", "name": "Apple Inc."}, {"stock_symbol": "MSFT", "company_name": "Microsoft", "sector": "Software"}]"#,
    )
    .unwrap();

    assert_eq!(directory.len(), 2);
    assert_eq!(directory.display_name("AAPL"), "Apple Inc.");
    assert_eq!(directory.get("msft").unwrap().sector.as_deref(), Some("Software"));
}

#[test]
fn loads_wrapped_stock_list() {
    let directory =
        StockDirectory::from_json_str(r#"{"stocks": [{"symbol": "NVDA", "name": "NVIDIA"}]}"#).unwrap();
    let symbols: Vec<&str> = directory.symbols().collect();
    assert_eq!(symbols, vec!["NVDA"]);
}

#[test]
fn invalid_stock_list_is_a_parse_error() {
    let err = StockDirectory::from_json_str(r#"{"tickers": []}"#).unwrap_err();
    assert!(matches!(err, StockListError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = StockDirectory::from_json_file("/nonexistent/stocks.json").unwrap_err();
    assert!(matches!(err, StockListError::Io(_)));
}

#[test]
fn display_name_falls_back_to_symbol() {
    let directory = StockDirectory::from_stocks([StockInfo::new("AAPL", "  ")]);
    assert_eq!(directory.display_name("AAPL"), "AAPL");
    assert_eq!(directory.display_name("GOOG"), "GOOG");
}

#[test]
fn later_entries_replace_earlier_ones() {
    let directory = StockDirectory::from_stocks([
        StockInfo::new("AAPL", "Apple"),
        StockInfo::new("aapl", "Apple Inc."),
    ]);
    assert_eq!(directory.len(), 1);
    assert_eq!(directory.display_name("AAPL"), "Apple Inc.");
}
