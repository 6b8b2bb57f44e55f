use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A normalized search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// Exchange-prefixed identifier, e.g. `NSE:RELIANCE`. Unique within one result set.
    pub canonical_symbol: String,
    pub short_symbol: String,
    pub description: Option<String>,
    /// Always uppercased.
    pub exchange: Option<String>,
    pub asset_type: Option<String>,
}

/// One record as returned by the upstream source. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSymbol {
    #[serde(default, alias = "fullName", alias = "full_symbol", alias = "ticker")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default, rename = "type", alias = "asset_type", alias = "category")]
    pub kind: Option<String>,
}

impl RawSymbol {
    /// Returns `None` when the canonical or short symbol is missing after cleanup.
    pub fn normalize(self) -> Option<Suggestion> {
        let canonical_symbol = clean(self.full_name)?;
        let short_symbol = clean(self.symbol)?;
        Some(Suggestion {
            canonical_symbol,
            short_symbol,
            description: clean(self.description),
            exchange: clean(self.exchange).map(|e| e.to_ascii_uppercase()),
            asset_type: clean(self.kind),
        })
    }
}

// TradingView-like sources wrap the matched part of a symbol in <em> tags.
fn clean(value: Option<String>) -> Option<String> {
    let v = value?;
    let stripped = v.replace("<em>", "").replace("</em>", "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalize raw records and drop duplicate canonical symbols, keeping the
/// first occurrence in response order.
pub fn dedupe(raw: Vec<RawSymbol>) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(RawSymbol::normalize)
        .filter(|s| seen.insert(s.canonical_symbol.clone()))
        .collect()
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    #[default]
    Forex,
    India,
}

impl Market {
    pub fn default_tab(self) -> Tab {
        match self {
            Market::India => Tab::Stocks,
            Market::Forex => Tab::Forex,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Market::Forex => Market::India,
            Market::India => Market::Forex,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Market::Forex => "FOREX",
            Market::India => "INDIA",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    All,
    Stocks,
    Funds,
    Futures,
    Forex,
    Crypto,
    Indices,
    Bonds,
    Economy,
    Options,
}

impl Tab {
    /// Display order of the tab strip.
    pub const ALL: [Tab; 10] = [
        Tab::All,
        Tab::Stocks,
        Tab::Funds,
        Tab::Futures,
        Tab::Forex,
        Tab::Crypto,
        Tab::Indices,
        Tab::Bonds,
        Tab::Economy,
        Tab::Options,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::All => "All",
            Tab::Stocks => "Stocks",
            Tab::Funds => "Funds",
            Tab::Futures => "Futures",
            Tab::Forex => "Forex",
            Tab::Crypto => "Crypto",
            Tab::Indices => "Indices",
            Tab::Bonds => "Bonds",
            Tab::Economy => "Economy",
            Tab::Options => "Options",
        }
    }

    pub fn position(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(full: &str, symbol: &str, exchange: Option<&str>) -> RawSymbol {
        RawSymbol {
            full_name: Some(full.to_string()),
            symbol: Some(symbol.to_string()),
            description: None,
            exchange: exchange.map(str::to_string),
            kind: None,
        }
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut first = raw("NSE:RELIANCE", "RELIANCE", Some("nse"));
        first.description = Some("Reliance Industries".into());
        let mut second = raw("NSE:RELIANCE", "RELIANCE", Some("NSE"));
        second.description = Some("duplicate".into());
        let out = dedupe(vec![first, raw("BSE:RELIANCE", "RELIANCE", None), second]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].canonical_symbol, "NSE:RELIANCE");
        assert_eq!(out[0].description.as_deref(), Some("Reliance Industries"));
        assert_eq!(out[0].exchange.as_deref(), Some("NSE"));
        assert_eq!(out[1].canonical_symbol, "BSE:RELIANCE");
    }

    #[test]
    fn records_without_symbols_are_discarded() {
        let missing_full = RawSymbol {
            symbol: Some("AAPL".into()),
            ..RawSymbol::default()
        };
        let blank_short = raw("NASDAQ:AAPL", "   ", None);
        let ok = raw("NASDAQ:MSFT", "MSFT", Some("NASDAQ"));
        let out = dedupe(vec![missing_full, blank_short, ok]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].short_symbol, "MSFT");
    }

    #[test]
    fn normalize_strips_highlight_markup() {
        let s = raw("NSE:<em>RELI</em>ANCE", "<em>RELI</em>ANCE", None)
            .normalize()
            .unwrap();
        assert_eq!(s.canonical_symbol, "NSE:RELIANCE");
        assert_eq!(s.short_symbol, "RELIANCE");
    }

    #[test]
    fn raw_symbol_accepts_field_aliases() {
        let v: RawSymbol = serde_json::from_value(serde_json::json!({
            "fullName": "BINANCE:BTCUSDT",
            "symbol": "BTCUSDT",
            "asset_type": "crypto",
            "description": ""
        }))
        .unwrap();
        let s = v.normalize().unwrap();
        assert_eq!(s.canonical_symbol, "BINANCE:BTCUSDT");
        assert_eq!(s.asset_type.as_deref(), Some("crypto"));
        assert_eq!(s.description, None);
    }

    #[test]
    fn market_default_tabs() {
        assert_eq!(Market::India.default_tab(), Tab::Stocks);
        assert_eq!(Market::Forex.default_tab(), Tab::Forex);
        assert_eq!(Market::India.toggled(), Market::Forex);
    }

    #[test]
    fn tab_cycle_wraps_over_strip() {
        assert_eq!(Tab::Options.next(), Tab::All);
        assert_eq!(Tab::All.prev(), Tab::Options);
        assert_eq!(Tab::Stocks.next(), Tab::Funds);
    }
}
