use crate::search::model::{Market, Suggestion, Tab};

/// Exchanges accepted while the INDIA market is active.
pub const INDIA_EXCHANGES: [&str; 4] = ["NSE", "BSE", "NFO", "MCX"];

pub const DEFAULT_MAX_RESULTS: usize = 20;

fn keywords(tab: Tab) -> &'static [&'static str] {
    match tab {
        Tab::All => &[],
        Tab::Stocks => &["stock", "equity"],
        Tab::Funds => &["fund", "etf"],
        Tab::Futures => &["future"],
        Tab::Forex => &["forex", "cfd", "fx"],
        Tab::Crypto => &["crypto"],
        Tab::Indices => &["index"],
        Tab::Bonds => &["bond"],
        Tab::Economy => &["economic", "economy"],
        Tab::Options => &["option"],
    }
}

/// Case-insensitive substring match of the asset type against the tab's
/// keyword table. A suggestion without a type only matches `All`.
pub fn matches_tab(suggestion: &Suggestion, tab: Tab) -> bool {
    if tab == Tab::All {
        return true;
    }
    let Some(kind) = suggestion.asset_type.as_deref() else {
        return false;
    };
    let kind = kind.to_ascii_lowercase();
    keywords(tab).iter().any(|k| kind.contains(k))
}

pub fn matches_market(suggestion: &Suggestion, market: Market) -> bool {
    match market {
        Market::Forex => true,
        Market::India => match suggestion.exchange.as_deref() {
            None => true,
            Some(ex) => {
                let ex = ex.to_ascii_uppercase();
                INDIA_EXCHANGES.contains(&ex.as_str())
            }
        },
    }
}

/// Narrow `results` to the active tab and market, preserving source order.
pub fn filter_results(
    results: &[Suggestion],
    tab: Tab,
    market: Market,
    max_results: usize,
) -> Vec<Suggestion> {
    results
        .iter()
        .filter(|s| matches_tab(s, tab))
        .filter(|s| matches_market(s, market))
        .take(max_results)
        .cloned()
        .collect()
}

/// Short badge shown in front of a result row.
pub fn badge(suggestion: &Suggestion) -> String {
    let classified = Tab::ALL
        .iter()
        .skip(1)
        .find(|tab| matches_tab(suggestion, **tab));
    let label = match classified {
        Some(Tab::Stocks) => "STK",
        Some(Tab::Funds) => "FND",
        Some(Tab::Futures) => "FUT",
        Some(Tab::Forex) => "FX",
        Some(Tab::Crypto) => "CRY",
        Some(Tab::Indices) => "IDX",
        Some(Tab::Bonds) => "BND",
        Some(Tab::Economy) => "ECO",
        Some(Tab::Options) => "OPT",
        Some(Tab::All) | None => {
            return suggestion
                .exchange
                .as_deref()
                .map(|ex| ex.chars().take(3).collect())
                .unwrap_or_else(|| "?".to_string());
        }
    };
    label.to_string()
}
