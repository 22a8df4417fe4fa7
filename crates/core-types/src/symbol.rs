//! Smart symbol normalization shared by the quote and calculator endpoints.

/// Normalizes a user-supplied symbol into the broker's
/// `EXCHANGE:TRADINGSYMBOL` form.
///
/// Rules, in order:
/// 1. An input that already carries an exchange prefix keeps it; both parts
///    are uppercased (`"nse:infy"` -> `"NSE:INFY"`).
/// 2. A bare name found in `index_symbols` (case-insensitive) routes to the
///    `INDICES` pseudo-exchange (`"nifty 50"` -> `"INDICES:NIFTY 50"`).
///    Which names are indices is configuration data, not a pattern rule.
/// 3. Any other bare symbol defaults to the `NSE` exchange.
pub fn normalize_symbol(raw: &str, index_symbols: &[String]) -> String {
    let trimmed = raw.trim();
    if let Some((exchange, tradingsymbol)) = trimmed.split_once(':') {
        return format!(
            "{}:{}",
            exchange.trim().to_uppercase(),
            tradingsymbol.trim().to_uppercase()
        );
    }

    let upper = trimmed.to_uppercase();
    if index_symbols.iter().any(|s| s.eq_ignore_ascii_case(&upper)) {
        format!("INDICES:{}", upper)
    } else {
        format!("NSE:{}", upper)
    }
}

/// Splits an `EXCHANGE:TRADINGSYMBOL` string into its two parts.
///
/// Returns `None` when the delimiter is missing or either side is empty.
pub fn split_symbol(symbol: &str) -> Option<(&str, &str)> {
    let (exchange, tradingsymbol) = symbol.split_once(':')?;
    if exchange.is_empty() || tradingsymbol.is_empty() {
        return None;
    }
    Some((exchange, tradingsymbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices() -> Vec<String> {
        vec!["NIFTY 50".to_string(), "NIFTY BANK".to_string()]
    }

    #[test]
    fn bare_symbol_defaults_to_nse() {
        assert_eq!(normalize_symbol("infy", &indices()), "NSE:INFY");
    }

    #[test]
    fn configured_index_routes_to_indices_exchange() {
        assert_eq!(normalize_symbol("nifty 50", &indices()), "INDICES:NIFTY 50");
    }

    #[test]
    fn existing_prefix_is_preserved_and_uppercased() {
        assert_eq!(normalize_symbol("nse:reliance", &indices()), "NSE:RELIANCE");
        assert_eq!(normalize_symbol("NFO:NIFTY24AUGFUT", &indices()), "NFO:NIFTY24AUGFUT");
    }

    #[test]
    fn unlisted_multi_word_name_still_defaults_to_nse() {
        // Only configured names route to INDICES; a space alone is not enough.
        assert_eq!(normalize_symbol("tata motors", &indices()), "NSE:TATA MOTORS");
    }

    #[test]
    fn split_rejects_malformed_symbols() {
        assert_eq!(split_symbol("NSE:INFY"), Some(("NSE", "INFY")));
        assert_eq!(split_symbol("INFY"), None);
        assert_eq!(split_symbol(":INFY"), None);
        assert_eq!(split_symbol("NSE:"), None);
    }
}
