//! Symbol → coin-id mapping shared by the CoinGecko and CoinCap
//! providers. Both APIs key assets by lowercase ids ("bitcoin"), not
//! ticker symbols ("BTC").

/// Resolve an uppercase ticker to the coin id used by CoinGecko/CoinCap.
/// Unknown symbols fall back to the lowercased symbol, which is correct
/// for coins whose id equals their ticker (e.g. "xrp").
pub fn coin_id(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    for (sym, id) in COMMON_IDS {
        if *sym == upper {
            return (*id).to_string();
        }
    }
    symbol.to_lowercase()
}

const COMMON_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("USDT", "tether"),
    ("USDC", "usd-coin"),
    ("BNB", "binancecoin"),
    ("XRP", "ripple"),
    ("ADA", "cardano"),
    ("SOL", "solana"),
    ("DOGE", "dogecoin"),
    ("DOT", "polkadot"),
    ("MATIC", "matic-network"),
    ("LTC", "litecoin"),
    ("AVAX", "avalanche-2"),
    ("LINK", "chainlink"),
    ("UNI", "uniswap"),
    ("ATOM", "cosmos"),
    ("XLM", "stellar"),
    ("ALGO", "algorand"),
    ("NEAR", "near"),
    ("SHIB", "shiba-inu"),
    ("TRX", "tron"),
    ("AAVE", "aave"),
    ("FIL", "filecoin"),
    ("ETC", "ethereum-classic"),
    ("VET", "vechain"),
    ("MANA", "decentraland"),
    ("SAND", "the-sandbox"),
    ("XMR", "monero"),
    ("XTZ", "tezos"),
    ("FLOW", "flow"),
    ("ZEC", "zcash"),
];
