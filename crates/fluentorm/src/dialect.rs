//! Per-connection SQL dialect facts.
//!
//! Two facts are configurable and autodetected from the driver name when
//! left unset: the identifier quote character and the limit clause style.
//! The remaining renderings (RETURNING on insert, the firebird ROWS/TO
//! spelling) key off the driver name directly.

/// How a row limit is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// Trailing `LIMIT <n>` (or `ROWS <n>` on firebird).
    Limit,
    /// `TOP <n>` immediately after SELECT.
    TopN,
}

/// Resolved dialect facts for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub quote_character: char,
    pub limit_style: LimitStyle,
    pub limit_keyword: &'static str,
    pub offset_keyword: &'static str,
    /// Whether INSERT statements append a RETURNING clause over the key
    /// columns so generated keys come back with the statement itself.
    pub insert_returning: bool,
}

impl Dialect {
    /// Resolve dialect facts for a driver, honoring explicit overrides for
    /// the two configurable fields.
    pub fn resolve(
        driver_name: &str,
        quote_character: Option<char>,
        limit_style: Option<LimitStyle>,
    ) -> Self {
        let firebird = driver_name == "firebird";
        Self {
            quote_character: quote_character
                .unwrap_or_else(|| Self::detect_quote_character(driver_name)),
            limit_style: limit_style.unwrap_or_else(|| Self::detect_limit_style(driver_name)),
            limit_keyword: if firebird { "ROWS" } else { "LIMIT" },
            offset_keyword: if firebird { "TO" } else { "OFFSET" },
            insert_returning: driver_name == "pgsql",
        }
    }

    /// The quote character the driver's native tooling expects.
    pub fn detect_quote_character(driver_name: &str) -> char {
        match driver_name {
            "pgsql" | "sqlsrv" | "dblib" | "mssql" | "sybase" | "firebird" => '"',
            _ => '`',
        }
    }

    /// Whether the driver wants `TOP <n>` instead of a trailing limit.
    pub fn detect_limit_style(driver_name: &str) -> LimitStyle {
        match driver_name {
            "sqlsrv" | "dblib" | "mssql" => LimitStyle::TopN,
            _ => LimitStyle::Limit,
        }
    }
}
