use crate::expr::Expr;
use chrono::NaiveDate;

/// Server-side date.
#[derive(Debug, Clone, PartialEq)]
pub struct Date(Expr);

impl Date {
    /// A date given as `YYYY-MM-DD`.
    pub fn from_naive(date: NaiveDate) -> Self {
        Self::from_value(Expr::constant(date.format("%Y-%m-%d").to_string()))
    }

    /// A date from epoch milliseconds or an ISO string.
    pub fn from_value(value: Expr) -> Self {
        Self(Expr::invoke("Date", [("value", value)]))
    }

    /// Parses `text` with a Joda-style `pattern`, e.g. `yyyyMMdd`.
    pub fn parse(pattern: &str, text: EeString) -> Self {
        Self(Expr::invoke(
            "Date.parse",
            [("format", Expr::constant(pattern)), ("date", text.0)],
        ))
    }

    /// Formats this date with a Joda-style `pattern`.
    pub fn format(&self, pattern: &str) -> EeString {
        EeString(Expr::invoke(
            "Date.format",
            [("date", self.0.clone()), ("format", Expr::constant(pattern))],
        ))
    }

    /// Epoch milliseconds.
    pub fn millis(&self) -> Expr {
        Expr::invoke("Date.millis", [("date", self.0.clone())])
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }
}

/// Server-side string.
#[derive(Debug, Clone, PartialEq)]
pub struct EeString(Expr);

impl EeString {
    /// Casts an arbitrary value to a string.
    pub fn from_value(value: Expr) -> Self {
        Self(Expr::invoke("String", [("input", value)]))
    }

    pub fn slice(&self, start: i64, end: i64) -> Self {
        Self(Expr::invoke(
            "String.slice",
            [
                ("string", self.0.clone()),
                ("start", Expr::constant(start)),
                ("end", Expr::constant(end)),
            ],
        ))
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }
}

/// Server-side dictionary, e.g. the output of a region reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary(Expr);

impl Dictionary {
    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    /// A literal dictionary.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Expr)>,
        K: Into<String>,
    {
        Self(Expr::Dictionary(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn set(&self, key: &str, value: Expr) -> Self {
        Self(Expr::invoke(
            "Dictionary.set",
            [
                ("dictionary", self.0.clone()),
                ("key", Expr::constant(key)),
                ("value", value),
            ],
        ))
    }

    /// Merges `other` into this dictionary, `other` winning on
    /// duplicate keys.
    pub fn combine(&self, other: &Dictionary) -> Self {
        Self(Expr::invoke(
            "Dictionary.combine",
            [("first", self.0.clone()), ("second", other.0.clone())],
        ))
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }
}

/// A geometry-less (or not) bag of properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature(Expr);

impl Feature {
    pub fn new(geometry: Option<Expr>, properties: Dictionary) -> Self {
        Self(Expr::invoke(
            "Feature",
            [
                ("geometry", geometry.unwrap_or_else(Expr::null)),
                ("metadata", properties.0),
            ],
        ))
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection(Expr);

impl FeatureCollection {
    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }
}

/// `Algorithms.If`: evaluates to `then` when `condition` is truthy.
pub fn if_else(condition: Expr, then: Expr, otherwise: Expr) -> Expr {
    Expr::invoke(
        "Algorithms.If",
        [
            ("condition", condition),
            ("trueCase", then),
            ("falseCase", otherwise),
        ],
    )
}

/// `List.contains`.
pub fn list_contains(list: Expr, element: Expr) -> Expr {
    Expr::invoke("List.contains", [("list", list), ("element", element)])
}
