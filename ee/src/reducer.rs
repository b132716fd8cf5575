use crate::expr::Expr;
use std::{iter, str::FromStr};
use thiserror::Error;

/// A statistical aggregation, applied either across the images of a
/// collection or across the pixels of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Reducer(Expr);

impl Reducer {
    fn named(function: &str) -> Self {
        Self(Expr::invoke(function, iter::empty::<(String, Expr)>()))
    }

    pub fn mean() -> Self {
        Self::named("Reducer.mean")
    }

    pub fn sum() -> Self {
        Self::named("Reducer.sum")
    }

    pub fn median() -> Self {
        Self::named("Reducer.median")
    }

    pub fn min() -> Self {
        Self::named("Reducer.min")
    }

    pub fn max() -> Self {
        Self::named("Reducer.max")
    }

    pub fn std_dev() -> Self {
        Self::named("Reducer.stdDev")
    }

    pub fn count() -> Self {
        Self::named("Reducer.count")
    }

    pub fn first() -> Self {
        Self::named("Reducer.first")
    }

    pub fn last() -> Self {
        Self::named("Reducer.last")
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::mean()
    }
}

impl FromStr for Reducer {
    type Err = UnknownReducer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Self::mean()),
            "sum" => Ok(Self::sum()),
            "median" => Ok(Self::median()),
            "min" => Ok(Self::min()),
            "max" => Ok(Self::max()),
            "std" | "stdDev" => Ok(Self::std_dev()),
            "count" => Ok(Self::count()),
            "first" => Ok(Self::first()),
            "last" => Ok(Self::last()),
            other => Err(UnknownReducer(other.to_owned())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown reducer '{0}'")]
pub struct UnknownReducer(pub String);
