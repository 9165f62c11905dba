//! Conjunctive filters over the transaction ledger.

use serde::Deserialize;

use crate::{DateRange, Error, transaction::Transaction, transaction::TransactionType};

/// Conditions a transaction must meet to be selected.
///
/// Every condition that is set must hold, unset conditions match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Only include transactions dated within this inclusive range.
    pub date_range: DateRange,
    /// Only include transactions with exactly this category.
    pub category: Option<String>,
    /// Only include transactions of this type.
    pub transaction_type: Option<TransactionType>,
}

impl TransactionFilter {
    /// Whether `transaction` meets every condition of the filter.
    ///
    /// A transaction without a category never matches a category condition.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.date_range.contains(transaction.date)
            && self
                .category
                .as_ref()
                .is_none_or(|category| transaction.category.as_ref() == Some(category))
            && self
                .transaction_type
                .is_none_or(|transaction_type| transaction.transaction_type == transaction_type)
    }
}

/// The raw query string parameters for filtering transactions.
///
/// Values are kept as strings so that malformed dates and types produce a
/// descriptive error instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    /// The first date to include, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// The last date to include, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// The category to match exactly.
    pub category: Option<String>,
    /// `INCOME` or `EXPENSE`.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

impl TryFrom<FilterParams> for TransactionFilter {
    type Error = Error;

    fn try_from(params: FilterParams) -> Result<Self, Self::Error> {
        let date_range =
            DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?;

        let category = params
            .category
            .map(|category| category.trim().to_owned())
            .filter(|category| !category.is_empty());

        let transaction_type = params
            .transaction_type
            .as_deref()
            .map(str::trim)
            .filter(|transaction_type| !transaction_type.is_empty())
            .map(str::parse::<TransactionType>)
            .transpose()?;

        Ok(Self {
            date_range,
            category,
            transaction_type,
        })
    }
}
