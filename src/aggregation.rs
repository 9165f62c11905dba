//! Monetary aggregates derived from the transaction ledger.
//!
//! Every function here is a pure function of the transactions it is given:
//! balances, budget spending and report summaries are recomputed from a
//! snapshot of the ledger on every read and are never stored.

use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    DateRange, Error,
    budget::Budget,
    money::percentage_of,
    transaction::{Transaction, TransactionFilter, TransactionType},
};

/// The number of transactions shown in [DashboardSummary::recent_transactions].
pub const RECENT_TRANSACTIONS_LIMIT: usize = 5;

/// Totals for one category of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// The category, `None` for transactions without one.
    pub category: Option<String>,
    /// The sum of the amounts in the category.
    pub total: Decimal,
    /// The number of transactions in the category.
    pub count: usize,
    /// `total` as a percentage of the report's denominator.
    pub percentage: Decimal,
}

/// Income and expenses for one day, week or month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    /// The period label, e.g. "2025-01-15", "2025-W03" or "2025-01".
    pub period: String,
    /// Money earned in the period.
    pub income: Decimal,
    /// Money spent in the period.
    pub expenses: Decimal,
    /// `income - expenses` for this period alone.
    pub balance: Decimal,
}

/// An overview of the transactions in a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Money earned in the range.
    pub total_income: Decimal,
    /// Money spent in the range.
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`, i.e. the balance for the range only.
    pub balance: Decimal,
    /// The number of transactions in the range.
    pub transactions_count: usize,
    /// Totals per category with percentages of `total_expenses`.
    pub by_category: Vec<CategorySummary>,
    /// The newest transactions in the range.
    pub recent_transactions: Vec<Transaction>,
}

/// How to bucket transactions in [compute_by_period].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupBy {
    /// One bucket per calendar day, labelled `YYYY-MM-DD`.
    Day,
    /// One bucket per ISO 8601 week, labelled `YYYY-Www` with the ISO week-numbering year.
    Week,
    /// One bucket per calendar month, labelled `YYYY-MM`.
    #[default]
    Month,
}

impl FromStr for GroupBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(GroupBy::Day),
            "week" => Ok(GroupBy::Week),
            "month" => Ok(GroupBy::Month),
            _ => Err(Error::UnsupportedGroupBy(s.to_owned())),
        }
    }
}

/// The user's balance: total income minus total expenses.
pub fn compute_balance(transactions: &[Transaction]) -> Decimal {
    transactions.iter().map(signed_amount).sum()
}

/// The amount spent against `budget`.
///
/// Only expenses in the budget's category dated within the budget's window,
/// including both the start and end dates, are counted.
pub fn compute_budget_spent(budget: &Budget, transactions: &[Transaction]) -> Decimal {
    let filter = TransactionFilter {
        date_range: DateRange::new(Some(budget.start_date), Some(budget.end_date)),
        category: Some(budget.category.clone()),
        transaction_type: Some(TransactionType::Expense),
    };

    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction))
        .map(|transaction| transaction.amount)
        .sum()
}

/// Summarise `transactions`, which should already be limited to the date range of interest.
///
/// Category percentages are relative to total expenses, so income categories
/// may exceed 100%.
pub fn compute_dashboard(transactions: &[Transaction]) -> DashboardSummary {
    let total_income = total_of_type(transactions, TransactionType::Income);
    let total_expenses = total_of_type(transactions, TransactionType::Expense);

    let mut recent_transactions = transactions.to_vec();
    // Stable sort, so same day transactions keep their ledger order.
    recent_transactions.sort_by(|a, b| b.date.cmp(&a.date));
    recent_transactions.truncate(RECENT_TRANSACTIONS_LIMIT);

    DashboardSummary {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
        transactions_count: transactions.len(),
        by_category: compute_by_category(transactions, total_expenses),
        recent_transactions,
    }
}

/// Group `transactions` by category, largest total first.
///
/// Percentages are `total / denominator * 100` rounded to two decimal places,
/// or zero if `denominator` is not positive. Categories with equal totals
/// keep the order they first appear in.
pub fn compute_by_category(
    transactions: &[Transaction],
    denominator: Decimal,
) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = Vec::new();
    let mut index_by_category: HashMap<Option<&str>, usize> = HashMap::new();

    for transaction in transactions {
        let category = transaction.category.as_deref();
        let index = *index_by_category.entry(category).or_insert_with(|| {
            summaries.push(CategorySummary {
                category: category.map(str::to_owned),
                total: Decimal::ZERO,
                count: 0,
                percentage: Decimal::ZERO,
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[index];
        summary.total += transaction.amount;
        summary.count += 1;
    }

    for summary in &mut summaries {
        summary.percentage = percentage_of(summary.total, denominator);
    }

    summaries.sort_by(|a, b| b.total.cmp(&a.total));
    summaries
}

/// Bucket `transactions` by period, oldest period first.
///
/// Each bucket's balance covers that bucket alone and is not cumulative.
pub fn compute_by_period(transactions: &[Transaction], group_by: GroupBy) -> Vec<PeriodSummary> {
    let mut buckets: BTreeMap<String, PeriodSummary> = BTreeMap::new();

    for transaction in transactions {
        let period = period_label(transaction.date, group_by);
        let bucket = buckets
            .entry(period.clone())
            .or_insert_with(|| PeriodSummary {
                period,
                income: Decimal::ZERO,
                expenses: Decimal::ZERO,
                balance: Decimal::ZERO,
            });

        match transaction.transaction_type {
            TransactionType::Income => bucket.income += transaction.amount,
            TransactionType::Expense => bucket.expenses += transaction.amount,
        }

        bucket.balance += signed_amount(transaction);
    }

    // Labels are zero padded and fixed width, so key order is chronological.
    buckets.into_values().collect()
}

/// The label of the period that `date` falls in.
pub fn period_label(date: Date, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Day => format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        ),
        GroupBy::Week => {
            let (iso_year, week, _) = date.to_iso_week_date();
            format!("{iso_year:04}-W{week:02}")
        }
        GroupBy::Month => format!("{:04}-{:02}", date.year(), u8::from(date.month())),
    }
}

/// The sum of every amount in `transactions`, regardless of type.
pub fn total_amount(transactions: &[Transaction]) -> Decimal {
    transactions.iter().map(|transaction| transaction.amount).sum()
}

fn total_of_type(transactions: &[Transaction], transaction_type: TransactionType) -> Decimal {
    transactions
        .iter()
        .filter(|transaction| transaction.transaction_type == transaction_type)
        .map(|transaction| transaction.amount)
        .sum()
}

fn signed_amount(transaction: &Transaction) -> Decimal {
    match transaction.transaction_type {
        TransactionType::Income => transaction.amount,
        TransactionType::Expense => -transaction.amount,
    }
}
