//! The built-in catalogue of transaction categories.
//!
//! Transactions store their category as free text, so these entries are
//! suggestions for clients rather than a constraint on what can be stored.

use axum::Json;
use serde::Serialize;

use crate::transaction::TransactionType;

/// A suggested category for income or expenses, e.g. 'Salary' or 'Food'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    /// A stable identifier for the category.
    pub id: &'static str,
    /// The label stored on transactions.
    pub name: &'static str,
    /// Whether the category is for income or expenses.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// An emoji to show next to the name.
    pub icon: &'static str,
}

const fn category(
    id: &'static str,
    name: &'static str,
    transaction_type: TransactionType,
    icon: &'static str,
) -> Category {
    Category {
        id,
        name,
        transaction_type,
        icon,
    }
}

/// Every built-in category, income first.
pub static CATEGORIES: [Category; 17] = [
    category("cat-1", "Salary", TransactionType::Income, "💰"),
    category("cat-2", "Freelance", TransactionType::Income, "💼"),
    category("cat-3", "Investments", TransactionType::Income, "📈"),
    category("cat-4", "Gifts", TransactionType::Income, "🎁"),
    category("cat-5", "Balance Adjustment", TransactionType::Income, "⚖️"),
    category("cat-6", "Other Income", TransactionType::Income, "➕"),
    category("cat-7", "Food", TransactionType::Expense, "🍔"),
    category("cat-8", "Transport", TransactionType::Expense, "🚗"),
    category("cat-9", "Entertainment", TransactionType::Expense, "🎉"),
    category("cat-10", "Housing", TransactionType::Expense, "🏠"),
    category("cat-11", "Utilities", TransactionType::Expense, "💡"),
    category("cat-12", "Health", TransactionType::Expense, "⚕️"),
    category("cat-13", "Education", TransactionType::Expense, "📚"),
    category("cat-14", "Clothing", TransactionType::Expense, "👔"),
    category("cat-15", "Travel", TransactionType::Expense, "✈️"),
    category("cat-16", "Balance Adjustment", TransactionType::Expense, "⚖️"),
    category("cat-17", "Other Expenses", TransactionType::Expense, "➖"),
];

/// A route handler that lists the built-in categories.
pub async fn get_categories() -> Json<&'static [Category]> {
    Json(CATEGORIES.as_slice())
}
