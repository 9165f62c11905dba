use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    Error,
    app_state::lock_connection,
    date_range::parse_date,
    transaction::{
        Transaction, TransactionId, TransactionState, TransactionType, TransactionUpdate,
        update_transaction,
    },
    user::UserID,
};

/// The request body for editing a transaction. Omitted fields keep their
/// current value.
#[derive(Debug, Default, Deserialize)]
pub struct EditTransactionForm {
    #[serde(rename = "type")]
    transaction_type: Option<String>,
    amount: Option<Decimal>,
    category: Option<String>,
    description: Option<String>,
    date: Option<String>,
}

impl TryFrom<EditTransactionForm> for TransactionUpdate {
    type Error = Error;

    fn try_from(form: EditTransactionForm) -> Result<Self, Self::Error> {
        Ok(Self {
            transaction_type: form
                .transaction_type
                .as_deref()
                .map(str::parse::<TransactionType>)
                .transpose()?,
            amount: form.amount,
            category: form.category,
            description: form.description,
            date: form.date.as_deref().map(parse_date).transpose()?,
        })
    }
}

/// A route handler for changing some or all fields of a transaction.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    user_id: UserID,
    Path(transaction_id): Path<TransactionId>,
    Json(form): Json<EditTransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let update = TransactionUpdate::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction = update_transaction(transaction_id, user_id, update, &connection)?;
    tracing::debug!("Updated transaction {transaction_id} for user {user_id}");

    Ok(Json(transaction))
}
