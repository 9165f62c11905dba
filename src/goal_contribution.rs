//! Linking ledger entries to savings goals and undoing contributions.
//!
//! A contribution is recorded as an expense that moves money out of the
//! spendable balance and into a goal. Deleting that expense gives the money
//! back, so the goal's saved amount is reduced by the same amount.

use crate::{
    Error,
    goal::{Goal, GoalId},
    ledger::GoalRepository,
    transaction::Transaction,
};

/// The category given to ledger entries that contribute to a goal.
pub const GOAL_CONTRIBUTION_CATEGORY: &str = "Goal";

/// The description prefix of a contribution, followed by the goal's name.
pub const GOAL_CONTRIBUTION_PREFIX: &str = "Contribution to goal: ";

/// The description for a contribution to the goal called `goal_name`.
pub fn contribution_description(goal_name: &str) -> String {
    format!("{GOAL_CONTRIBUTION_PREFIX}{goal_name}")
}

/// How a transaction identifies the goal it contributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionTarget<'a> {
    /// The transaction carries the goal's ID.
    Linked(GoalId),
    /// The transaction only names the goal in its description.
    ///
    /// Ledger entries written before goals were linked by ID are tagged this way.
    Named(&'a str),
}

/// Work out which goal, if any, `transaction` contributed to.
///
/// A stored goal ID always wins. Without one, the transaction must be in the
/// [GOAL_CONTRIBUTION_CATEGORY] category and its description must start with
/// [GOAL_CONTRIBUTION_PREFIX].
pub fn contribution_target(transaction: &Transaction) -> Option<ContributionTarget<'_>> {
    if let Some(goal_id) = transaction.goal_id {
        return Some(ContributionTarget::Linked(goal_id));
    }

    if transaction.category.as_deref() != Some(GOAL_CONTRIBUTION_CATEGORY) {
        return None;
    }

    transaction
        .description
        .strip_prefix(GOAL_CONTRIBUTION_PREFIX)
        .map(ContributionTarget::Named)
}

/// Undo the goal contribution made by `deleted`, if it was one.
///
/// Must be given the transaction as it was before deletion. The goal's saved
/// amount is reduced by the transaction amount and floored at zero. A
/// transaction that is not a contribution, or whose goal no longer exists,
/// leaves every goal untouched.
///
/// Returns the updated goal, or `None` if no goal was changed.
///
/// # Errors
///
/// Returns an error only if `goals` fails. Callers deleting a transaction
/// should log the error and carry on with the deletion.
pub fn apply_goal_contribution_reversal(
    deleted: &Transaction,
    goals: &impl GoalRepository,
) -> Result<Option<Goal>, Error> {
    let goal_id = match contribution_target(deleted) {
        None => return Ok(None),
        Some(ContributionTarget::Linked(goal_id)) => goal_id,
        Some(ContributionTarget::Named(name)) => {
            match goals.find_goal_by_name(deleted.user_id, name)? {
                Some(goal) => goal.id,
                None => {
                    tracing::debug!(
                        "No goal named \"{name}\" for transaction {}, skipping reversal",
                        deleted.id
                    );
                    return Ok(None);
                }
            }
        }
    };

    let goal = goals.adjust_goal_amount(goal_id, deleted.user_id, -deleted.amount)?;

    if let Some(goal) = &goal {
        tracing::info!(
            "Reversed contribution of {} to goal {} after deleting transaction {}",
            deleted.amount,
            goal.id,
            deleted.id
        );
    }

    Ok(goal)
}
