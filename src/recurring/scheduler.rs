//! The background job that creates the transactions of due rules for every user.

use std::time::Duration;

use rusqlite::Connection;
use time::Date;
use tokio::time::MissedTickBehavior;

use crate::{
    AppState, Error,
    recurring::{get_owners_with_due_rules, process::ProcessSummary, process_due_rules_in_db},
    timezone::local_today,
};

/// Run the due scan every `period` until the process exits.
///
/// The first scan runs straight away. Failures are logged and the next tick
/// tries again.
pub async fn run_due_scan_job(state: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!("scanning for due recurring transactions every {period:?}");

    loop {
        interval.tick().await;

        let today = match local_today(&state.local_timezone) {
            Ok(today) => today,
            Err(error) => {
                tracing::error!("skipping due scan: {error}");
                continue;
            }
        };

        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("skipping due scan, could not acquire database lock: {error}");
                continue;
            }
        };

        match scan_all_owners(today, &connection) {
            Ok(summary) if summary.created.is_empty() && summary.conflicts == 0 => {
                tracing::debug!("due scan as of {today} found nothing due");
            }
            Ok(summary) => tracing::info!(
                "due scan as of {today} created {} transactions, {} conflicts, {} rules ended",
                summary.created.len(),
                summary.conflicts,
                summary.ended
            ),
            Err(error) => tracing::error!("due scan as of {today} failed: {error}"),
        }
    }
}

/// Process the due rules of every owner that has any, one SQLite transaction per owner.
///
/// An owner whose scan fails is logged and skipped.
///
/// # Errors
///
/// Returns an [Error] if the owners cannot be listed.
pub fn scan_all_owners(as_of: Date, connection: &Connection) -> Result<ProcessSummary, Error> {
    let owners = get_owners_with_due_rules(as_of, connection)?;
    let mut total = ProcessSummary::default();

    for owner_id in owners {
        match process_due_rules_in_db(owner_id, as_of, connection) {
            Ok(summary) => {
                total.created.extend(summary.created);
                total.conflicts += summary.conflicts;
                total.ended += summary.ended;
            }
            Err(error) => {
                tracing::error!("could not process due rules of user {owner_id}: {error}");
            }
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        UserID,
        recurring::{
            db::test_db::{get_test_connection, insert_monthly_rule},
            get_rule, set_rule_active,
        },
        transaction::count_transactions,
    };

    use super::scan_all_owners;

    #[test]
    fn processes_every_owner_with_due_rules() {
        let connection = get_test_connection();
        let first = insert_monthly_rule(UserID::new(1), &connection);
        let second = insert_monthly_rule(UserID::new(2), &connection);

        let summary = scan_all_owners(date!(2025 - 01 - 31), &connection).unwrap();

        assert_eq!(summary.created.len(), 2);
        assert_eq!(count_transactions(UserID::new(1), &connection), Ok(1));
        assert_eq!(count_transactions(UserID::new(2), &connection), Ok(1));
        for rule in [first, second] {
            assert_eq!(
                get_rule(rule.id, rule.owner_id, &connection).unwrap().next_due_date,
                date!(2025 - 02 - 15)
            );
        }
    }

    #[test]
    fn catches_up_one_occurrence_per_scan() {
        let connection = get_test_connection();
        insert_monthly_rule(UserID::new(1), &connection);
        let as_of = date!(2025 - 04 - 01);

        for want_count in 1..=3 {
            scan_all_owners(as_of, &connection).unwrap();
            assert_eq!(count_transactions(UserID::new(1), &connection), Ok(want_count));
        }

        let summary = scan_all_owners(as_of, &connection).unwrap();
        assert!(summary.created.is_empty());
        assert_eq!(count_transactions(UserID::new(1), &connection), Ok(3));
    }

    #[test]
    fn skips_paused_rules() {
        let connection = get_test_connection();
        let rule = insert_monthly_rule(UserID::new(1), &connection);
        set_rule_active(rule.id, rule.owner_id, false, &connection).unwrap();

        let summary = scan_all_owners(date!(2025 - 01 - 31), &connection).unwrap();

        assert_eq!(summary, Default::default());
        assert_eq!(count_transactions(UserID::new(1), &connection), Ok(0));
    }
}
