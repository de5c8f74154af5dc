//! Per-user transaction history with an undo/redo cursor
//!
//! The history is an index-addressed array of transactions in creation order
//! plus a single cursor index. The cursor splits the array into a prefix that
//! counts toward the balance and a suffix that is withheld pending a redo:
//!
//! ```text
//!   index:    0        1        2        3
//!   nodes:  [D 100]  [W 30]   [D 20]   [W 5]
//!   status: active   undone   active   undone
//!                              ^
//!                            cursor
//!
//!   visible: D 100, D 20        balance: 120
//! ```
//!
//! Status records durable intent (it is persisted), while the cursor records
//! navigation state that lives only as long as the in-memory session. Undo
//! and redo skip over nodes that already carry the target status, so they
//! always land on the nearest eligible node even after a reload that brings
//! back several undone entries.

use rust_decimal::Decimal;
use std::convert::Infallible;

use crate::types::{Transaction, TransactionStatus};

/// Ordered transaction history with a navigable cursor
///
/// `cursor` is `None` when the history is empty or when every node has been
/// undone back past the head ("before start").
#[derive(Debug, Clone, Default)]
pub struct HistoryCursor {
    nodes: Vec<Transaction>,
    cursor: Option<usize>,
}

impl HistoryCursor {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction and make it the current node
    ///
    /// Any undone nodes that were reachable by redo stay in the array but are
    /// now behind the cursor, so redo can no longer reach them.
    pub fn insert(&mut self, transaction: Transaction) {
        self.nodes.push(transaction);
        self.cursor = Some(self.nodes.len() - 1);
    }

    /// Clear all nodes and the cursor
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.cursor = None;
    }

    /// Rebuild from persisted transactions
    ///
    /// Transactions are ordered by creation time with ties broken by id, then
    /// inserted one by one, leaving the newest transaction current.
    pub fn reload<I>(&mut self, transactions: I)
    where
        I: IntoIterator<Item = Transaction>,
    {
        self.reset();

        let mut ordered: Vec<Transaction> = transactions.into_iter().collect();
        ordered.sort_by_key(Transaction::history_key);

        for transaction in ordered {
            self.insert(transaction);
        }
    }

    /// The transaction the next undo would reverse, without changing anything
    pub fn peek_undo(&self) -> Option<&Transaction> {
        self.undo_target().map(|index| &self.nodes[index])
    }

    /// The transaction the next redo would re-apply, without changing anything
    pub fn peek_redo(&self) -> Option<&Transaction> {
        self.redo_target().map(|index| &self.nodes[index])
    }

    /// Reverse the nearest active transaction at or before the cursor
    ///
    /// Returns the undone transaction (now with status `undone`) and leaves the
    /// cursor on the node preceding it. Returns `None`, with nothing changed,
    /// when no active node is reachable.
    pub fn undo(&mut self) -> Option<Transaction> {
        match self.undo_with(|_| Ok::<(), Infallible>(())) {
            Ok(undone) => undone,
            Err(never) => match never {},
        }
    }

    /// Like [`undo`](Self::undo), but runs `commit` on the target first
    ///
    /// The history is only changed if `commit` succeeds, which lets callers
    /// persist the status change before it becomes visible in memory.
    pub fn undo_with<E, F>(&mut self, commit: F) -> Result<Option<Transaction>, E>
    where
        F: FnOnce(&Transaction) -> Result<(), E>,
    {
        let Some(index) = self.undo_target() else {
            return Ok(None);
        };

        commit(&self.nodes[index])?;

        let node = &mut self.nodes[index];
        node.status = TransactionStatus::Undone;
        self.cursor = index.checked_sub(1);

        Ok(Some(node.clone()))
    }

    /// Re-apply the nearest undone transaction after the cursor
    ///
    /// Starts from the head when the cursor is before the start. Returns the
    /// redone transaction (now `active`) and moves the cursor onto it. Returns
    /// `None`, with nothing changed, when no undone node follows the cursor.
    pub fn redo(&mut self) -> Option<Transaction> {
        match self.redo_with(|_| Ok::<(), Infallible>(())) {
            Ok(redone) => redone,
            Err(never) => match never {},
        }
    }

    /// Like [`redo`](Self::redo), but runs `commit` on the target first
    pub fn redo_with<E, F>(&mut self, commit: F) -> Result<Option<Transaction>, E>
    where
        F: FnOnce(&Transaction) -> Result<(), E>,
    {
        let Some(index) = self.redo_target() else {
            return Ok(None);
        };

        commit(&self.nodes[index])?;

        let node = &mut self.nodes[index];
        node.status = TransactionStatus::Active;
        self.cursor = Some(index);

        Ok(Some(node.clone()))
    }

    /// Sum of signed amounts over the visible transactions
    ///
    /// Saturates instead of overflowing. Use
    /// [`checked_balance`](Self::checked_balance) where an out-of-range sum
    /// must be detected.
    pub fn balance(&self) -> Decimal {
        self.visible_transactions()
            .fold(Decimal::ZERO, |sum, node| sum.saturating_add(node.signed_amount()))
    }

    /// Sum of signed amounts over the visible transactions, `None` on overflow
    pub fn checked_balance(&self) -> Option<Decimal> {
        checked_sum(self.visible_transactions())
    }

    /// The balance the next [`undo`](Self::undo) would leave, `None` on overflow
    ///
    /// Equals the current balance when there is nothing to undo.
    pub fn checked_balance_after_undo(&self) -> Option<Decimal> {
        match self.undo_target() {
            Some(index) => {
                checked_sum(self.nodes[..index].iter().filter(|node| node.is_active()))
            }
            None => self.checked_balance(),
        }
    }

    /// The balance the next [`redo`](Self::redo) would leave, `None` on overflow
    ///
    /// Active nodes between the cursor and the redo target become visible too.
    pub fn checked_balance_after_redo(&self) -> Option<Decimal> {
        match self.redo_target() {
            Some(index) => checked_sum(
                self.nodes[..=index]
                    .iter()
                    .enumerate()
                    .filter(|&(at, node)| at == index || node.is_active())
                    .map(|(_, node)| node),
            ),
            None => self.checked_balance(),
        }
    }

    /// Active transactions from the head through the cursor, oldest first
    ///
    /// Nodes after the cursor are excluded whatever their stored status. The
    /// iterator borrows the history and can be requested again at any time.
    pub fn visible_transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.nodes[..self.visible_end()]
            .iter()
            .filter(|node| node.is_active())
    }

    /// The node under the cursor
    pub fn current(&self) -> Option<&Transaction> {
        self.cursor.map(|index| &self.nodes[index])
    }

    /// Cursor index, `None` when empty or before the start
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    /// All nodes in history order, regardless of cursor and status
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn visible_end(&self) -> usize {
        self.cursor.map_or(0, |index| index + 1)
    }

    fn undo_target(&self) -> Option<usize> {
        let start = self.cursor?;
        (0..=start).rev().find(|&index| self.nodes[index].is_active())
    }

    fn redo_target(&self) -> Option<usize> {
        let start = self.visible_end();
        (start..self.nodes.len()).find(|&index| !self.nodes[index].is_active())
    }
}

fn checked_sum<'a>(mut nodes: impl Iterator<Item = &'a Transaction>) -> Option<Decimal> {
    nodes.try_fold(Decimal::ZERO, |sum, node| sum.checked_add(node.signed_amount()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn tx(id: u64, kind: TransactionKind, amount: i64, status: TransactionStatus) -> Transaction {
        Transaction {
            id,
            owner: 1,
            amount: Decimal::new(amount, 0),
            kind,
            status,
            created_at: Utc.timestamp_opt(1_700_000_000 + id as i64, 0).unwrap(),
        }
    }

    fn deposit(id: u64, amount: i64) -> Transaction {
        tx(id, TransactionKind::Deposit, amount, TransactionStatus::Active)
    }

    fn withdraw(id: u64, amount: i64) -> Transaction {
        tx(id, TransactionKind::Withdraw, amount, TransactionStatus::Active)
    }

    fn visible_ids(history: &HistoryCursor) -> Vec<u64> {
        history.visible_transactions().map(|t| t.id).collect()
    }

    #[test]
    fn test_empty_history() {
        let mut history = HistoryCursor::new();

        assert!(history.is_empty());
        assert_eq!(history.balance(), Decimal::ZERO);
        assert_eq!(history.visible_transactions().count(), 0);
        assert!(history.current().is_none());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_deposit_withdraw_undo_redo_scenario() {
        let mut history = HistoryCursor::new();

        history.insert(deposit(1, 100));
        assert_eq!(history.balance(), Decimal::new(100, 0));

        history.insert(withdraw(2, 30));
        assert_eq!(history.balance(), Decimal::new(70, 0));

        let undone = history.undo().unwrap();
        assert_eq!(undone.id, 2);
        assert_eq!(undone.status, TransactionStatus::Undone);
        assert_eq!(history.balance(), Decimal::new(100, 0));
        assert_eq!(visible_ids(&history), vec![1]);

        let redone = history.redo().unwrap();
        assert_eq!(redone.id, 2);
        assert_eq!(redone.status, TransactionStatus::Active);
        assert_eq!(history.balance(), Decimal::new(70, 0));
        assert_eq!(visible_ids(&history), vec![1, 2]);
    }

    #[test]
    fn test_insert_moves_cursor_to_tail() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 10));
        history.insert(deposit(2, 20));

        assert_eq!(history.position(), Some(1));
        assert_eq!(history.current().unwrap().id, 2);
    }

    #[test]
    fn test_undo_moves_cursor_before_undone_node() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 10));
        history.insert(deposit(2, 20));
        history.insert(deposit(3, 30));

        history.undo();
        assert_eq!(history.position(), Some(1));

        history.undo();
        assert_eq!(history.position(), Some(0));

        history.undo();
        assert_eq!(history.position(), None);
        assert_eq!(history.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_undo_redo_is_inverse() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.insert(withdraw(2, 40));
        history.insert(deposit(3, 15));

        let before_position = history.position();
        let before_balance = history.balance();
        let before_visible = visible_ids(&history);

        history.undo().unwrap();
        history.redo().unwrap();

        assert_eq!(history.position(), before_position);
        assert_eq!(history.balance(), before_balance);
        assert_eq!(visible_ids(&history), before_visible);
    }

    #[test]
    fn test_repeated_undo_past_start_is_noop() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 50));

        assert!(history.undo().is_some());
        for _ in 0..3 {
            assert!(history.undo().is_none());
            assert_eq!(history.balance(), Decimal::ZERO);
            assert_eq!(history.position(), None);
        }
    }

    #[test]
    fn test_repeated_redo_past_tail_is_noop() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 50));
        history.insert(deposit(2, 25));

        for _ in 0..3 {
            assert!(history.redo().is_none());
            assert_eq!(history.balance(), Decimal::new(75, 0));
            assert_eq!(history.position(), Some(1));
        }
    }

    #[test]
    fn test_insert_makes_undone_suffix_unreachable() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.insert(deposit(2, 50));
        history.undo().unwrap();

        history.insert(deposit(3, 20));

        assert!(history.redo().is_none());
        assert_eq!(history.balance(), Decimal::new(120, 0));
        assert_eq!(visible_ids(&history), vec![1, 3]);
        // the abandoned node is still in the history, just out of reach
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_undo_skips_already_undone_nodes() {
        let mut history = HistoryCursor::new();
        history.reload(vec![
            deposit(1, 100),
            tx(2, TransactionKind::Deposit, 50, TransactionStatus::Undone),
            deposit(3, 10),
        ]);
        assert_eq!(history.balance(), Decimal::new(110, 0));

        assert_eq!(history.undo().unwrap().id, 3);
        assert_eq!(history.position(), Some(1));

        // node 2 is already undone, so the next undo lands on node 1
        assert_eq!(history.undo().unwrap().id, 1);
        assert_eq!(history.position(), None);
        assert_eq!(history.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_redo_from_before_undone_node_lands_on_it() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.insert(deposit(2, 50));
        history.insert(deposit(3, 10));
        history.undo().unwrap();
        history.undo().unwrap();
        assert_eq!(history.position(), Some(0));

        let redone = history.redo().unwrap();
        assert_eq!(redone.id, 2);
        assert_eq!(history.position(), Some(1));
        assert_eq!(history.balance(), Decimal::new(150, 0));
    }

    #[test]
    fn test_redo_from_before_start_checks_head() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.undo().unwrap();
        assert_eq!(history.position(), None);

        assert_eq!(history.redo().unwrap().id, 1);
        assert_eq!(history.position(), Some(0));
    }

    #[test]
    fn test_redo_walks_forward_one_node_at_a_time() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 1));
        history.insert(deposit(2, 2));
        history.insert(deposit(3, 3));
        history.undo().unwrap();
        history.undo().unwrap();
        history.undo().unwrap();
        assert_eq!(history.redo().unwrap().id, 1);
        assert_eq!(history.redo().unwrap().id, 2);
        assert_eq!(history.redo().unwrap().id, 3);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_nodes_after_cursor_are_withheld() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.insert(withdraw(2, 30));
        history.insert(deposit(3, 5));
        history.undo().unwrap();
        history.undo().unwrap();
        history.redo().unwrap();

        // node 3 is undone and after the cursor
        assert_eq!(history.position(), Some(1));
        assert_eq!(visible_ids(&history), vec![1, 2]);
        assert_eq!(history.balance(), Decimal::new(70, 0));
    }

    #[test]
    fn test_reload_orders_by_created_at_then_id() {
        let mut history = HistoryCursor::new();
        let same_time = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let mut late = deposit(1, 1);
        late.created_at = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
        let mut tie_b = deposit(7, 2);
        tie_b.created_at = same_time;
        let mut tie_a = deposit(5, 3);
        tie_a.created_at = same_time;

        history.reload(vec![late, tie_b, tie_a]);

        let order: Vec<u64> = history.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![5, 7, 1]);
        assert_eq!(history.current().unwrap().id, 1);
    }

    #[test]
    fn test_reload_replaces_previous_state() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.undo().unwrap();

        history.reload(vec![deposit(10, 5), withdraw(11, 2)]);

        assert_eq!(history.len(), 2);
        assert_eq!(history.position(), Some(1));
        assert_eq!(history.balance(), Decimal::new(3, 0));
    }

    #[test]
    fn test_reload_with_undone_tail_keeps_cursor_at_tail() {
        let mut history = HistoryCursor::new();
        history.reload(vec![
            deposit(1, 100),
            tx(2, TransactionKind::Withdraw, 30, TransactionStatus::Undone),
        ]);

        assert_eq!(history.current().unwrap().id, 2);
        assert_eq!(history.balance(), Decimal::new(100, 0));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_with_failed_commit_changes_nothing() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.insert(withdraw(2, 30));

        let result = history.undo_with(|_| Err("write failed"));

        assert_eq!(result, Err("write failed"));
        assert_eq!(history.position(), Some(1));
        assert!(history.iter().all(Transaction::is_active));
        assert_eq!(history.balance(), Decimal::new(70, 0));
    }

    #[test]
    fn test_redo_with_failed_commit_changes_nothing() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.undo().unwrap();

        let result = history.redo_with(|_| Err("write failed"));

        assert_eq!(result, Err("write failed"));
        assert_eq!(history.position(), None);
        assert_eq!(history.peek_redo().unwrap().id, 1);
    }

    #[test]
    fn test_commit_sees_target_before_mutation() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));

        let mut seen = None;
        history
            .undo_with(|target| {
                seen = Some((target.id, target.status));
                Ok::<(), ()>(())
            })
            .unwrap();

        assert_eq!(seen, Some((1, TransactionStatus::Active)));
    }

    #[rstest]
    #[case::all_deposits(&[(TransactionKind::Deposit, 10), (TransactionKind::Deposit, 5)], 15)]
    #[case::mixed(&[(TransactionKind::Deposit, 10), (TransactionKind::Withdraw, 4)], 6)]
    #[case::single_withdraw(&[(TransactionKind::Withdraw, 7)], -7)]
    fn test_balance_sums_signed_amounts(
        #[case] entries: &[(TransactionKind, i64)],
        #[case] expected: i64,
    ) {
        let mut history = HistoryCursor::new();
        for (i, (kind, amount)) in entries.iter().enumerate() {
            history.insert(tx(i as u64 + 1, *kind, *amount, TransactionStatus::Active));
        }
        assert_eq!(history.balance(), Decimal::new(expected, 0));
    }

    #[test]
    fn test_visible_transactions_is_restartable() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 1));
        history.insert(deposit(2, 2));

        let first: Vec<u64> = visible_ids(&history);
        let second: Vec<u64> = visible_ids(&history);
        assert_eq!(first, second);
    }
    fn huge(id: u64, kind: TransactionKind) -> Transaction {
        Transaction {
            amount: Decimal::MAX,
            ..tx(id, kind, 0, TransactionStatus::Active)
        }
    }

    #[test]
    fn test_balance_out_of_range_saturates_and_checked_reports_none() {
        let mut history = HistoryCursor::new();
        history.reload(vec![
            huge(1, TransactionKind::Deposit),
            huge(2, TransactionKind::Deposit),
        ]);

        assert_eq!(history.checked_balance(), None);
        assert_eq!(history.balance(), Decimal::MAX);
    }

    #[test]
    fn test_balance_after_undo_is_a_prefix_of_the_current_sum() {
        let mut history = HistoryCursor::new();
        history.insert(huge(1, TransactionKind::Deposit));
        history.insert(huge(2, TransactionKind::Withdraw));
        history.insert(huge(3, TransactionKind::Deposit));
        assert_eq!(history.checked_balance(), Some(Decimal::MAX));

        assert_eq!(history.checked_balance_after_undo(), Some(Decimal::ZERO));
        history.undo().unwrap();
        assert_eq!(history.checked_balance(), Some(Decimal::ZERO));

        assert_eq!(history.checked_balance_after_undo(), Some(Decimal::MAX));
        history.undo().unwrap();
        assert_eq!(history.checked_balance(), Some(Decimal::MAX));
    }

    #[test]
    fn test_balance_after_redo_matches_redo() {
        let mut history = HistoryCursor::new();
        history.insert(deposit(1, 100));
        history.insert(withdraw(2, 30));
        assert_eq!(history.checked_balance_after_redo(), Some(Decimal::new(70, 0)));

        history.undo().unwrap();
        assert_eq!(history.checked_balance_after_redo(), Some(Decimal::new(70, 0)));
        history.redo().unwrap();
        assert_eq!(history.checked_balance(), Some(Decimal::new(70, 0)));
    }

    #[test]
    fn test_balance_after_redo_detects_overflow() {
        let mut history = HistoryCursor::new();
        history.reload(vec![
            huge(1, TransactionKind::Deposit),
            Transaction {
                status: TransactionStatus::Undone,
                ..huge(2, TransactionKind::Deposit)
            },
        ]);
        history.undo().unwrap();
        history.redo().unwrap();
        assert_eq!(history.position(), Some(0));

        assert_eq!(history.checked_balance_after_redo(), None);
        assert_eq!(history.checked_balance(), Some(Decimal::MAX));
    }
}
