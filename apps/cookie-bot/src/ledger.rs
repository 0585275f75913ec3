use std::collections::HashMap;
use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A transfer the ledger refused. Nothing was written when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("You can only send a positive number of cookies.")]
    NonPositiveAmount,

    #[error("You can't send cookies to yourself.")]
    SelfTransfer,

    #[error("You only have {balance} cookies, so you can't send {amount}.")]
    InsufficientBalance { balance: i64, amount: i64 },

    #[error("That many cookies won't fit in the jar.")]
    Overflow,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("transfer rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("no cookie account for user {0}")]
    UnknownAccount(u64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// How the ledger treats a sender who can't cover a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverdraftPolicy {
    /// Refuse transfers larger than the sender's balance.
    #[default]
    Reject,
    /// Let balances go negative.
    Allow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub user_id: u64,
    pub balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub before: i64,
    pub after: i64,
}

/// Both sides of an applied transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub sender: BalanceChange,
    pub recipient: BalanceChange,
}

/// Durable cookie balances keyed by Discord user id.
///
/// Cloning is cheap: clones share the pool and the write lock. All writes go
/// through the write lock, reads hit the pool directly.
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
    policy: OverdraftPolicy,
    write_lock: Arc<Mutex<()>>,
}

impl Ledger {
    pub fn new(pool: SqlitePool, policy: OverdraftPolicy) -> Self {
        Self {
            pool,
            policy,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn policy(&self) -> OverdraftPolicy {
        self.policy
    }

    /// Every known account and its balance.
    pub async fn get_all_balances(&self) -> Result<HashMap<u64, i64>, LedgerError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as("SELECT user_id, n_cookies FROM cookie_scores")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, balance)| (from_row_id(user_id), balance))
            .collect())
    }

    /// Create a zero-balance account for `user_id` unless one exists.
    pub async fn ensure_account(&self, user_id: u64) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut conn = self.pool.acquire().await?;
        insert_if_absent(&mut conn, user_id).await?;
        Ok(())
    }

    /// Overwrite the balance of an existing account.
    ///
    /// Returns [`LedgerError::UnknownAccount`] if `ensure_account` was never
    /// called for `user_id`.
    pub async fn set_balance(&self, user_id: u64, balance: i64) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut conn = self.pool.acquire().await?;
        if write_balance(&mut conn, user_id, balance).await? == 0 {
            return Err(LedgerError::UnknownAccount(user_id));
        }
        Ok(())
    }

    /// Balance of `user_id`, or 0 for a user the ledger has never seen.
    ///
    /// Querying never creates an account.
    pub async fn balance(&self, user_id: u64) -> Result<i64, LedgerError> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT n_cookies FROM cookie_scores WHERE user_id = ?")
                .bind(to_row_id(user_id))
                .fetch_optional(&self.pool)
                .await?;

        Ok(balance.unwrap_or(0))
    }

    /// All accounts, poorest first. Ties are ordered by user id.
    pub async fn leaderboard(&self) -> Result<Vec<Account>, LedgerError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT user_id, n_cookies FROM cookie_scores ORDER BY n_cookies ASC, user_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, balance)| Account {
                user_id: from_row_id(user_id),
                balance,
            })
            .collect())
    }

    /// Move `amount` cookies from `sender` to `recipient` in one transaction.
    ///
    /// Both accounts are created if needed. On any error the transaction is
    /// rolled back and neither account is touched.
    pub async fn transfer(
        &self,
        sender: u64,
        recipient: u64,
        amount: i64,
    ) -> Result<Transfer, LedgerError> {
        if amount <= 0 {
            return Err(Rejection::NonPositiveAmount.into());
        }
        if sender == recipient {
            return Err(Rejection::SelfTransfer.into());
        }

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        insert_if_absent(&mut tx, sender).await?;
        insert_if_absent(&mut tx, recipient).await?;

        let sender_before = read_balance(&mut tx, sender).await?;
        let recipient_before = read_balance(&mut tx, recipient).await?;

        let transfer = apply(self.policy, sender_before, recipient_before, amount)?;

        write_balance(&mut tx, sender, transfer.sender.after).await?;
        write_balance(&mut tx, recipient, transfer.recipient.after).await?;

        tx.commit().await?;

        info!(
            sender,
            recipient,
            amount,
            sender_balance = transfer.sender.after,
            recipient_balance = transfer.recipient.after,
            "Cookies transferred"
        );

        Ok(transfer)
    }

    /// Close the underlying pool. Pending operations finish first.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Ledger pool closed");
    }
}

/// Validate a transfer against the current balances and compute the new ones.
fn apply(
    policy: OverdraftPolicy,
    sender_before: i64,
    recipient_before: i64,
    amount: i64,
) -> Result<Transfer, Rejection> {
    if policy == OverdraftPolicy::Reject && sender_before < amount {
        return Err(Rejection::InsufficientBalance {
            balance: sender_before,
            amount,
        });
    }

    let sender_after = sender_before
        .checked_sub(amount)
        .ok_or(Rejection::Overflow)?;
    let recipient_after = recipient_before
        .checked_add(amount)
        .ok_or(Rejection::Overflow)?;

    Ok(Transfer {
        sender: BalanceChange {
            before: sender_before,
            after: sender_after,
        },
        recipient: BalanceChange {
            before: recipient_before,
            after: recipient_after,
        },
    })
}

// Snowflakes are stored bit-for-bit in SQLite's signed INTEGER column.
fn to_row_id(user_id: u64) -> i64 {
    user_id as i64
}

fn from_row_id(row_id: i64) -> u64 {
    row_id as u64
}

async fn insert_if_absent(conn: &mut SqliteConnection, user_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO cookie_scores (user_id, n_cookies) VALUES (?, 0) \
         ON CONFLICT(user_id) DO NOTHING",
    )
    .bind(to_row_id(user_id))
    .execute(conn)
    .await?;
    Ok(())
}

async fn read_balance(conn: &mut SqliteConnection, user_id: u64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT n_cookies FROM cookie_scores WHERE user_id = ?")
        .bind(to_row_id(user_id))
        .fetch_one(conn)
        .await
}

/// Returns the number of rows updated (0 if the account doesn't exist).
async fn write_balance(
    conn: &mut SqliteConnection,
    user_id: u64,
    balance: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE cookie_scores SET n_cookies = ? WHERE user_id = ?")
        .bind(balance)
        .bind(to_row_id(user_id))
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
