// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy shared by every ledger and portfolio operation.
//!
//! Each variant belongs to one [`ErrorCategory`] so a front end can map
//! failures to distinct responses without string matching.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::TransactionStatus;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or contradictory input, rejected before any mutation.
    Validation,
    /// The request conflicts with a ledger invariant; nothing was changed.
    Invariant,
    NotFound,
    /// The price feed failed or answered with garbage.
    External,
    Storage,
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Stock '{0}' is not active and cannot be added")]
    InactiveStock(String),
    #[error("Insufficient funds: balance {balance} is less than {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },
    #[error("Maximum of {0} accounts allowed per user")]
    MaxAccountsExceeded(usize),
    #[error("An account named '{0}' already exists")]
    DuplicateName(String),
    #[error("Cannot delete your only account")]
    SoleAccount,
    #[error("Cannot delete account with existing transactions")]
    HasTransactions,
    #[error("Cannot unset default on the only account")]
    DefaultRequired,
    #[error("Transaction {id} is already {status} and cannot move to {requested}")]
    AlreadyTerminal {
        id: String,
        status: TransactionStatus,
        requested: TransactionStatus,
    },
    #[error("Transaction {0} is completed; amount, type and account are immutable and it cannot be deleted")]
    CompletedImmutable(String),
    #[error("{0} already exists")]
    DuplicateEntry(String),
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Price feed failure: {0}")]
    PriceFeed(String),
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::InactiveStock(_) => ErrorCategory::Validation,
            Self::InsufficientFunds { .. }
            | Self::MaxAccountsExceeded(_)
            | Self::DuplicateName(_)
            | Self::SoleAccount
            | Self::HasTransactions
            | Self::DefaultRequired
            | Self::AlreadyTerminal { .. }
            | Self::CompletedImmutable(_)
            | Self::DuplicateEntry(_) => ErrorCategory::Invariant,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::PriceFeed(_) => ErrorCategory::External,
            Self::Corrupt(_) | Self::Serialization(_) | Self::Storage(_) => ErrorCategory::Storage,
        }
    }
}
