//! Repository trait implementations for the SQLite database.
//!
//! This module contains the implementations of all repository traits
//! defined in `ledger-core` for the SQLite database backend.

use crate::Db;
use ledger_core::ports::{LedgerRepository, Repository};

mod currency;
mod identity;
mod price;
mod reconciliation;

impl Repository for Db {
    type Error = crate::StoreError;
}

impl LedgerRepository for Db {}
