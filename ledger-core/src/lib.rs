#![warn(missing_docs)]
//! Domain models and repository ports for the agency ledger engine.
//!
//! The ledger engine is the financial core of an agency back office. It
//! converts monetary amounts between currencies using time-dated exchange
//! rates, maintains a temporally-versioned price history for catalog items,
//! computes agency profit for a budget under configurable margin policies,
//! and reconciles money flow per budget: amounts invoiced, collected from
//! the client, owed to providers, and profit available for internal draws.
//!
//! This crate is persistence-free. The [`ports`] module defines the trait
//! contracts a storage backend must satisfy; `ledger-sqlite` provides a
//! reference implementation.

/// Core domain models for the ledger engine.
///
/// The models in this module are primarily data structures with the pure
/// business logic that operates on them (money arithmetic, the margin
/// calculator). Persistence and transactional behavior live behind the
/// traits in [`ports`].
pub mod models;

/// Interface traits for the ledger engine.
///
/// This module contains the "ports" in the hexagonal architecture pattern.
///
/// These traits define the contract between the domain logic and external
/// adapters (the relational store, the actor/identity service) without
/// specifying implementation details. Operations that are pure composition
/// over other port methods (currency conversion, bulk repricing, the
/// budget financial summary) ship as provided methods so every backend
/// inherits identical semantics.
pub mod ports;
