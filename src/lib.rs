//! Family budget: a shared household budget for up to four members
//!
//! Members record income and expenses against a common budget. Every member
//! has their own balance card and the budget keeps the total. Categories,
//! spending limits and savings goals belong to the budget. Data lives in
//! JSON collections in a data directory that several processes may share;
//! the change feed and [`sync::LiveState`] keep an open surface current.
//!
//! # Architecture
//!
//! - `config`: data directory and persisted settings
//! - `error`: the crate error type
//! - `models`: users, budgets, transactions, categories, goals, limits
//! - `storage`: JSON collections, batched writes and the change feed
//! - `services`: the operations surfaces call
//! - `auth`: local accounts and the saved session
//! - `currency`: exchange rates, conversion and formatting
//! - `local`: machine-local preferences, cache and drafts
//! - `sync`: live state fed by subscriptions
//! - `audit`, `backup`, `export`: history, snapshots and exports
//! - `cli`, `tui`, `display`: the surfaces
//!
//! # Example
//!
//! ```rust,ignore
//! use family_budget::config::{BudgetPaths, Settings};
//! use family_budget::storage::Storage;
//!
//! let paths = BudgetPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod auth;
pub mod backup;
pub mod cli;
pub mod config;
pub mod currency;
pub mod display;
pub mod error;
pub mod export;
pub mod local;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod sync;
pub mod tui;
pub mod validation;

pub use error::{BudgetError, BudgetResult};
