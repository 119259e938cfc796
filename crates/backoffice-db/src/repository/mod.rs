//! # Repository Module
//!
//! Row mapping for the back office tables.
//!
//! ## Two Access Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Plain reads                                                            │
//! │    db.products().list_available()                                      │
//! │    └── acquires a pooled connection, runs one query                     │
//! │                                                                         │
//! │  Inside an engine operation                                             │
//! │    fetch_order(&mut tx, id) / save_order(&mut tx, &order)               │
//! │    └── crate-private functions over the caller's transaction            │
//! │                                                                         │
//! │  Both paths share the same SQL, so a read inside a transaction sees     │
//! │  exactly what a plain read would after commit.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`ProductRepository`](product::ProductRepository) - products and stock levels
//! - [`OrderRepository`](order::OrderRepository) - order headers and line items

pub mod order;
pub mod product;
