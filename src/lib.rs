//! Viktor — menu-driven Telegram assistant for a youth activity center.
//!
//! Visitors browse clubs, book master-classes, request package tours and
//! contact support; the administrator maintains the masterclass catalog.
//! The core is [`engine::ConversationEngine`], a per-user finite-state
//! machine over typed events; transport and storage are collaborators
//! behind the [`channels::Channel`] and [`catalog::CatalogStore`] traits.

pub mod catalog;
pub mod channels;
pub mod config;
pub mod engine;
pub mod error;
