//! # Repository Module
//!
//! Database repository implementations for the arbitrage desk.
//!
//! ## Write-Through Persistence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The in-memory RecordStore / MappingMemory are the working copies.      │
//! │  Every mutation the desk performs on them is mirrored here:             │
//! │                                                                         │
//! │  store.replace(channel, category, rows) ─► records().replace(..)        │
//! │  store.append(rows)                     ─► records().append(..)         │
//! │  store.clear()                          ─► records().clear()            │
//! │  memory.remember(sig, mapping, label)   ─► mappings().upsert(..)        │
//! │  store.add_channel(category, name)      ─► channels().add(..)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`records::RecordRepository`] - Accumulated domain records
//! - [`channels::ChannelRepository`] - Per-category channel lists
//! - [`mappings::MappingRepository`] - Remembered column mappings

pub mod channels;
pub mod mappings;
pub mod records;
