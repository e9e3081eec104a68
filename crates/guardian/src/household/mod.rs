//! Household records: supplies and family members.
//!
//! Both are flat lists kept as one stored document each and rewritten in full
//! on every change.

pub mod family;
pub mod inventory;

pub use family::{Family, FamilyMember, NewMember};
pub use inventory::{expiry_status, ExpiryStatus, Inventory, InventoryItem, ItemCategory, NewItem};
