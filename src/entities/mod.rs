//! Sea-ORM entities for the stock engine.
//!
//! Every entity keys on a `Uuid` id and carries ISO-8601 timestamps; ids and
//! timestamps are stamped in `ActiveModelBehavior::before_save` so callers
//! never have to set them by hand.

pub mod inventory_count;
pub mod quotation;
pub mod quotation_line;
pub mod rack_group;
pub mod rack_level;
pub mod rack_slot;
pub mod stock_item;
pub mod stock_movement;
pub mod stock_reservation;
pub mod warehouse;
