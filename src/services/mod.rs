pub mod counts;
pub mod locations;
pub mod reservations;
pub mod stock;
