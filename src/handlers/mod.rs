pub mod counts;
pub mod health;
pub mod quotations;
pub mod racks;
pub mod reports;
pub mod stock;
pub mod warehouses;
