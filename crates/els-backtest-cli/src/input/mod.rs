pub mod csv_prices;
pub mod file;
pub mod product;
pub mod stdin;
