pub mod api;
pub mod bots;
pub mod category;
pub mod config;
pub mod crosswiki;
pub mod error;
pub mod intersect;
pub mod mutation;
pub mod pagelist;
pub mod params;
pub mod policy;
pub mod presets;
pub mod runner;
pub mod scanner;
pub mod titles;
pub mod wikiproject;

#[cfg(test)]
mod testing;
