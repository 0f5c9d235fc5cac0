//! Command-line front end for grid-harvest: menu, config resolution, summaries and doctor.

pub mod config;
pub mod doctor;
pub mod menu;
pub mod summary;
