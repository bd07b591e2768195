//! Client-side lookup controllers: search-as-you-type and the selected movie's detail.

mod controller;
mod detail;

pub use controller::{SearchController, SearchSettings, SearchState};
pub use detail::{DetailController, DetailState};
