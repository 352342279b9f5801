pub mod api;
pub mod equipment;
pub mod site;
pub mod sizing;
