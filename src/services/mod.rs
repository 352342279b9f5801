pub mod catalog;
pub mod efficiency;
pub mod equipment_selector;
pub mod estimator;
pub mod size_resolver;
pub mod sizing_service;
