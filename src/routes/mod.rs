pub mod sizing_routes;
