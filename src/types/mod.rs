pub mod date_window;
pub mod endpoint;
pub mod location;
pub mod observation;
