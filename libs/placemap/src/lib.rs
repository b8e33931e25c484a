pub mod carousel;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod geo;
pub mod lookup;
pub mod marker;
pub mod reactive;
pub mod surface;
pub mod venue;
pub mod view;

pub use error::*;
pub use gateway::*;
pub use geo::*;
pub use lookup::*;
pub use view::*;
