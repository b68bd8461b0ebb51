pub mod model;
pub mod pagination;
