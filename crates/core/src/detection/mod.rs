pub mod binding_adapter;
pub mod domain;
pub mod infrastructure;
