pub mod apply;
pub mod destroy;
pub mod plan;
pub mod refresh;
pub mod validate;
