pub mod evaluate;
pub mod plan;
