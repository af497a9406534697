pub mod crop_meta;
pub mod nutrient;
pub mod product;
pub mod project;
pub mod recommendation;
pub mod reference_table;
pub mod rule;
pub mod schedule;
pub mod trace;

pub use crop_meta::*;
pub use nutrient::*;
pub use product::*;
pub use project::*;
pub use recommendation::*;
pub use reference_table::*;
pub use rule::*;
pub use schedule::*;
pub use trace::*;
