mod brand;
mod collection;
mod color;
mod envelope;
mod product;
mod product_type;
mod query;
mod style;
mod variant;

pub use brand::*;
pub use collection::*;
pub use color::*;
pub use envelope::*;
pub use product::*;
pub use product_type::*;
pub use query::*;
pub use style::*;
pub use variant::*;
