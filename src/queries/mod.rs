pub mod collection_queries;
pub mod filters;
pub mod product_queries;
pub mod relations;
pub mod repository;
pub mod variant_queries;
