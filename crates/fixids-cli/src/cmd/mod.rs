pub mod rewrite;
pub mod tag;
pub mod validate;
