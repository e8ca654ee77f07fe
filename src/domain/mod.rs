pub mod article;
pub mod source;

pub use article::{Article, ArticleState, ParsedContent};
pub use source::{Brand, Source};
