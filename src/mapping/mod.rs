pub mod identity;
pub mod normalize;
pub mod taxonomy;

pub use identity::IdentityResolver;
pub use normalize::{extract_comments, Normalizer};
pub use taxonomy::TaxonomyMapper;
