//! Hyperlinked relation fields
//!
//! - [`HyperlinkedRelatedField`]: link by a single lookup value
//! - [`NestedHyperlinkedRelatedField`]: link to an object nested under its parent
//! - [`HyperlinkedRouterField`]: link to the nested collection of a parent

pub mod binding;
pub mod hyperlinked;
pub mod nested;
pub mod router;

pub use binding::FieldBinding;
pub use hyperlinked::{HyperlinkOptions, HyperlinkedLookup, HyperlinkedRelatedField};
pub use nested::{DEFAULT_PARENT_LOOKUP_FIELD, NestedHyperlinkedRelatedField, NestedLookupOptions};
pub use router::{HyperlinkedRouterField, LookupAccessor};
