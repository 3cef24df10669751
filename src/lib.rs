//! # Reinhardt Nested
//!
//! Hyperlinked relation fields for nested resources, in the style of Django
//! REST Framework's nested routers.
//!
//! Nested resources are addressed through their parent, e.g.
//! `/parents/{parent_pk}/children/{pk}/`. The fields in this crate build such
//! URLs from objects and resolve them back to objects:
//!
//! - [`NestedHyperlinkedRelatedField`] links to a nested object using both its
//!   own and its parent's lookup value
//! - [`HyperlinkedRouterField`] links a parent to its nested collection
//!
//! URL reversal, URL resolution and queryset lookups are collaborators
//! ([`UrlReverser`], [`UrlResolver`], [`QuerySet`]); [`RouteTable`] and
//! [`InMemoryQuerySet`] implement them for standalone use.
//!
//! ## Example
//!
//! ```
//! use reinhardt_nested::{
//!     HyperlinkedLookup, InMemoryQuerySet, LookupTarget,
//!     NestedHyperlinkedRelatedField, RouteTable,
//! };
//! use serde_json::{Value, json};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Parent {
//!     id: i64,
//! }
//!
//! impl LookupTarget for Parent {
//!     fn primary_key(&self) -> Option<Value> {
//!         Some(json!(self.id))
//!     }
//! }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Child {
//!     id: i64,
//!     parent: Option<Parent>,
//! }
//!
//! impl LookupTarget for Child {
//!     fn primary_key(&self) -> Option<Value> {
//!         Some(json!(self.id))
//!     }
//!
//!     fn related(&self, name: &str) -> Option<&dyn LookupTarget> {
//!         match name {
//!             "parent" => self.parent.as_ref().map(|p| p as &dyn LookupTarget),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let routes = Arc::new(
//!     RouteTable::new().with_path("child-detail", "/parents/{parent_pk}/children/{pk}/"),
//! );
//! let child = Child { id: 5, parent: Some(Parent { id: 2 }) };
//!
//! let field = NestedHyperlinkedRelatedField::<Child>::new("child-detail", routes.clone())
//!     .parent_lookup_url_kwarg("parent_pk")
//!     .resolver(routes)
//!     .queryset(Arc::new(InMemoryQuerySet::new(vec![child.clone()])));
//!
//! let url = field.to_representation(&child, None, None).unwrap();
//! assert_eq!(url, json!("/parents/2/children/5/"));
//! assert_eq!(field.to_internal_value(&url, None).unwrap(), child);
//! ```

pub mod error;
pub mod lookup;
pub mod queryset;
pub mod relations;
pub mod urls;

pub use error::{HyperlinkValidationError, JsonKind, RelationError, RelationResult};
pub use lookup::{
	AttributeValue, BoundRelation, LookupTarget, PK, PkOnlyObject, UrlKwargs, ViewKwargs,
	lookup_attribute, url_text,
};
pub use queryset::{
	InMemoryQuerySet, LOOKUP_SEP, LookupKwargs, ModelRelations, QuerySet, RelatedAccessors,
	lookup_path,
};
pub use relations::{
	DEFAULT_PARENT_LOOKUP_FIELD, FieldBinding, HyperlinkOptions, HyperlinkedLookup,
	HyperlinkedRelatedField, HyperlinkedRouterField, LookupAccessor, NestedHyperlinkedRelatedField,
	NestedLookupOptions,
};
pub use urls::{RequestContext, ResolverMatch, RouteTable, UrlResolver, UrlReverser};
