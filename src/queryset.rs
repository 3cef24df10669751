//! Query collaborators for relation fields
//!
//! [`QuerySet`] is the single-object lookup a field performs when it turns a
//! matched URL back into an object. [`RelatedAccessors`] is the model-side
//! table of related managers a router field reads its queryset from.

use crate::error::{RelationError, RelationResult};
use crate::lookup::{AttributeValue, LookupTarget, lookup_attribute, url_text};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Field lookups applied by [`QuerySet::get`], e.g. `{pk: 5, parent: 2}`
pub type LookupKwargs = BTreeMap<String, Value>;

/// Separator for lookups that span a relation (`parent__slug`)
pub const LOOKUP_SEP: &str = "__";

/// A filterable handle over stored objects
pub trait QuerySet<T>: Send + Sync {
	/// Fetch exactly one object matching every lookup
	///
	/// Returns [`RelationError::ObjectNotFound`] for zero matches and
	/// [`RelationError::MultipleObjectsReturned`] for more than one.
	fn get(&self, lookup: &LookupKwargs) -> RelationResult<T>;
}

/// Related managers of a model, keyed by accessor name
pub trait RelatedAccessors<T>: Send + Sync {
	fn related_queryset(&self, accessor: &str) -> Option<Arc<dyn QuerySet<T>>>;
}

/// Registry-backed [`RelatedAccessors`]
pub struct ModelRelations<T> {
	model_name: String,
	accessors: HashMap<String, Arc<dyn QuerySet<T>>>,
}

impl<T> ModelRelations<T> {
	pub fn new(model_name: impl Into<String>) -> Self {
		Self {
			model_name: model_name.into(),
			accessors: HashMap::new(),
		}
	}

	/// Register the related manager reachable through `accessor`
	pub fn with_accessor(
		mut self,
		accessor: impl Into<String>,
		queryset: Arc<dyn QuerySet<T>>,
	) -> Self {
		self.accessors.insert(accessor.into(), queryset);
		self
	}

	pub fn model_name(&self) -> &str {
		&self.model_name
	}
}

impl<T> RelatedAccessors<T> for ModelRelations<T> {
	fn related_queryset(&self, accessor: &str) -> Option<Arc<dyn QuerySet<T>>> {
		self.accessors.get(accessor).cloned()
	}
}

/// Read a lookup path such as `parent__pk` from an object
///
/// A bare relation name compares against the related object's primary key,
/// so `parent=2` matches an object whose parent has pk 2.
pub fn lookup_path(target: &dyn LookupTarget, path: &str) -> AttributeValue {
	let mut current = target;
	let mut parts = path.split(LOOKUP_SEP).peekable();

	while let Some(part) = parts.next() {
		if parts.peek().is_none() {
			let value = lookup_attribute(current, part);
			if value.exists() {
				return value;
			}
			return match current.related(part) {
				Some(related) => AttributeValue::from(related.primary_key()),
				None => AttributeValue::Missing,
			};
		}
		match current.related(part) {
			Some(related) => current = related,
			None => return AttributeValue::Null,
		}
	}
	AttributeValue::Missing
}

fn describe_lookup(lookup: &LookupKwargs) -> String {
	let pairs: Vec<String> = lookup
		.iter()
		.map(|(name, value)| format!("{}={}", name, value))
		.collect();
	format!("{{{}}}", pairs.join(", "))
}

/// Vector-backed [`QuerySet`]
///
/// Values compare by their URL text, so the string `"5"` captured from a
/// path matches an integer key `5`.
#[derive(Debug, Clone)]
pub struct InMemoryQuerySet<T> {
	objects: Vec<T>,
}

impl<T> InMemoryQuerySet<T>
where
	T: LookupTarget + Clone,
{
	pub fn new(objects: Vec<T>) -> Self {
		Self { objects }
	}

	pub fn push(&mut self, object: T) {
		self.objects.push(object);
	}

	pub fn len(&self) -> usize {
		self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	/// All objects matching every lookup
	pub fn filter(&self, lookup: &LookupKwargs) -> Vec<&T> {
		self.objects
			.iter()
			.filter(|object| {
				lookup
					.iter()
					.all(|(path, expected)| Self::matches(*object, path, expected))
			})
			.collect()
	}

	fn matches(object: &T, path: &str, expected: &Value) -> bool {
		let expected = url_text(expected);
		match lookup_path(object, path) {
			AttributeValue::Present(actual) => url_text(&actual) == expected,
			AttributeValue::Null | AttributeValue::Missing => expected.is_none(),
		}
	}
}

impl<T> QuerySet<T> for InMemoryQuerySet<T>
where
	T: LookupTarget + Clone,
{
	fn get(&self, lookup: &LookupKwargs) -> RelationResult<T> {
		let found = self.filter(lookup);
		match found.as_slice() {
			[object] => Ok((*object).clone()),
			[] => Err(RelationError::ObjectNotFound {
				lookup: describe_lookup(lookup),
			}),
			many => Err(RelationError::MultipleObjectsReturned {
				count: many.len(),
				lookup: describe_lookup(lookup),
			}),
		}
	}
}
