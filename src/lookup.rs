//! Lookup capabilities for linkable objects
//!
//! Fields never introspect objects. Anything that can be hyperlinked
//! implements [`LookupTarget`], which exposes the primary key, named
//! attributes and named relations explicitly.

use serde_json::Value;
use std::collections::BTreeMap;

/// Name that always resolves to [`LookupTarget::primary_key`]
pub const PK: &str = "pk";

/// Keyword arguments handed to the URL reverser
///
/// A `Value::Null` entry stands for an identifier that could not be read,
/// e.g. the parent of an orphaned object.
pub type UrlKwargs = BTreeMap<String, Value>;

/// Keyword arguments captured by the URL resolver
pub type ViewKwargs = BTreeMap<String, String>;

/// Result of reading a named attribute from an object
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
	/// The object has no such attribute
	Missing,
	/// The attribute exists but holds no value
	Null,
	/// The attribute holds a value
	Present(Value),
}

impl AttributeValue {
	/// Whether the object exposes this attribute at all
	pub fn exists(&self) -> bool {
		!matches!(self, AttributeValue::Missing)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, AttributeValue::Null)
	}

	/// Convert into an optional value, folding `Missing` and `Null` together
	pub fn into_value(self) -> Option<Value> {
		match self {
			AttributeValue::Present(value) => Some(value),
			_ => None,
		}
	}
}

impl From<Option<Value>> for AttributeValue {
	fn from(value: Option<Value>) -> Self {
		match value {
			None | Some(Value::Null) => AttributeValue::Null,
			Some(value) => AttributeValue::Present(value),
		}
	}
}

impl From<Value> for AttributeValue {
	fn from(value: Value) -> Self {
		AttributeValue::from(Some(value))
	}
}

/// An object that relation fields can identify and link to
///
/// # Examples
///
/// ```
/// use reinhardt_nested::{AttributeValue, LookupTarget, lookup_attribute};
/// use serde_json::{Value, json};
///
/// struct Parent {
///     id: Option<i64>,
///     slug: String,
/// }
///
/// impl LookupTarget for Parent {
///     fn primary_key(&self) -> Option<Value> {
///         self.id.map(Value::from)
///     }
///
///     fn attribute(&self, name: &str) -> AttributeValue {
///         match name {
///             "slug" => json!(self.slug).into(),
///             _ => AttributeValue::Missing,
///         }
///     }
/// }
///
/// let parent = Parent { id: Some(2), slug: "home".to_string() };
/// assert_eq!(lookup_attribute(&parent, "pk"), AttributeValue::Present(json!(2)));
/// assert!(!lookup_attribute(&parent, "title").exists());
/// ```
pub trait LookupTarget: Send + Sync {
	/// Primary key of the object, `None` while it is unsaved
	fn primary_key(&self) -> Option<Value>;

	/// Read a named attribute other than `pk`
	fn attribute(&self, _name: &str) -> AttributeValue {
		AttributeValue::Missing
	}

	/// Follow a named relation, `None` when the related object is absent
	fn related(&self, _name: &str) -> Option<&dyn LookupTarget> {
		None
	}
}

/// Read an attribute, routing `pk` to the primary key
pub fn lookup_attribute(target: &dyn LookupTarget, name: &str) -> AttributeValue {
	if name == PK {
		return AttributeValue::from(target.primary_key());
	}
	target.attribute(name)
}

/// Render a lookup value the way it appears in a URL path
///
/// Strings are used verbatim; `Null` has no textual form.
pub fn url_text(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) => Some(s.clone()),
		other => Some(other.to_string()),
	}
}

/// Placeholder for a related object of which only the key was loaded
#[derive(Debug, Clone, PartialEq)]
pub struct PkOnlyObject {
	pub pk: Option<Value>,
}

impl PkOnlyObject {
	pub fn new(pk: impl Into<Value>) -> Self {
		let pk = pk.into();
		Self {
			pk: (!pk.is_null()).then_some(pk),
		}
	}

	/// Placeholder for a related object that has not been saved yet
	pub fn unsaved() -> Self {
		Self { pk: None }
	}
}

impl LookupTarget for PkOnlyObject {
	fn primary_key(&self) -> Option<Value> {
		self.pk.clone()
	}
}

/// The value a router field is bound to when serializing
///
/// A router field may be handed the owning object itself, a related
/// manager that wraps the owning instance, or a key-only placeholder.
#[derive(Clone, Copy)]
pub enum BoundRelation<'a> {
	/// The object exposes its own attributes
	Object(&'a dyn LookupTarget),
	/// A wrapper (e.g. a related manager) around an owning instance
	///
	/// `outer` is the wrapper's own attribute view, if it has one.
	Wrapped {
		outer: Option<&'a dyn LookupTarget>,
		instance: &'a dyn LookupTarget,
	},
	/// Only the related object's key was loaded
	PkOnly(&'a PkOnlyObject),
}

impl<'a> BoundRelation<'a> {
	/// Attribute view of the bound value itself
	pub fn direct(&self) -> Option<&'a dyn LookupTarget> {
		match *self {
			BoundRelation::Object(target) => Some(target),
			BoundRelation::Wrapped { outer, .. } => outer,
			BoundRelation::PkOnly(placeholder) => Some(placeholder as &dyn LookupTarget),
		}
	}

	/// The wrapped instance, if the bound value is a wrapper
	pub fn instance(&self) -> Option<&'a dyn LookupTarget> {
		match *self {
			BoundRelation::Wrapped { instance, .. } => Some(instance),
			_ => None,
		}
	}

	pub fn is_pk_only(&self) -> bool {
		matches!(self, BoundRelation::PkOnly(_))
	}
}

impl std::fmt::Debug for BoundRelation<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			BoundRelation::Object(_) => f.write_str("BoundRelation::Object"),
			BoundRelation::Wrapped { .. } => f.write_str("BoundRelation::Wrapped"),
			BoundRelation::PkOnly(placeholder) => {
				write!(f, "BoundRelation::PkOnly({:?})", placeholder.pk)
			}
		}
	}
}

/// Render kwargs for error messages
pub(crate) fn describe_kwargs(kwargs: &UrlKwargs) -> String {
	let pairs: Vec<String> = kwargs
		.iter()
		.map(|(name, value)| format!("'{}': {}", name, value))
		.collect();
	format!("{{{}}}", pairs.join(", "))
}
