//! NestedHyperlinkedRelatedField - hyperlinks to resources nested under a parent
//!
//! A nested resource is addressed through its parent's identifier, e.g.
//! `/parents/{parent_pk}/children/{pk}/`. The field reads both identifiers
//! from the object when building URLs and looks the object up by both when
//! resolving them.

use super::binding::FieldBinding;
use super::hyperlinked::{
	HyperlinkOptions, HyperlinkedLookup, HyperlinkedRelatedField, required_attribute, url_kwarg,
};
use crate::error::RelationResult;
use crate::lookup::{LookupTarget, PK, UrlKwargs, ViewKwargs};
use crate::queryset::{LookupKwargs, QuerySet};
use crate::urls::{RequestContext, UrlResolver, UrlReverser};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Default attribute holding the parent reference
pub const DEFAULT_PARENT_LOOKUP_FIELD: &str = "parent";

/// Parent-related options of a [`NestedHyperlinkedRelatedField`]
///
/// # Examples
///
/// ```
/// use reinhardt_nested::NestedLookupOptions;
///
/// let options: NestedLookupOptions =
///     serde_json::from_str(r#"{"parent_lookup_field": "owner"}"#).unwrap();
/// assert_eq!(options.parent_lookup_url_kwarg(), "owner");
/// assert_eq!(options.parent_lookup_related_field, "pk");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedLookupOptions {
	/// Attribute on the object that holds its parent
	pub parent_lookup_field: String,
	/// Path parameter carrying the parent identifier; defaults to `parent_lookup_field`
	#[serde(skip_serializing_if = "Option::is_none", rename = "parent_lookup_url_kwarg")]
	pub parent_url_kwarg: Option<String>,
	/// Attribute on the parent used as its identifier
	pub parent_lookup_related_field: String,
}

impl Default for NestedLookupOptions {
	fn default() -> Self {
		Self {
			parent_lookup_field: DEFAULT_PARENT_LOOKUP_FIELD.to_string(),
			parent_url_kwarg: None,
			parent_lookup_related_field: PK.to_string(),
		}
	}
}

impl NestedLookupOptions {
	pub fn parent_lookup_url_kwarg(&self) -> &str {
		self.parent_url_kwarg
			.as_deref()
			.unwrap_or(&self.parent_lookup_field)
	}
}

/// Hyperlinked relation to an object living under a parent-scoped URL
///
/// # Examples
///
/// ```
/// use reinhardt_nested::{
///     AttributeValue, LookupTarget, NestedHyperlinkedRelatedField, PkOnlyObject, RouteTable,
/// };
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// struct Child {
///     id: i64,
///     parent: PkOnlyObject,
/// }
///
/// impl LookupTarget for Child {
///     fn primary_key(&self) -> Option<Value> {
///         Some(json!(self.id))
///     }
///
///     fn related(&self, name: &str) -> Option<&dyn LookupTarget> {
///         (name == "parent").then_some(&self.parent as &dyn LookupTarget)
///     }
/// }
///
/// let routes = Arc::new(
///     RouteTable::new().with_path("child-detail", "/parents/{parent_pk}/children/{pk}/"),
/// );
/// let field = NestedHyperlinkedRelatedField::<Child>::new("child-detail", routes)
///     .parent_lookup_url_kwarg("parent_pk");
///
/// let child = Child { id: 5, parent: PkOnlyObject::new(2) };
/// let url = field.get_url(&child, "child-detail", None, None).unwrap();
/// assert_eq!(url.as_deref(), Some("/parents/2/children/5/"));
/// ```
pub struct NestedHyperlinkedRelatedField<T> {
	link: HyperlinkedRelatedField<T>,
	nested: NestedLookupOptions,
}

impl<T> NestedHyperlinkedRelatedField<T> {
	pub fn new(view_name: impl Into<String>, reverser: Arc<dyn UrlReverser>) -> Self {
		Self {
			link: HyperlinkedRelatedField::new(view_name, reverser),
			nested: NestedLookupOptions::default(),
		}
	}

	/// Create a field from deserialized options
	pub fn from_options(
		options: HyperlinkOptions,
		nested: NestedLookupOptions,
		reverser: Arc<dyn UrlReverser>,
	) -> RelationResult<Self> {
		Ok(Self {
			link: HyperlinkedRelatedField::from_options(options, reverser)?,
			nested,
		})
	}

	pub fn lookup_field(mut self, field: impl Into<String>) -> Self {
		self.link = self.link.lookup_field(field);
		self
	}

	pub fn lookup_url_kwarg(mut self, kwarg: impl Into<String>) -> Self {
		self.link = self.link.lookup_url_kwarg(kwarg);
		self
	}

	pub fn parent_lookup_field(mut self, field: impl Into<String>) -> Self {
		self.nested.parent_lookup_field = field.into();
		self
	}

	pub fn parent_lookup_url_kwarg(mut self, kwarg: impl Into<String>) -> Self {
		self.nested.parent_url_kwarg = Some(kwarg.into());
		self
	}

	pub fn parent_lookup_related_field(mut self, field: impl Into<String>) -> Self {
		self.nested.parent_lookup_related_field = field.into();
		self
	}

	pub fn resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
		self.link = self.link.resolver(resolver);
		self
	}

	pub fn queryset(mut self, queryset: Arc<dyn QuerySet<T>>) -> Self {
		self.link = self.link.queryset(queryset);
		self
	}

	pub fn read_only(mut self) -> Self {
		self.link = self.link.read_only();
		self
	}

	pub fn allow_null(mut self) -> Self {
		self.link = self.link.allow_null();
		self
	}

	pub fn optional(mut self) -> Self {
		self.link = self.link.optional();
		self
	}

	pub fn many(mut self, many: bool) -> Self {
		self.link = self.link.many(many);
		self
	}

	pub fn nested_options(&self) -> &NestedLookupOptions {
		&self.nested
	}

	pub fn view_name(&self) -> &str {
		self.link.view_name()
	}

	pub fn bind(&mut self, binding: FieldBinding<T>) -> RelationResult<()> {
		self.link.bind(binding)
	}

	/// Given an object, return the URL that hyperlinks to it
	///
	/// The kwargs carry both the object's own lookup value and its parent's.
	/// An absent parent contributes a null value; whether such a URL exists
	/// is up to the reverser. Unsaved objects have no URL.
	pub fn get_url(
		&self,
		obj: &dyn LookupTarget,
		view_name: &str,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<Option<String>> {
		if obj.primary_key().is_none() {
			tracing::debug!(view_name, "skipping nested URL for unsaved object");
			return Ok(None);
		}

		let lookup_value = required_attribute(obj, self.link.lookup_field_name())?;
		let parent_lookup_value = match obj.related(&self.nested.parent_lookup_field) {
			Some(parent) => required_attribute(parent, &self.nested.parent_lookup_related_field)?,
			None => Value::Null,
		};

		let mut kwargs = UrlKwargs::new();
		kwargs.insert(self.link.lookup_url_kwarg_name().to_string(), lookup_value);
		kwargs.insert(
			self.nested.parent_lookup_url_kwarg().to_string(),
			parent_lookup_value,
		);

		self.link.reverse(view_name, &kwargs, request, format).map(Some)
	}
}

impl<T: LookupTarget> NestedHyperlinkedRelatedField<T> {
	/// Serialize the related object to its URL, or `null`
	pub fn to_representation(
		&self,
		value: &T,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<Value> {
		let url = self.get_url(value, self.view_name(), request, format)?;
		Ok(url.map_or(Value::Null, Value::String))
	}

	pub fn to_representation_many(
		&self,
		values: &[T],
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<Value> {
		self.link.ensure_many()?;
		values
			.iter()
			.map(|value| self.to_representation(value, request, format))
			.collect::<RelationResult<Vec<_>>>()
			.map(Value::Array)
	}
}

impl<T> HyperlinkedLookup<T> for NestedHyperlinkedRelatedField<T> {
	fn hyperlink(&self) -> &HyperlinkedRelatedField<T> {
		&self.link
	}

	/// Look the object up by its own and its parent's identifier
	fn get_object(&self, _view_name: &str, view_kwargs: &ViewKwargs) -> RelationResult<T> {
		let lookup_value = url_kwarg(view_kwargs, self.link.lookup_url_kwarg_name())?;
		let parent_lookup_value = url_kwarg(view_kwargs, self.nested.parent_lookup_url_kwarg())?;

		let mut lookup = LookupKwargs::new();
		lookup.insert(self.link.lookup_field_name().to_string(), lookup_value);
		lookup.insert(
			self.nested.parent_lookup_field.clone(),
			parent_lookup_value,
		);
		self.get_queryset()?.get(&lookup)
	}
}

impl<T> std::fmt::Debug for NestedHyperlinkedRelatedField<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NestedHyperlinkedRelatedField")
			.field("link", &self.link)
			.field("nested", &self.nested)
			.finish()
	}
}
