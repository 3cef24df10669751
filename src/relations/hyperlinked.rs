//! HyperlinkedRelatedField - represent a relationship by URL
//!
//! The base hyperlinked field links an object by a single lookup value and
//! resolves a submitted URL back to an object. The nested fields in this crate
//! build on it and override URL building ([`HyperlinkedRelatedField::get_url`]
//! counterparts) and object lookup ([`HyperlinkedLookup::get_object`]).

use super::binding::FieldBinding;
use crate::error::{HyperlinkValidationError, JsonKind, RelationError, RelationResult};
use crate::lookup::{AttributeValue, LookupTarget, PK, UrlKwargs, ViewKwargs, lookup_attribute};
use crate::queryset::{LookupKwargs, QuerySet};
use crate::urls::{RequestContext, UrlResolver, UrlReverser};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Options shared by every hyperlinked field
///
/// Deserializable so fields can be declared in settings documents; missing
/// keys fall back to the defaults.
///
/// # Examples
///
/// ```
/// use reinhardt_nested::HyperlinkOptions;
///
/// let options: HyperlinkOptions = serde_json::from_str(
///     r#"{"view_name": "child-detail", "lookup_field": "slug"}"#,
/// ).unwrap();
/// assert_eq!(options.lookup_url_kwarg(), "slug");
/// assert!(options.required);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperlinkOptions {
	pub view_name: Option<String>,
	/// Attribute identifying the target object
	pub lookup_field: String,
	/// Path parameter carrying the lookup value; defaults to `lookup_field`
	#[serde(skip_serializing_if = "Option::is_none", rename = "lookup_url_kwarg")]
	pub url_kwarg: Option<String>,
	pub read_only: bool,
	pub required: bool,
	pub allow_null: bool,
	pub many: bool,
}

impl Default for HyperlinkOptions {
	fn default() -> Self {
		Self {
			view_name: None,
			lookup_field: PK.to_string(),
			url_kwarg: None,
			read_only: false,
			required: true,
			allow_null: false,
			many: false,
		}
	}
}

impl HyperlinkOptions {
	/// Effective path parameter name for the lookup value
	pub fn lookup_url_kwarg(&self) -> &str {
		self.url_kwarg.as_deref().unwrap_or(&self.lookup_field)
	}
}

/// Read an attribute the field is configured to use
///
/// A missing attribute is a configuration error; a null one is passed on.
pub(crate) fn required_attribute(target: &dyn LookupTarget, name: &str) -> RelationResult<Value> {
	match lookup_attribute(target, name) {
		AttributeValue::Present(value) => Ok(value),
		AttributeValue::Null => Ok(Value::Null),
		AttributeValue::Missing => Err(RelationError::MissingAttribute {
			attribute: name.to_string(),
		}),
	}
}

/// Read a captured URL keyword argument
pub(crate) fn url_kwarg(view_kwargs: &ViewKwargs, name: &str) -> RelationResult<Value> {
	view_kwargs
		.get(name)
		.map(|value| Value::String(value.clone()))
		.ok_or_else(|| RelationError::MissingUrlKwarg {
			kwarg: name.to_string(),
		})
}

/// A field that represents its target using a hyperlink
///
/// # Examples
///
/// ```
/// use reinhardt_nested::{HyperlinkedRelatedField, PkOnlyObject, RouteTable};
/// use std::sync::Arc;
///
/// let routes = Arc::new(RouteTable::new().with_path("parent-detail", "/parents/{pk}/"));
/// let field = HyperlinkedRelatedField::<PkOnlyObject>::new("parent-detail", routes);
///
/// let url = field
///     .get_url(&PkOnlyObject::new(2), "parent-detail", None, None)
///     .unwrap();
/// assert_eq!(url.as_deref(), Some("/parents/2/"));
/// ```
pub struct HyperlinkedRelatedField<T> {
	view_name: String,
	options: HyperlinkOptions,
	reverser: Arc<dyn UrlReverser>,
	resolver: Option<Arc<dyn UrlResolver>>,
	queryset: Option<Arc<dyn QuerySet<T>>>,
	binding: Option<FieldBinding<T>>,
}

impl<T> HyperlinkedRelatedField<T> {
	pub fn new(view_name: impl Into<String>, reverser: Arc<dyn UrlReverser>) -> Self {
		let view_name = view_name.into();
		Self {
			options: HyperlinkOptions {
				view_name: Some(view_name.clone()),
				..HyperlinkOptions::default()
			},
			view_name,
			reverser,
			resolver: None,
			queryset: None,
			binding: None,
		}
	}

	/// Create a field from deserialized options
	///
	/// Fails when `view_name` is not set.
	pub fn from_options(
		options: HyperlinkOptions,
		reverser: Arc<dyn UrlReverser>,
	) -> RelationResult<Self> {
		let view_name = options.view_name.clone().ok_or_else(|| {
			RelationError::ImproperlyConfigured(
				"Hyperlinked fields require a 'view_name' option".to_string(),
			)
		})?;
		Ok(Self {
			view_name,
			options,
			reverser,
			resolver: None,
			queryset: None,
			binding: None,
		})
	}

	pub fn lookup_field(mut self, field: impl Into<String>) -> Self {
		self.options.lookup_field = field.into();
		self
	}

	pub fn lookup_url_kwarg(mut self, kwarg: impl Into<String>) -> Self {
		self.options.url_kwarg = Some(kwarg.into());
		self
	}

	pub fn resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
		self.resolver = Some(resolver);
		self
	}

	pub fn queryset(mut self, queryset: Arc<dyn QuerySet<T>>) -> Self {
		self.queryset = Some(queryset);
		self
	}

	pub fn read_only(mut self) -> Self {
		self.options.read_only = true;
		self
	}

	pub fn allow_null(mut self) -> Self {
		self.options.allow_null = true;
		self
	}

	pub fn optional(mut self) -> Self {
		self.options.required = false;
		self
	}

	pub fn many(mut self, many: bool) -> Self {
		self.options.many = many;
		self
	}

	pub fn view_name(&self) -> &str {
		&self.view_name
	}

	pub(crate) fn ensure_many(&self) -> RelationResult<()> {
		if self.options.many {
			return Ok(());
		}
		Err(RelationError::ImproperlyConfigured(format!(
			"Field for '{}' represents a single object; declare it with `many` for collections",
			self.view_name
		)))
	}

	pub fn options(&self) -> &HyperlinkOptions {
		&self.options
	}

	pub(crate) fn options_mut(&mut self) -> &mut HyperlinkOptions {
		&mut self.options
	}

	pub fn lookup_field_name(&self) -> &str {
		&self.options.lookup_field
	}

	pub fn lookup_url_kwarg_name(&self) -> &str {
		self.options.lookup_url_kwarg()
	}

	/// The queryset given at construction, if any
	pub fn configured_queryset(&self) -> Option<&Arc<dyn QuerySet<T>>> {
		self.queryset.as_ref()
	}

	pub fn url_resolver(&self) -> Option<&Arc<dyn UrlResolver>> {
		self.resolver.as_ref()
	}

	/// Attach the field to its serializer
	///
	/// A field can only be bound once.
	pub fn bind(&mut self, binding: FieldBinding<T>) -> RelationResult<()> {
		if let Some(existing) = &self.binding {
			return Err(RelationError::ImproperlyConfigured(format!(
				"Field '{}' is already bound",
				existing.field_name
			)));
		}
		self.binding = Some(binding);
		Ok(())
	}

	pub fn binding(&self) -> Option<&FieldBinding<T>> {
		self.binding.as_ref()
	}

	pub fn is_bound(&self) -> bool {
		self.binding.is_some()
	}

	/// Delegate to the URL reverser
	pub fn reverse(
		&self,
		view_name: &str,
		kwargs: &UrlKwargs,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<String> {
		self.reverser.reverse(view_name, kwargs, request, format)
	}

	/// Given an object, return the URL that hyperlinks to it
	///
	/// Unsaved objects have no URL. Returns `NoReverseMatch` if `view_name`
	/// and the lookup kwarg do not match a route.
	pub fn get_url(
		&self,
		obj: &dyn LookupTarget,
		view_name: &str,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<Option<String>> {
		if obj.primary_key().is_none() {
			tracing::debug!(view_name, "skipping URL for unsaved object");
			return Ok(None);
		}

		let lookup_value = required_attribute(obj, self.lookup_field_name())?;
		let mut kwargs = UrlKwargs::new();
		kwargs.insert(self.lookup_url_kwarg_name().to_string(), lookup_value);

		self.reverse(view_name, &kwargs, request, format).map(Some)
	}
}

impl<T: LookupTarget> HyperlinkedRelatedField<T> {
	/// Serialize the related object to its URL, or `null`
	pub fn to_representation(
		&self,
		value: &T,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<Value> {
		let url = self.get_url(value, &self.view_name, request, format)?;
		Ok(url.map_or(Value::Null, Value::String))
	}

	/// Serialize a collection of related objects
	///
	/// Only fields declared with `many` represent collections.
	pub fn to_representation_many(
		&self,
		values: &[T],
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<Value> {
		self.ensure_many()?;
		values
			.iter()
			.map(|value| self.to_representation(value, request, format))
			.collect::<RelationResult<Vec<_>>>()
			.map(Value::Array)
	}
}

impl<T> std::fmt::Debug for HyperlinkedRelatedField<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HyperlinkedRelatedField")
			.field("view_name", &self.view_name)
			.field("options", &self.options)
			.field("has_resolver", &self.resolver.is_some())
			.field("has_queryset", &self.queryset.is_some())
			.field("binding", &self.binding)
			.finish()
	}
}

/// URL-to-object resolution shared by all hyperlinked fields
///
/// Implementors supply the underlying [`HyperlinkedRelatedField`] and may
/// override how the queryset is found and how an object is looked up.
pub trait HyperlinkedLookup<T> {
	fn hyperlink(&self) -> &HyperlinkedRelatedField<T>;

	/// Queryset used to look objects up
	fn get_queryset(&self) -> RelationResult<Arc<dyn QuerySet<T>>> {
		let link = self.hyperlink();
		link.configured_queryset().cloned().ok_or_else(|| {
			RelationError::ImproperlyConfigured(format!(
				"Writable hyperlinked field for '{}' requires a queryset",
				link.view_name()
			))
		})
	}

	/// Return the object corresponding to a matched URL
	fn get_object(&self, _view_name: &str, view_kwargs: &ViewKwargs) -> RelationResult<T> {
		let link = self.hyperlink();
		let mut lookup = LookupKwargs::new();
		lookup.insert(
			link.lookup_field_name().to_string(),
			url_kwarg(view_kwargs, link.lookup_url_kwarg_name())?,
		);
		self.get_queryset()?.get(&lookup)
	}

	/// Turn submitted hyperlink data into the object it points at
	fn to_internal_value(
		&self,
		data: &Value,
		request: Option<&RequestContext>,
	) -> RelationResult<T> {
		let link = self.hyperlink();
		let Value::String(data) = data else {
			return Err(HyperlinkValidationError::IncorrectType {
				data_type: JsonKind::of(data),
			}
			.into());
		};

		let raw_path = if data.starts_with("http:") || data.starts_with("https:") {
			url::Url::parse(data)
				.map_err(|_| HyperlinkValidationError::NoMatch)?
				.path()
				.to_string()
		} else {
			data.clone()
		};
		// Resolvers match decoded paths, e.g. `caf%C3%A9` as `café`
		let decoded = percent_decode_str(&raw_path)
			.decode_utf8()
			.map_err(|_| HyperlinkValidationError::NoMatch)?;
		let path = match request {
			Some(request) => request.strip_script_prefix(decoded.as_ref()),
			None => decoded.as_ref(),
		};

		let resolver = link.url_resolver().ok_or_else(|| {
			RelationError::ImproperlyConfigured(format!(
				"Hyperlinked field for '{}' has no URL resolver",
				link.view_name()
			))
		})?;
		let matched = resolver
			.resolve(path)
			.ok_or(HyperlinkValidationError::NoMatch)?;
		if matched.view_name != link.view_name() {
			return Err(HyperlinkValidationError::IncorrectMatch.into());
		}

		match self.get_object(&matched.view_name, &matched.kwargs) {
			Err(RelationError::ObjectNotFound { .. }) => {
				Err(HyperlinkValidationError::DoesNotExist.into())
			}
			result => result,
		}
	}

	/// Validate a possibly absent or null input value
	///
	/// Returns `Ok(None)` when there is nothing to set.
	fn run_validation(
		&self,
		data: Option<&Value>,
		request: Option<&RequestContext>,
	) -> RelationResult<Option<T>> {
		let options = self.hyperlink().options();
		if options.read_only {
			return Ok(None);
		}
		match data {
			None if options.required => Err(HyperlinkValidationError::Required.into()),
			None => Ok(None),
			Some(Value::Null) if options.allow_null => Ok(None),
			Some(Value::Null) => Err(HyperlinkValidationError::Null.into()),
			Some(data) => self.to_internal_value(data, request).map(Some),
		}
	}
}

impl<T> HyperlinkedLookup<T> for HyperlinkedRelatedField<T> {
	fn hyperlink(&self) -> &HyperlinkedRelatedField<T> {
		self
	}
}
