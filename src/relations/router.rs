//! HyperlinkedRouterField - link from an object to a nested collection
//!
//! Where [`NestedHyperlinkedRelatedField`](super::NestedHyperlinkedRelatedField)
//! links to individual nested objects, the router field links to the nested
//! router URL of a single parent, e.g. `/parents/{pk}/children/`.

use super::binding::FieldBinding;
use super::hyperlinked::{HyperlinkOptions, HyperlinkedLookup, HyperlinkedRelatedField};
use crate::error::{RelationError, RelationResult};
use crate::lookup::{AttributeValue, BoundRelation, LookupTarget, UrlKwargs, lookup_attribute};
use crate::queryset::QuerySet;
use crate::urls::{RequestContext, UrlResolver, UrlReverser};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::Arc;

/// Places a router field looks for its lookup value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupAccessor {
	/// The instance the root serializer was created with
	RootInstance,
	/// The bound value itself
	Direct,
	/// The instance wrapped by the bound value
	WrappedInstance,
}

impl LookupAccessor {
	/// Accessors whose null lookup value means the object cannot be linked
	pub const NULL_GUARDS: [LookupAccessor; 2] =
		[LookupAccessor::Direct, LookupAccessor::WrappedInstance];

	/// Accessors tried in order; the first one that can serve the value wins
	pub const RESOLUTION_ORDER: [LookupAccessor; 3] = [
		LookupAccessor::RootInstance,
		LookupAccessor::Direct,
		LookupAccessor::WrappedInstance,
	];

	/// Whether this accessor is responsible for the bound value
	///
	/// The root instance serves key-only placeholders, which carry nothing
	/// but the related key. The other accessors serve any value that exposes
	/// the lookup attribute.
	pub fn claims(
		self,
		bound: &BoundRelation<'_>,
		root: Option<&dyn LookupTarget>,
		lookup_field: &str,
	) -> bool {
		match self {
			LookupAccessor::RootInstance => bound.is_pk_only(),
			_ => self.read(bound, root, lookup_field).exists(),
		}
	}

	/// Read the lookup attribute through this accessor
	pub fn read(
		self,
		bound: &BoundRelation<'_>,
		root: Option<&dyn LookupTarget>,
		lookup_field: &str,
	) -> AttributeValue {
		let target = match self {
			LookupAccessor::RootInstance => root,
			LookupAccessor::Direct => bound.direct(),
			LookupAccessor::WrappedInstance => bound.instance(),
		};
		target.map_or(AttributeValue::Missing, |target| {
			lookup_attribute(target, lookup_field)
		})
	}
}

/// Hyperlink to the nested collection of a single parent object
///
/// The field never represents a list of objects itself: `many` is always off.
/// When no queryset is given, the field reads it from the related accessor of
/// the owning serializer's model named by the field's source, once.
pub struct HyperlinkedRouterField<T> {
	link: HyperlinkedRelatedField<T>,
	resolved_queryset: OnceCell<Arc<dyn QuerySet<T>>>,
}

impl<T> HyperlinkedRouterField<T> {
	pub fn new(view_name: impl Into<String>, reverser: Arc<dyn UrlReverser>) -> Self {
		Self::from_link(HyperlinkedRelatedField::new(view_name, reverser))
	}

	/// Create a field from deserialized options; `many` is ignored
	pub fn from_options(
		options: HyperlinkOptions,
		reverser: Arc<dyn UrlReverser>,
	) -> RelationResult<Self> {
		Ok(Self::from_link(HyperlinkedRelatedField::from_options(
			options, reverser,
		)?))
	}

	fn from_link(mut link: HyperlinkedRelatedField<T>) -> Self {
		link.options_mut().many = false;
		Self {
			link,
			resolved_queryset: OnceCell::new(),
		}
	}

	pub fn lookup_field(mut self, field: impl Into<String>) -> Self {
		self.link = self.link.lookup_field(field);
		self
	}

	pub fn lookup_url_kwarg(mut self, kwarg: impl Into<String>) -> Self {
		self.link = self.link.lookup_url_kwarg(kwarg);
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

	pub fn view_name(&self) -> &str {
		self.link.view_name()
	}

	pub fn options(&self) -> &HyperlinkOptions {
		self.link.options()
	}

	pub fn bind(&mut self, binding: FieldBinding<T>) -> RelationResult<()> {
		self.link.bind(binding)
	}

	fn root_instance(&self) -> Option<&dyn LookupTarget> {
		self.link
			.binding()
			.and_then(|binding| binding.root_instance.as_deref())
	}

	/// Locate the lookup value for the bound value, if it can be linked at all
	pub fn locate_lookup_value(&self, bound: &BoundRelation<'_>) -> Option<Value> {
		let root = self.root_instance();
		let field = self.link.lookup_field_name();

		// Unsaved objects will not yet have a valid URL.
		if LookupAccessor::NULL_GUARDS
			.iter()
			.any(|accessor| accessor.read(bound, root, field).is_null())
		{
			return None;
		}

		LookupAccessor::RESOLUTION_ORDER
			.iter()
			.find(|accessor| accessor.claims(bound, root, field))
			.and_then(|accessor| accessor.read(bound, root, field).into_value())
	}

	/// Return the nested router URL for the bound value
	///
	/// Returns `Ok(None)` when no lookup value can be located.
	pub fn get_url(
		&self,
		bound: BoundRelation<'_>,
		view_name: &str,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<Option<String>> {
		let Some(lookup_value) = self.locate_lookup_value(&bound) else {
			tracing::debug!(view_name, ?bound, "no lookup value for router URL");
			return Ok(None);
		};

		let mut kwargs = UrlKwargs::new();
		kwargs.insert(self.link.lookup_url_kwarg_name().to_string(), lookup_value);
		self.link.reverse(view_name, &kwargs, request, format).map(Some)
	}

	/// Serialize the bound value to its router URL, or `null`
	pub fn to_representation(
		&self,
		bound: BoundRelation<'_>,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<Value> {
		let url = self.get_url(bound, self.view_name(), request, format)?;
		Ok(url.map_or(Value::Null, Value::String))
	}
}

impl<T> HyperlinkedLookup<T> for HyperlinkedRouterField<T> {
	fn hyperlink(&self) -> &HyperlinkedRelatedField<T> {
		&self.link
	}

	/// Queryset given at construction, or the related manager of the owning model
	fn get_queryset(&self) -> RelationResult<Arc<dyn QuerySet<T>>> {
		if let Some(queryset) = self.link.configured_queryset() {
			return Ok(queryset.clone());
		}

		self.resolved_queryset
			.get_or_try_init(|| -> RelationResult<Arc<dyn QuerySet<T>>> {
				let binding = self.link.binding().ok_or_else(|| {
					RelationError::ImproperlyConfigured(format!(
						"Router field for '{}' must be bound before resolving its queryset",
						self.link.view_name()
					))
				})?;
				let model = binding.parent_model.as_ref().ok_or_else(|| {
					RelationError::ImproperlyConfigured(format!(
						"Router field '{}' is bound without a parent model",
						binding.field_name
					))
				})?;
				let queryset = model.related_queryset(&binding.source).ok_or_else(|| {
					RelationError::MissingRelatedAccessor {
						accessor: binding.source.clone(),
					}
				})?;

				tracing::debug!(
					field = %binding.field_name,
					accessor = %binding.source,
					"resolved router field queryset"
				);
				Ok(queryset)
			})
			.cloned()
	}
}

impl<T> std::fmt::Debug for HyperlinkedRouterField<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HyperlinkedRouterField")
			.field("link", &self.link)
			.field("queryset_resolved", &self.resolved_queryset.get().is_some())
			.finish()
	}
}
