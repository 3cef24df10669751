//! Field binding
//!
//! A field is configured once and then bound to the serializer that owns it.
//! Binding supplies what the field cannot know on its own: its name, the
//! model of the owning serializer and the root serializer's instance.

use crate::lookup::LookupTarget;
use crate::queryset::RelatedAccessors;
use std::sync::Arc;

/// Context attached to a field when its serializer binds it
pub struct FieldBinding<T> {
	/// Name of the field on the serializer
	pub field_name: String,
	/// Attribute the field reads from; defaults to `field_name`
	pub source: String,
	/// Related managers of the owning serializer's model
	pub parent_model: Option<Arc<dyn RelatedAccessors<T>>>,
	/// Instance the root serializer was created with
	pub root_instance: Option<Arc<dyn LookupTarget>>,
}

impl<T> FieldBinding<T> {
	pub fn new(field_name: impl Into<String>) -> Self {
		let field_name = field_name.into();
		Self {
			source: field_name.clone(),
			field_name,
			parent_model: None,
			root_instance: None,
		}
	}

	pub fn source(mut self, source: impl Into<String>) -> Self {
		self.source = source.into();
		self
	}

	pub fn parent_model(mut self, model: Arc<dyn RelatedAccessors<T>>) -> Self {
		self.parent_model = Some(model);
		self
	}

	pub fn root_instance(mut self, instance: Arc<dyn LookupTarget>) -> Self {
		self.root_instance = Some(instance);
		self
	}
}

impl<T> Clone for FieldBinding<T> {
	fn clone(&self) -> Self {
		Self {
			field_name: self.field_name.clone(),
			source: self.source.clone(),
			parent_model: self.parent_model.clone(),
			root_instance: self.root_instance.clone(),
		}
	}
}

impl<T> std::fmt::Debug for FieldBinding<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FieldBinding")
			.field("field_name", &self.field_name)
			.field("source", &self.source)
			.field("has_parent_model", &self.parent_model.is_some())
			.field("has_root_instance", &self.root_instance.is_some())
			.finish()
	}
}
