//! Error types for nested hyperlinked relations
//!
//! Errors raised by the URL router and the query layer are translated into
//! [`RelationError`] at the field boundary. Only an unaddressable object (no
//! primary key, no locatable lookup value) is handled locally by yielding no
//! URL; everything else is returned to the caller.

use std::fmt;

/// Result alias used throughout the crate
pub type RelationResult<T> = Result<T, RelationError>;

/// Errors produced while linking or resolving related objects
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RelationError {
	/// The kwargs do not correspond to any registered route for the view
	#[error("Reverse for '{view_name}' with keyword arguments {kwargs} not found")]
	NoReverseMatch { view_name: String, kwargs: String },

	/// The lookup matched no object
	#[error("Object matching query {lookup} does not exist")]
	ObjectNotFound { lookup: String },

	/// The lookup matched more than one object
	#[error("get() returned more than one object -- it returned {count} for query {lookup}")]
	MultipleObjectsReturned { count: usize, lookup: String },

	/// The object has no attribute with the given name
	#[error("Object has no attribute '{attribute}'")]
	MissingAttribute { attribute: String },

	/// The parent model has no related accessor with the given name
	#[error("Model has no related accessor '{accessor}'")]
	MissingRelatedAccessor { accessor: String },

	/// A matched URL did not carry an expected keyword argument
	#[error("URL keyword argument '{kwarg}' is missing")]
	MissingUrlKwarg { kwarg: String },

	/// The field is missing a collaborator it needs
	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),

	/// Input data failed hyperlink validation
	#[error(transparent)]
	Validation(#[from] HyperlinkValidationError),
}

impl RelationError {
	/// Check if this error means the lookup found nothing
	pub fn is_not_found(&self) -> bool {
		matches!(self, RelationError::ObjectNotFound { .. })
	}

	/// Check if this error comes from input validation
	pub fn is_validation_error(&self) -> bool {
		matches!(self, RelationError::Validation(_))
	}

	/// Get the underlying validation error, if any
	pub fn as_validation_error(&self) -> Option<&HyperlinkValidationError> {
		match self {
			RelationError::Validation(err) => Some(err),
			_ => None,
		}
	}
}

/// User-facing validation failures for hyperlinked input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HyperlinkValidationError {
	#[error("This field is required.")]
	Required,
	#[error("This field may not be null.")]
	Null,
	#[error("Invalid hyperlink - No URL match.")]
	NoMatch,
	#[error("Invalid hyperlink - Incorrect URL match.")]
	IncorrectMatch,
	#[error("Invalid hyperlink - Object does not exist.")]
	DoesNotExist,
	#[error("Incorrect type. Expected URL string, received {data_type}.")]
	IncorrectType { data_type: JsonKind },
}

impl HyperlinkValidationError {
	/// Stable error code, as used in API error payloads
	pub fn code(&self) -> &'static str {
		match self {
			HyperlinkValidationError::Required => "required",
			HyperlinkValidationError::Null => "null",
			HyperlinkValidationError::NoMatch => "no_match",
			HyperlinkValidationError::IncorrectMatch => "incorrect_match",
			HyperlinkValidationError::DoesNotExist => "does_not_exist",
			HyperlinkValidationError::IncorrectType { .. } => "incorrect_type",
		}
	}
}

/// The JSON type of a rejected input value, named as in RFC 8259
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
	Null,
	Bool,
	Number,
	String,
	Array,
	Object,
}

impl JsonKind {
	pub fn of(value: &serde_json::Value) -> Self {
		use serde_json::Value;
		match value {
			Value::Null => JsonKind::Null,
			Value::Bool(_) => JsonKind::Bool,
			Value::Number(_) => JsonKind::Number,
			Value::String(_) => JsonKind::String,
			Value::Array(_) => JsonKind::Array,
			Value::Object(_) => JsonKind::Object,
		}
	}
}

impl fmt::Display for JsonKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			JsonKind::Null => "null",
			JsonKind::Bool => "boolean",
			JsonKind::Number => "number",
			JsonKind::String => "string",
			JsonKind::Array => "array",
			JsonKind::Object => "object",
		};
		f.write_str(name)
	}
}
