//! URL reversal and resolution collaborators
//!
//! Relation fields depend on two router capabilities: turning a view name
//! plus keyword arguments into a URL ([`UrlReverser`]) and turning a path back
//! into a view name plus keyword arguments ([`UrlResolver`]). Both are traits
//! so the fields can be wired to any router. [`RouteTable`] is a small
//! pattern-based implementation of both.

use crate::error::{RelationError, RelationResult};
use crate::lookup::{UrlKwargs, ViewKwargs, describe_kwargs, url_text};
use std::collections::BTreeSet;

/// Request information relevant to URL building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
	pub scheme: String,
	/// Host, including the port when it is not the default one
	pub host: String,
	/// Mount point of the application, without a trailing slash (e.g. `/api`)
	pub script_prefix: String,
}

impl RequestContext {
	/// Create a request context with no script prefix
	pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
		Self {
			scheme: scheme.into(),
			host: host.into(),
			script_prefix: String::new(),
		}
	}

	/// Build a request context from a base URL such as `https://api.example.com:8443/v1`
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_nested::RequestContext;
	///
	/// let request = RequestContext::from_base_url("http://testserver:8000/api/").unwrap();
	/// assert_eq!(request.host, "testserver:8000");
	/// assert_eq!(request.script_prefix, "/api");
	/// ```
	pub fn from_base_url(base: &str) -> RelationResult<Self> {
		let parsed = url::Url::parse(base).map_err(|e| {
			RelationError::ImproperlyConfigured(format!("Invalid base URL '{}': {}", base, e))
		})?;
		let host = parsed.host_str().ok_or_else(|| {
			RelationError::ImproperlyConfigured(format!("Base URL '{}' has no host", base))
		})?;
		let host = match parsed.port() {
			Some(port) => format!("{}:{}", host, port),
			None => host.to_string(),
		};

		Ok(Self {
			scheme: parsed.scheme().to_string(),
			host,
			script_prefix: parsed.path().trim_end_matches('/').to_string(),
		})
	}

	/// Set the script prefix
	pub fn script_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.script_prefix = prefix.into().trim_end_matches('/').to_string();
		self
	}

	/// Turn an application path into an absolute URI
	pub fn build_absolute_uri(&self, path: &str) -> String {
		format!("{}://{}{}", self.scheme, self.host, path)
	}

	/// Strip the script prefix from a path, if present
	pub fn strip_script_prefix<'a>(&self, path: &'a str) -> &'a str {
		if self.script_prefix.is_empty() {
			return path;
		}
		match path.strip_prefix(self.script_prefix.as_str()) {
			Some(rest) if rest.starts_with('/') => rest,
			_ => path,
		}
	}
}

/// Trait for URL reversal functionality
///
/// Implementations return [`RelationError::NoReverseMatch`] when no route
/// named `view_name` accepts exactly the given kwargs.
pub trait UrlReverser: Send + Sync {
	fn reverse(
		&self,
		view_name: &str,
		kwargs: &UrlKwargs,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<String>;
}

/// A resolved route: which view matched and the captured kwargs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverMatch {
	pub view_name: String,
	pub kwargs: ViewKwargs,
}

/// Trait for resolving a path back to a view
pub trait UrlResolver: Send + Sync {
	fn resolve(&self, path: &str) -> Option<ResolverMatch>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
}

#[derive(Debug, Clone)]
struct PathPattern {
	raw: String,
	segments: Vec<Segment>,
	trailing_slash: bool,
}

impl PathPattern {
	fn parse(raw: &str) -> Self {
		let segments = raw
			.split('/')
			.filter(|s| !s.is_empty())
			.map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
				Some(name) => Segment::Param(name.to_string()),
				None => Segment::Literal(s.to_string()),
			})
			.collect();

		Self {
			raw: raw.to_string(),
			segments,
			trailing_slash: raw.ends_with('/'),
		}
	}

	fn param_names(&self) -> BTreeSet<&str> {
		self.segments
			.iter()
			.filter_map(|segment| match segment {
				Segment::Param(name) => Some(name.as_str()),
				Segment::Literal(_) => None,
			})
			.collect()
	}

	/// Substitute kwargs, `None` when the kwargs do not fit this pattern
	fn substitute(&self, kwargs: &UrlKwargs) -> Option<String> {
		let expected = self.param_names();
		let given: BTreeSet<&str> = kwargs.keys().map(String::as_str).collect();
		if expected != given {
			return None;
		}

		let mut path = String::with_capacity(self.raw.len());
		for segment in &self.segments {
			path.push('/');
			match segment {
				Segment::Literal(text) => path.push_str(text),
				Segment::Param(name) => {
					let value = kwargs.get(name).and_then(url_text)?;
					if !is_safe_param(&value) {
						return None;
					}
					path.push_str(&value);
				}
			}
		}
		if self.trailing_slash || self.segments.is_empty() {
			path.push('/');
		}
		Some(path)
	}

	fn capture(&self, path: &str) -> Option<ViewKwargs> {
		let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
		if parts.len() != self.segments.len() {
			return None;
		}

		let mut kwargs = ViewKwargs::new();
		for (segment, part) in self.segments.iter().zip(parts) {
			match segment {
				Segment::Literal(text) if text == part => {}
				Segment::Literal(_) => return None,
				Segment::Param(name) => {
					kwargs.insert(name.clone(), part.to_string());
				}
			}
		}
		Some(kwargs)
	}
}

/// Reject values that would change the shape of the URL
fn is_safe_param(value: &str) -> bool {
	if value.is_empty() {
		return false;
	}
	let lowered = value.to_ascii_lowercase();
	!value.contains(['/', '\\', '?', '#'])
		&& !lowered.contains("%2f")
		&& !lowered.contains("%5c")
		&& value != ".."
}

/// Name-to-pattern route table implementing both [`UrlReverser`] and [`UrlResolver`]
///
/// Patterns use `{name}` placeholders, one per path segment. Several patterns
/// may share a name; they are tried in registration order.
///
/// Resolving a path with a `.ext` suffix only captures a `format` kwarg for
/// suffixes registered with [`RouteTable::with_format_suffixes`]. Paths ending
/// in `/` never carry a suffix, so dotted lookup values such as `v1.2` stay
/// intact.
///
/// # Examples
///
/// ```
/// use reinhardt_nested::{RouteTable, UrlKwargs, UrlReverser, UrlResolver};
/// use serde_json::json;
///
/// let mut routes = RouteTable::new();
/// routes.register_path("child-detail", "/parents/{parent_pk}/children/{pk}/");
///
/// let mut kwargs = UrlKwargs::new();
/// kwargs.insert("pk".to_string(), json!(5));
/// kwargs.insert("parent_pk".to_string(), json!(2));
///
/// let url = routes.reverse("child-detail", &kwargs, None, None).unwrap();
/// assert_eq!(url, "/parents/2/children/5/");
///
/// let matched = routes.resolve("/parents/2/children/5/").unwrap();
/// assert_eq!(matched.view_name, "child-detail");
/// assert_eq!(matched.kwargs["pk"], "5");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
	routes: Vec<(String, PathPattern)>,
	format_suffixes: Vec<String>,
}

impl RouteTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a route pattern under a view name
	pub fn register_path(&mut self, name: &str, path: &str) {
		self.routes.push((name.to_string(), PathPattern::parse(path)));
	}

	/// Builder form of [`RouteTable::register_path`]
	pub fn with_path(mut self, name: &str, path: &str) -> Self {
		self.register_path(name, path);
		self
	}

	/// Accept `.{suffix}` format suffixes when resolving, e.g. `["json", "api"]`
	pub fn with_format_suffixes<I, S>(mut self, suffixes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.format_suffixes.extend(suffixes.into_iter().map(Into::into));
		self
	}

	pub fn len(&self) -> usize {
		self.routes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	fn resolve_exact(&self, path: &str) -> Option<ResolverMatch> {
		self.routes.iter().find_map(|(name, pattern)| {
			pattern.capture(path).map(|kwargs| ResolverMatch {
				view_name: name.clone(),
				kwargs,
			})
		})
	}
}

impl UrlReverser for RouteTable {
	fn reverse(
		&self,
		view_name: &str,
		kwargs: &UrlKwargs,
		request: Option<&RequestContext>,
		format: Option<&str>,
	) -> RelationResult<String> {
		tracing::trace!(view_name, kwargs = %describe_kwargs(kwargs), "reversing URL");

		let path = self
			.routes
			.iter()
			.filter(|(name, _)| name == view_name)
			.find_map(|(_, pattern)| pattern.substitute(kwargs))
			.ok_or_else(|| RelationError::NoReverseMatch {
				view_name: view_name.to_string(),
				kwargs: describe_kwargs(kwargs),
			})?;

		let path = match format {
			Some(suffix) => format!("{}.{}", path.trim_end_matches('/'), suffix),
			None => path,
		};

		Ok(match request {
			Some(request) => {
				request.build_absolute_uri(&format!("{}{}", request.script_prefix, path))
			}
			None => path,
		})
	}
}

impl UrlResolver for RouteTable {
	fn resolve(&self, path: &str) -> Option<ResolverMatch> {
		if path.ends_with('/') {
			return self.resolve_exact(path);
		}
		self.resolve_suffixed(path).or_else(|| self.resolve_exact(path))
	}
}

impl RouteTable {
	/// Match a path carrying an allowed format suffix, e.g. `/children/5.json`
	fn resolve_suffixed(&self, path: &str) -> Option<ResolverMatch> {
		let (stem, suffix) = path.rsplit_once('.')?;
		let allowed = self.format_suffixes.iter().any(|known| known == suffix);
		if !allowed || stem.ends_with('/') {
			return None;
		}
		let mut matched = self.resolve_exact(stem)?;
		matched
			.kwargs
			.insert("format".to_string(), suffix.to_string());
		Some(matched)
	}
}
