//! Integration tests for NestedHyperlinkedRelatedField
//!
//! Covers URL building from child objects, compound lookups from matched
//! URLs, and the round trip between the two.

use reinhardt_nested::{
	AttributeValue, HyperlinkValidationError, HyperlinkedLookup, InMemoryQuerySet, LookupTarget,
	NestedHyperlinkedRelatedField, RelationError, RelationResult, RequestContext, RouteTable,
	UrlKwargs, UrlReverser, ViewKwargs,
};
use rstest::*;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
struct Parent {
	id: Option<i64>,
	slug: String,
}

impl LookupTarget for Parent {
	fn primary_key(&self) -> Option<Value> {
		self.id.map(Value::from)
	}

	fn attribute(&self, name: &str) -> AttributeValue {
		match name {
			"slug" => json!(self.slug).into(),
			_ => AttributeValue::Missing,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Child {
	id: Option<i64>,
	name: String,
	parent: Option<Parent>,
}

impl LookupTarget for Child {
	fn primary_key(&self) -> Option<Value> {
		self.id.map(Value::from)
	}

	fn attribute(&self, name: &str) -> AttributeValue {
		match name {
			"name" => json!(self.name).into(),
			_ => AttributeValue::Missing,
		}
	}

	fn related(&self, name: &str) -> Option<&dyn LookupTarget> {
		match name {
			"parent" => self.parent.as_ref().map(|p| p as &dyn LookupTarget),
			_ => None,
		}
	}
}

fn parent(id: i64) -> Parent {
	Parent {
		id: Some(id),
		slug: format!("parent-{}", id),
	}
}

fn child(id: i64, name: &str, parent_id: Option<i64>) -> Child {
	Child {
		id: Some(id),
		name: name.to_string(),
		parent: parent_id.map(parent),
	}
}

/// Reverser that records every call and answers with a fixed URL
#[derive(Default)]
struct RecordingReverser {
	calls: Mutex<Vec<(String, UrlKwargs)>>,
}

impl RecordingReverser {
	fn calls(&self) -> Vec<(String, UrlKwargs)> {
		self.calls.lock().unwrap().clone()
	}
}

impl UrlReverser for RecordingReverser {
	fn reverse(
		&self,
		view_name: &str,
		kwargs: &UrlKwargs,
		_request: Option<&RequestContext>,
		_format: Option<&str>,
	) -> RelationResult<String> {
		self.calls
			.lock()
			.unwrap()
			.push((view_name.to_string(), kwargs.clone()));
		Ok("/recorded/".to_string())
	}
}

#[fixture]
fn routes() -> Arc<RouteTable> {
	Arc::new(
		RouteTable::new()
			.with_path("child-detail", "/parents/{parent_pk}/children/{pk}/")
			.with_path("child-by-name", "/parents/{parent_slug}/children/{name}/")
			.with_path("child-by-label", "/parents/{parent_pk}/labels/{name}/")
			.with_format_suffixes(["json"]),
	)
}

#[fixture]
fn children() -> Vec<Child> {
	vec![
		child(5, "alice", Some(2)),
		child(6, "bob", Some(2)),
		child(7, "alice", Some(3)),
		child(8, "twin", Some(4)),
		child(9, "twin", Some(4)),
		child(10, "v1", Some(2)),
		child(11, "v1.2", Some(2)),
		child(12, "v1.json", Some(2)),
		child(13, "café", Some(2)),
	]
}

fn child_field(
	routes: Arc<RouteTable>,
	children: Vec<Child>,
) -> NestedHyperlinkedRelatedField<Child> {
	NestedHyperlinkedRelatedField::new("child-detail", routes.clone())
		.parent_lookup_url_kwarg("parent_pk")
		.resolver(routes)
		.queryset(Arc::new(InMemoryQuerySet::new(children)))
}

fn label_field(
	routes: Arc<RouteTable>,
	children: Vec<Child>,
) -> NestedHyperlinkedRelatedField<Child> {
	NestedHyperlinkedRelatedField::new("child-by-label", routes.clone())
		.lookup_field("name")
		.parent_lookup_url_kwarg("parent_pk")
		.resolver(routes)
		.queryset(Arc::new(InMemoryQuerySet::new(children)))
}

fn named(children: &[Child], name: &str) -> Child {
	children
		.iter()
		.find(|child| child.name == name)
		.cloned()
		.unwrap()
}

fn kwargs(pairs: &[(&str, Value)]) -> UrlKwargs {
	pairs
		.iter()
		.map(|(name, value)| (name.to_string(), value.clone()))
		.collect()
}

fn view_kwargs(pairs: &[(&str, &str)]) -> ViewKwargs {
	pairs
		.iter()
		.map(|(name, value)| (name.to_string(), value.to_string()))
		.collect()
}

/// Test: Unsaved objects yield no URL and never reach the reverser
#[rstest]
fn test_unsaved_object_skips_reverser() {
	let reverser = Arc::new(RecordingReverser::default());
	let field = NestedHyperlinkedRelatedField::<Child>::new("child-detail", reverser.clone());
	let unsaved = Child {
		id: None,
		name: "new".to_string(),
		parent: Some(parent(2)),
	};

	let url = field.get_url(&unsaved, "child-detail", None, None).unwrap();

	assert!(url.is_none());
	assert!(reverser.calls().is_empty());
}

/// Test: Own and parent identifiers are passed to the reverser exactly
#[rstest]
fn test_reverser_receives_exact_kwargs() {
	let reverser = Arc::new(RecordingReverser::default());
	let field = NestedHyperlinkedRelatedField::<Child>::new("child-detail", reverser.clone())
		.parent_lookup_url_kwarg("parent_pk");

	let url = field
		.get_url(&child(5, "alice", Some(2)), "child-detail", None, None)
		.unwrap();

	assert_eq!(url.as_deref(), Some("/recorded/"));
	assert_eq!(
		reverser.calls(),
		vec![(
			"child-detail".to_string(),
			kwargs(&[("pk", json!(5)), ("parent_pk", json!(2))])
		)]
	);
}

/// Test: An absent parent is passed on as a null identifier
#[rstest]
fn test_absent_parent_passes_null() {
	let reverser = Arc::new(RecordingReverser::default());
	let field = NestedHyperlinkedRelatedField::<Child>::new("child-detail", reverser.clone())
		.parent_lookup_url_kwarg("parent_pk");

	field
		.get_url(&child(5, "orphan", None), "child-detail", None, None)
		.unwrap();

	assert_eq!(
		reverser.calls()[0].1,
		kwargs(&[("pk", json!(5)), ("parent_pk", Value::Null)])
	);
}

/// Test: Without a parent route match the reverser error propagates
#[rstest]
fn test_absent_parent_with_route_table_is_no_reverse_match(
	routes: Arc<RouteTable>,
	children: Vec<Child>,
) {
	let field = child_field(routes, children);
	let result = field.get_url(&child(5, "orphan", None), "child-detail", None, None);

	match result {
		Err(RelationError::NoReverseMatch { view_name, kwargs }) => {
			assert_eq!(view_name, "child-detail");
			assert_eq!(kwargs, "{'parent_pk': null, 'pk': 5}");
		}
		other => panic!("Expected NoReverseMatch, got {:?}", other),
	}
}

/// Test: The documented end-to-end scenario
#[rstest]
fn test_child_detail_end_to_end(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = child_field(routes, children);
	let original = child(5, "alice", Some(2));

	let url = field
		.get_url(&original, "child-detail", None, None)
		.unwrap()
		.unwrap();
	assert_eq!(url, "/parents/2/children/5/");

	let found = field
		.get_object(
			"child-detail",
			&view_kwargs(&[("pk", "5"), ("parent_pk", "2")]),
		)
		.unwrap();
	assert_eq!(found, original);
}

/// Test: Backward resolution inverts forward resolution for every object
#[rstest]
fn test_forward_backward_inverse(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = child_field(routes, children.clone());

	for original in &children {
		let url = field.to_representation(original, None, None).unwrap();
		let resolved = field.to_internal_value(&url, None).unwrap();
		assert_eq!(&resolved, original);
	}
}

/// Test: Custom lookup fields on both the child and the parent
#[rstest]
fn test_custom_lookup_fields(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = NestedHyperlinkedRelatedField::new("child-by-name", routes.clone())
		.lookup_field("name")
		.parent_lookup_url_kwarg("parent_slug")
		.parent_lookup_related_field("slug")
		.resolver(routes)
		.queryset(Arc::new(InMemoryQuerySet::new(children)));

	let url = field
		.get_url(&child(7, "alice", Some(3)), "child-by-name", None, None)
		.unwrap();
	assert_eq!(url.as_deref(), Some("/parents/parent-3/children/alice/"));
}

/// Test: Compound lookup with no match
#[rstest]
fn test_get_object_not_found(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = child_field(routes, children);

	// Child 7 exists, but under parent 3
	let result = field.get_object(
		"child-detail",
		&view_kwargs(&[("pk", "7"), ("parent_pk", "2")]),
	);
	assert!(matches!(result, Err(RelationError::ObjectNotFound { .. })));
}

/// Test: Compound lookup matching several objects
#[rstest]
fn test_get_object_multiple(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = NestedHyperlinkedRelatedField::new("child-by-name", routes.clone())
		.lookup_field("name")
		.parent_lookup_url_kwarg("parent_slug")
		.queryset(Arc::new(InMemoryQuerySet::new(children)));

	let result = field.get_object(
		"child-by-name",
		&view_kwargs(&[("name", "twin"), ("parent_slug", "4")]),
	);
	assert!(matches!(
		result,
		Err(RelationError::MultipleObjectsReturned { count: 2, .. })
	));
}

/// Test: Hyperlink validation errors
#[rstest]
#[case(json!("/parents/2/children/99/"), HyperlinkValidationError::DoesNotExist)]
#[case(json!("/parents/2/"), HyperlinkValidationError::NoMatch)]
#[case(json!("/parents/2/children/alice/"), HyperlinkValidationError::DoesNotExist)]
fn test_to_internal_value_validation(
	routes: Arc<RouteTable>,
	children: Vec<Child>,
	#[case] data: Value,
	#[case] expected: HyperlinkValidationError,
) {
	let field = child_field(routes, children);
	let err = field.to_internal_value(&data, None).unwrap_err();
	assert_eq!(err.as_validation_error(), Some(&expected));
}

/// Test: URLs matching a different view are rejected
#[rstest]
fn test_to_internal_value_incorrect_match(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = NestedHyperlinkedRelatedField::new("child-by-name", routes.clone())
		.lookup_field("name")
		.parent_lookup_url_kwarg("parent_slug")
		.resolver(routes)
		.queryset(Arc::new(InMemoryQuerySet::new(children)));

	let err = field
		.to_internal_value(&json!("/parents/2/children/5/"), None)
		.unwrap_err();
	assert_eq!(
		err.as_validation_error(),
		Some(&HyperlinkValidationError::IncorrectMatch)
	);
}

/// Test: Absolute URLs under a script prefix round trip
#[rstest]
fn test_absolute_urls_with_script_prefix(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = child_field(routes, children);
	let request = RequestContext::from_base_url("https://api.example.com/v1/").unwrap();
	let original = child(6, "bob", Some(2));

	let url = field
		.to_representation(&original, Some(&request), None)
		.unwrap();
	assert_eq!(url, json!("https://api.example.com/v1/parents/2/children/6/"));

	let resolved = field.to_internal_value(&url, Some(&request)).unwrap();
	assert_eq!(resolved, original);
}

/// Test: Many nested objects serialize to a list of URLs
#[rstest]
fn test_to_representation_many(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = child_field(routes, children.clone()).many(true);

	let urls = field
		.to_representation_many(&children[..2], None, Some("json"))
		.unwrap();
	assert_eq!(
		urls,
		json!(["/parents/2/children/5.json", "/parents/2/children/6.json"])
	);
}

/// Test: Lookup values with dots, format-like endings or non-ASCII text round trip
#[rstest]
#[case::plain("v1", "/parents/2/labels/v1/")]
#[case::dotted("v1.2", "/parents/2/labels/v1.2/")]
#[case::format_like("v1.json", "/parents/2/labels/v1.json/")]
#[case::non_ascii("café", "/parents/2/labels/café/")]
fn test_lookup_value_edge_cases_round_trip(
	routes: Arc<RouteTable>,
	children: Vec<Child>,
	#[case] name: &str,
	#[case] expected_url: &str,
) {
	let field = label_field(routes, children.clone());
	let original = named(&children, name);

	let url = field.to_representation(&original, None, None).unwrap();
	assert_eq!(url, json!(expected_url));
	assert_eq!(field.to_internal_value(&url, None).unwrap(), original);

	let request = RequestContext::new("http", "testserver");
	let absolute = field.to_representation(&original, Some(&request), None).unwrap();
	assert_eq!(
		field.to_internal_value(&absolute, Some(&request)).unwrap(),
		original
	);
}

/// Test: Percent-encoded hyperlinks resolve to the decoded lookup value
#[rstest]
#[case::relative("/parents/2/labels/caf%C3%A9/")]
#[case::absolute("http://testserver/parents/2/labels/caf%C3%A9/")]
#[case::absolute_unencoded("http://testserver/parents/2/labels/café/")]
fn test_percent_encoded_hyperlinks(
	routes: Arc<RouteTable>,
	children: Vec<Child>,
	#[case] data: &str,
) {
	let field = label_field(routes, children.clone());
	let request = RequestContext::new("http", "testserver");

	let resolved = field.to_internal_value(&json!(data), Some(&request)).unwrap();
	assert_eq!(resolved, named(&children, "café"));
}

/// Test: Format-suffixed URLs resolve back to the object they were built from
#[rstest]
#[case::by_pk(false, 5, "/parents/2/children/5.json")]
#[case::by_dotted_name(true, 11, "/parents/2/labels/v1.2.json")]
#[case::by_format_like_name(true, 12, "/parents/2/labels/v1.json.json")]
fn test_format_suffixed_round_trip(
	routes: Arc<RouteTable>,
	children: Vec<Child>,
	#[case] by_label: bool,
	#[case] id: i64,
	#[case] expected_url: &str,
) {
	let field = if by_label {
		label_field(routes, children.clone())
	} else {
		child_field(routes, children.clone())
	};
	let original = children
		.iter()
		.find(|child| child.id == Some(id))
		.cloned()
		.unwrap();

	let url = field.to_representation(&original, None, Some("json")).unwrap();
	assert_eq!(url, json!(expected_url));
	assert_eq!(field.to_internal_value(&url, None).unwrap(), original);

	let request = RequestContext::new("https", "api.example.com").script_prefix("/v1");
	let absolute = field
		.to_representation(&original, Some(&request), Some("json"))
		.unwrap();
	assert_eq!(
		field.to_internal_value(&absolute, Some(&request)).unwrap(),
		original
	);
}

/// Test: Collections need a field declared with many
#[rstest]
fn test_to_representation_many_requires_many(routes: Arc<RouteTable>, children: Vec<Child>) {
	let field = child_field(routes, children.clone());

	let result = field.to_representation_many(&children[..2], None, None);
	assert!(matches!(result, Err(RelationError::ImproperlyConfigured(_))));
}
