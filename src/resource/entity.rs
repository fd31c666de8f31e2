//! Materialized entities
//!
//! An [`Entity`] is a bag of raw JSON attributes tagged with its resource
//! definition. Lazy fields are resolved at most once per entity: either from
//! data already nested in the attributes, or by dispatching a request through
//! the owning client.

use super::dispatch::Selector;
use super::registry::ResourceDefinition;
use super::template::singularize;
use crate::error::{json_kind, Result, ScrumyError};
use crate::scrumy::client::ScrumyClient;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Result of a dispatch or a lazy-field resolution
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Fetched {
    One(Entity),
    Many(Vec<Entity>),
    /// Data of an ungrouped resource, passed through as parsed
    Raw(Value),
}

impl Fetched {
    pub fn as_one(&self) -> Option<&Entity> {
        match self {
            Fetched::One(entity) => Some(entity),
            _ => None,
        }
    }

    /// Entities as a slice; a single entity is a slice of one
    pub fn as_many(&self) -> &[Entity] {
        match self {
            Fetched::One(entity) => std::slice::from_ref(entity),
            Fetched::Many(entities) => entities,
            Fetched::Raw(_) => &[],
        }
    }

    pub fn into_one(self) -> Option<Entity> {
        match self {
            Fetched::One(entity) => Some(entity),
            Fetched::Many(entities) => entities.into_iter().next(),
            Fetched::Raw(_) => None,
        }
    }

    pub fn into_many(self) -> Vec<Entity> {
        match self {
            Fetched::One(entity) => vec![entity],
            Fetched::Many(entities) => entities,
            Fetched::Raw(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_many().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_many().is_empty()
    }
}

/// Instance of a resource kind, bound to the client that fetched it
#[derive(Clone)]
pub struct Entity {
    definition: Arc<ResourceDefinition>,
    attributes: Map<String, Value>,
    client: ScrumyClient,
    lazy: HashMap<String, OnceCell<Fetched>>,
}

/// Build an entity from a raw attribute map.
///
/// Null values are dropped so that "absent" and "present but empty" stay
/// distinguishable.
pub fn materialize(
    definition: &Arc<ResourceDefinition>,
    raw: Value,
    client: &ScrumyClient,
) -> Result<Entity> {
    let Value::Object(map) = raw else {
        return Err(ScrumyError::UnexpectedShape {
            resource: definition.name().to_string(),
            found: json_kind(&raw).to_string(),
        });
    };

    let attributes = map.into_iter().filter(|(_, v)| !v.is_null()).collect();
    let lazy = definition
        .lazy_fields()
        .iter()
        .map(|field| (field.clone(), OnceCell::new()))
        .collect();

    Ok(Entity {
        definition: Arc::clone(definition),
        attributes,
        client: client.clone(),
        lazy,
    })
}

impl Entity {
    /// Resource name, e.g. "story"
    pub fn kind(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Raw attribute as decoded from JSON
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(|v| v.as_str())
    }

    /// Computed field, recomputed from the current attributes on every call
    pub fn helper(&self, name: &str) -> Option<Value> {
        self.definition
            .helper(name)
            .and_then(|helper| helper(&self.attributes))
    }

    /// Helper value if one is declared for `name`, else the raw attribute
    pub fn field(&self, name: &str) -> Option<Value> {
        if self.definition.helper(name).is_some() {
            return self.helper(name);
        }
        self.attr(name).cloned()
    }

    /// Set an attribute; `null` removes it
    pub fn set(&mut self, name: &str, value: Value) {
        if value.is_null() {
            self.attributes.remove(name);
        } else {
            self.attributes.insert(name.to_string(), value);
        }
    }

    /// Identifier used in URLs for this entity
    pub fn id(&self) -> Option<String> {
        match self.field("id")? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// True once a lazy field holds a value
    pub fn is_resolved(&self, field: &str) -> bool {
        self.lazy
            .get(field)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    /// Resolve a declared lazy field, fetching it on first access only
    pub async fn resolve_lazy(&self, field: &str) -> Result<&Fetched> {
        let Some(cell) = self.lazy.get(field) else {
            return Err(ScrumyError::NotLazyField {
                resource: self.kind().to_string(),
                field: field.to_string(),
            });
        };

        cell.get_or_try_init(|| self.load_lazy(field)).await
    }

    async fn load_lazy(&self, field: &str) -> Result<Fetched> {
        if let Some(embedded) = self.convert_embedded(field)? {
            tracing::trace!("{}.{} resolved from nested payload", self.kind(), field);
            return Ok(embedded);
        }

        let Some(id) = self.id() else {
            return Err(ScrumyError::MissingIdentifier {
                template: format!("{}.{}", self.kind(), field),
            });
        };

        tracing::debug!("{} {} loading {}", self.kind(), id, field);
        self.client.dispatch(field, &Selector::Id(id)).await
    }

    /// Convert raw nested data for `field` into typed children, if present
    fn convert_embedded(&self, field: &str) -> Result<Option<Fetched>> {
        let child = self.client.registry().lookup(&singularize(field))?;

        match self.attributes.get(field) {
            Some(Value::Array(items)) if !items.is_empty() => {
                if !items[0].is_object() {
                    return Ok(Some(Fetched::Raw(Value::Array(items.clone()))));
                }
                let entities = items
                    .iter()
                    .map(|item| {
                        materialize(child, unwrap_nested(item, child).clone(), &self.client)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(Fetched::Many(entities)))
            }
            Some(value) if value.as_object().is_some_and(|map| !map.is_empty()) => {
                let entity =
                    materialize(child, unwrap_nested(value, child).clone(), &self.client)?;
                Ok(Some(Fetched::One(entity)))
            }
            _ => Ok(None),
        }
    }

    pub async fn sprints(&self) -> Result<&[Entity]> {
        Ok(self.resolve_lazy("sprints").await?.as_many())
    }

    pub async fn stories(&self) -> Result<&[Entity]> {
        Ok(self.resolve_lazy("stories").await?.as_many())
    }

    pub async fn tasks(&self) -> Result<&[Entity]> {
        Ok(self.resolve_lazy("tasks").await?.as_many())
    }

    pub async fn snapshots(&self) -> Result<&[Entity]> {
        Ok(self.resolve_lazy("snapshots").await?.as_many())
    }

    pub async fn scrumer(&self) -> Result<Option<&Entity>> {
        Ok(self.resolve_lazy("scrumer").await?.as_many().first())
    }
}

/// Nested children may arrive wrapped in their root key (`{"story": {...}}`)
fn unwrap_nested<'a>(value: &'a Value, definition: &ResourceDefinition) -> &'a Value {
    match (value, definition.root_key()) {
        (Value::Object(map), Some(root)) if map.len() == 1 => map.get(root).unwrap_or(value),
        _ => value,
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved: Vec<&str> = self
            .lazy
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(field, _)| field.as_str())
            .collect();

        f.debug_struct("Entity")
            .field("kind", &self.kind())
            .field("attributes", &self.attributes)
            .field("resolved", &resolved)
            .finish()
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrumy::testing::MockFetcher;
    use serde_json::json;

    fn client_with(fetcher: MockFetcher) -> ScrumyClient {
        ScrumyClient::with_fetcher("demo", "secret", Arc::new(fetcher)).unwrap()
    }

    fn task_def(client: &ScrumyClient) -> Arc<ResourceDefinition> {
        Arc::clone(client.registry().lookup("task").unwrap())
    }

    #[test]
    fn test_materialize_drops_nulls() {
        let client = client_with(MockFetcher::new());
        let task = materialize(
            &task_def(&client),
            json!({"id": 7, "title": "Write tests", "state": null}),
            &client,
        )
        .unwrap();

        assert_eq!(task.kind(), "task");
        assert!(task.definition().is_lazy("scrumer"));
        assert_eq!(task.attr("title"), Some(&json!("Write tests")));
        assert!(task.attr("state").is_none());
        assert!(!task.attributes().contains_key("state"));
        assert_eq!(task.id(), Some("7".to_string()));
    }

    #[test]
    fn test_materialize_keeps_empty_values() {
        let client = client_with(MockFetcher::new());
        let task =
            materialize(&task_def(&client), json!({"id": 1, "title": ""}), &client).unwrap();
        assert_eq!(task.attr("title"), Some(&json!("")));
        assert!(task.attr("scrumer").is_none());
    }

    #[test]
    fn test_materialize_rejects_non_objects() {
        let client = client_with(MockFetcher::new());
        let err = materialize(&task_def(&client), json!([1, 2]), &client).unwrap_err();
        assert!(matches!(err, ScrumyError::UnexpectedShape { found, .. } if found == "array"));
    }

    #[test]
    fn test_helper_tracks_attribute_changes() {
        let client = client_with(MockFetcher::new());
        let mut task =
            materialize(&task_def(&client), json!({"id": 1, "title": "Deploy (2h)"}), &client)
                .unwrap();
        assert_eq!(task.field("time"), Some(json!(2.0)));

        task.set("title", json!("Deploy (30m)"));
        assert_eq!(task.field("time"), Some(json!(0.5)));

        task.set("title", Value::Null);
        assert_eq!(task.field("time"), Some(json!(3.0)));
    }

    #[test]
    fn test_scrumer_id_is_name() {
        let client = client_with(MockFetcher::new());
        let def = Arc::clone(client.registry().lookup("scrumer").unwrap());
        let scrumer =
            materialize(&def, json!({"name": "misty", "color": "blue"}), &client).unwrap();
        assert_eq!(scrumer.id(), Some("misty".to_string()));
    }

    #[tokio::test]
    async fn test_nested_payload_needs_no_fetch() {
        let fetcher = MockFetcher::new();
        let client = client_with(fetcher.clone());
        let def = Arc::clone(client.registry().lookup("story").unwrap());
        let story = materialize(
            &def,
            json!({
                "id": 3,
                "title": "Login page",
                "tasks": [
                    {"task": {"id": 30, "title": "Form (1h)", "scrumer": {"name": "brock"}}},
                    {"task": {"id": 31, "title": "Styles (45m)", "scrumer": {"name": "misty"}}}
                ]
            }),
            &client,
        )
        .unwrap();

        let tasks = story.tasks().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].field("time"), Some(json!(0.75)));

        let scrumer = tasks[0].scrumer().await.unwrap().unwrap();
        assert_eq!(scrumer.kind(), "scrumer");
        assert_eq!(scrumer.get_str("name"), Some("brock"));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_lazy_field_fetches_once() {
        let fetcher = MockFetcher::new().with_json(
            "https://scrumy.com/api/stories/3/tasks.json",
            json!([{"task": {"id": 30, "title": "Form"}}]),
        );
        let client = client_with(fetcher.clone());
        let def = Arc::clone(client.registry().lookup("story").unwrap());
        let story = materialize(&def, json!({"id": 3, "title": "Login page"}), &client).unwrap();

        assert!(!story.is_resolved("tasks"));
        assert_eq!(story.tasks().await.unwrap().len(), 1);
        assert!(story.is_resolved("tasks"));
        assert_eq!(story.tasks().await.unwrap().len(), 1);
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_nested_list_triggers_fetch() {
        let fetcher = MockFetcher::new()
            .with_json("https://scrumy.com/api/stories/4/tasks.json", json!([]));
        let client = client_with(fetcher.clone());
        let def = Arc::clone(client.registry().lookup("story").unwrap());
        let story = materialize(&def, json!({"id": 4, "tasks": []}), &client).unwrap();

        assert!(story.tasks().await.unwrap().is_empty());
        assert_eq!(fetcher.requested(), vec!["https://scrumy.com/api/stories/4/tasks.json"]);
    }

    #[tokio::test]
    async fn test_empty_nested_object_triggers_fetch() {
        let fetcher = MockFetcher::new().with_json(
            "https://scrumy.com/api/scrumers/8.json",
            json!({"scrumer": {"name": "ash", "color": "red"}}),
        );
        let client = client_with(fetcher.clone());
        let task =
            materialize(&task_def(&client), json!({"id": 8, "scrumer": {}}), &client).unwrap();

        let scrumer = task.scrumer().await.unwrap().unwrap();
        assert_eq!(scrumer.id(), Some("ash".to_string()));
        assert_eq!(fetcher.requested(), vec!["https://scrumy.com/api/scrumers/8.json"]);
    }

    #[tokio::test]
    async fn test_nested_scalar_list_passes_through() {
        let fetcher = MockFetcher::new();
        let client = client_with(fetcher.clone());
        let def = Arc::clone(client.registry().lookup("story").unwrap());
        let story = materialize(&def, json!({"id": 6, "tasks": [1, 2]}), &client).unwrap();

        let fetched = story.resolve_lazy("tasks").await.unwrap();
        assert!(matches!(fetched, Fetched::Raw(value) if value == &json!([1, 2])));
        assert!(story.tasks().await.unwrap().is_empty());
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_resolution_is_not_cached() {
        let fetcher = MockFetcher::new();
        let client = client_with(fetcher.clone());
        let def = Arc::clone(client.registry().lookup("story").unwrap());
        let story = materialize(&def, json!({"id": 5}), &client).unwrap();

        let err = story.tasks().await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!story.is_resolved("tasks"));

        fetcher.insert_json("https://scrumy.com/api/stories/5/tasks.json", json!([]));
        assert!(story.tasks().await.unwrap().is_empty());
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_undeclared_lazy_field() {
        let client = client_with(MockFetcher::new());
        let task = materialize(&task_def(&client), json!({"id": 1}), &client).unwrap();
        let err = task.resolve_lazy("stories").await.unwrap_err();
        assert!(matches!(err, ScrumyError::NotLazyField { .. }));
    }

    #[tokio::test]
    async fn test_lazy_without_id_fails() {
        let client = client_with(MockFetcher::new());
        let def = Arc::clone(client.registry().lookup("story").unwrap());
        let story = materialize(&def, json!({"title": "Orphan"}), &client).unwrap();
        let err = story.tasks().await.unwrap_err();
        assert!(matches!(err, ScrumyError::MissingIdentifier { .. }));
    }

    #[test]
    fn test_entity_serializes_as_attributes() {
        let client = client_with(MockFetcher::new());
        let task =
            materialize(&task_def(&client), json!({"id": 1, "title": "Plan"}), &client).unwrap();
        assert_eq!(
            serde_json::to_value(&task).unwrap(),
            json!({"id": 1, "title": "Plan"})
        );
    }
}
