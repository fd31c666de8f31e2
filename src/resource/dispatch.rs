//! Resource Dispatch
//!
//! Maps a resource name and selector to a request URL, fetches it, unwraps
//! the root key and materializes entities.

use super::entity::{materialize, Entity, Fetched};
use super::registry::ResourceDefinition;
use super::template::{has_unresolved_id, is_plural, resolve, singularize};
use crate::error::{json_kind, Result, ScrumyError, TemplateKind};
use crate::scrumy::client::ScrumyClient;
use serde_json::Value;
use std::fmt;

/// Which item(s) of a resource to fetch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    /// Project-scoped collection
    #[default]
    All,
    Id(String),
    /// The active sprint
    Current,
}

impl Selector {
    /// Parse a command-line selector; the literal `current` is special
    pub fn parse(s: &str) -> Self {
        match s {
            "" => Selector::All,
            "current" => Selector::Current,
            id => Selector::Id(id.to_string()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Selector::Id(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("all"),
            Selector::Id(id) => f.write_str(id),
            Selector::Current => f.write_str("current"),
        }
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Selector::Id(id.to_string())
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Selector::Id(id)
    }
}

impl From<u64> for Selector {
    fn from(id: u64) -> Self {
        Selector::Id(id.to_string())
    }
}

/// Build the request path for `requested` (e.g. "stories" or "story").
///
/// A plural name asks for the list URL, parameterized by the parent id when
/// the resource has a parent and an id was given, else by the project. A
/// singular name asks for the show URL, parameterized by the selector id.
/// `Current` always uses the project-relative current URL.
pub fn request_path(
    definition: &ResourceDefinition,
    requested: &str,
    selector: &Selector,
    project: &str,
) -> Result<String> {
    let missing = |kind| ScrumyError::MissingTemplate {
        resource: definition.name().to_string(),
        kind,
    };

    let (template, path) = if *selector == Selector::Current {
        let template = definition
            .current_url()
            .ok_or_else(|| missing(TemplateKind::Current))?;
        (template, resolve(template, project, None))
    } else if is_plural(requested) {
        let template = definition
            .list_url()
            .ok_or_else(|| missing(TemplateKind::List))?;
        let parent_id = match (definition.parent(), selector.id()) {
            (Some(_), Some(id)) => id,
            _ => project,
        };
        (template, resolve(template, project, Some(parent_id)))
    } else {
        let template = definition
            .show_url()
            .ok_or_else(|| missing(TemplateKind::Show))?;
        (template, resolve(template, project, selector.id()))
    };

    if has_unresolved_id(&path) {
        return Err(ScrumyError::MissingIdentifier {
            template: template.to_string(),
        });
    }
    Ok(path)
}

/// Parsed response with the root key stripped
#[derive(Debug, Clone, PartialEq)]
pub enum Unwrapped {
    One(Value),
    Many(Vec<Value>),
    Raw(Value),
}

/// Strip the resource's root key from a parsed response
pub fn unwrap_root(json: Value, definition: &ResourceDefinition, url: &str) -> Result<Unwrapped> {
    let Some(root) = definition.root_key() else {
        return Ok(Unwrapped::Raw(json));
    };

    let take_root = |item: Value| -> Result<Value> {
        match item {
            Value::Object(mut map) => map.remove(root).ok_or_else(|| ScrumyError::MissingRootKey {
                url: url.to_string(),
                root: root.to_string(),
            }),
            other => Err(ScrumyError::UnexpectedShape {
                resource: definition.name().to_string(),
                found: json_kind(&other).to_string(),
            }),
        }
    };

    match json {
        Value::Array(items) => items
            .into_iter()
            .map(take_root)
            .collect::<Result<Vec<_>>>()
            .map(Unwrapped::Many),
        other => take_root(other).map(Unwrapped::One),
    }
}

/// Fetch a resource by name and turn the response into entities
pub async fn dispatch(
    client: &ScrumyClient,
    resource: &str,
    selector: &Selector,
) -> Result<Fetched> {
    let singular = singularize(resource);
    let definition = client.registry().lookup(&singular)?;

    let path = request_path(definition, resource, selector, client.project())?;
    let url = client.url_for(&path);

    tracing::debug!("dispatch: resource={}, selector={}", resource, selector);

    let json = client.get_json(&url).await?;

    match unwrap_root(json, definition, &url)? {
        Unwrapped::Many(items) => {
            let entities = items
                .into_iter()
                .map(|raw| materialize(definition, raw, client))
                .collect::<Result<Vec<Entity>>>()?;
            tracing::debug!("{} {} fetched", entities.len(), resource);
            Ok(Fetched::Many(entities))
        }
        Unwrapped::One(raw) => Ok(Fetched::One(materialize(definition, raw, client)?)),
        Unwrapped::Raw(value) => Ok(Fetched::Raw(value)),
    }
}
