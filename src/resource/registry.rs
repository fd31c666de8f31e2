//! Resource Registry - Load resource definitions from JSON
//!
//! The Scrumy resource table is embedded at compile time and fed through
//! [`ResourceDefinitionBuilder`] into a [`Registry`]. Once built, the registry
//! is only read.

use super::helpers::{lookup_helper, Helper};
use super::template::singularize;
use crate::error::{Result, ScrumyError};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Embedded resource table (compiled into the binary)
const RESOURCE_TABLE: &str = include_str!("../resources/scrumy.json");

/// One resource entry as written in the JSON table
#[derive(Debug, Clone, Deserialize)]
struct ResourceEntry {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    list: Option<String>,
    #[serde(default)]
    show: Option<String>,
    #[serde(default)]
    current: Option<String>,
    #[serde(default)]
    lazy: Vec<String>,
    /// field name -> helper name
    #[serde(default)]
    helpers: BTreeMap<String, String>,
    #[serde(default)]
    ungrouped: bool,
}

/// Root structure of resources/scrumy.json
#[derive(Debug, Clone, Deserialize)]
struct ResourceTable {
    resources: Vec<ResourceEntry>,
}

/// Definition of one resource kind
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    name: String,
    parent: Option<String>,
    list_url: Option<String>,
    show_url: Option<String>,
    current_url: Option<String>,
    lazy_fields: Vec<String>,
    helpers: BTreeMap<String, Helper>,
    ungrouped: bool,
}

impl ResourceDefinition {
    pub fn builder(name: &str) -> ResourceDefinitionBuilder {
        ResourceDefinitionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn list_url(&self) -> Option<&str> {
        self.list_url.as_deref()
    }

    pub fn show_url(&self) -> Option<&str> {
        self.show_url.as_deref()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn lazy_fields(&self) -> &[String] {
        &self.lazy_fields
    }

    pub fn is_lazy(&self, field: &str) -> bool {
        self.lazy_fields.iter().any(|f| f == field)
    }

    pub fn helper(&self, field: &str) -> Option<Helper> {
        self.helpers.get(field).copied()
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(|k| k.as_str())
    }

    /// JSON key wrapping this resource in responses; `None` for ungrouped data
    pub fn root_key(&self) -> Option<&str> {
        if self.ungrouped {
            None
        } else {
            Some(&self.name)
        }
    }
}

/// Builds an immutable [`ResourceDefinition`]
#[derive(Debug, Clone)]
pub struct ResourceDefinitionBuilder {
    definition: ResourceDefinition,
}

impl ResourceDefinitionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            definition: ResourceDefinition {
                name: name.to_string(),
                parent: None,
                list_url: None,
                show_url: None,
                current_url: None,
                lazy_fields: Vec::new(),
                helpers: BTreeMap::new(),
                ungrouped: false,
            },
        }
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.definition.parent = Some(parent.to_string());
        self
    }

    pub fn list(mut self, template: &str) -> Self {
        self.definition.list_url = Some(template.to_string());
        self
    }

    pub fn show(mut self, template: &str) -> Self {
        self.definition.show_url = Some(template.to_string());
        self
    }

    pub fn current(mut self, template: &str) -> Self {
        self.definition.current_url = Some(template.to_string());
        self
    }

    /// Declare a lazy field; repeated names are kept once
    pub fn lazy(mut self, field: &str) -> Self {
        if !self.definition.is_lazy(field) {
            self.definition.lazy_fields.push(field.to_string());
        }
        self
    }

    pub fn helper(mut self, field: &str, helper: Helper) -> Self {
        self.definition.helpers.insert(field.to_string(), helper);
        self
    }

    pub fn ungrouped(mut self) -> Self {
        self.definition.ungrouped = true;
        self
    }

    pub fn build(self) -> Result<ResourceDefinition> {
        let def = self.definition;
        if def.name.is_empty() {
            return Err(ScrumyError::InvalidDefinition {
                resource: def.name,
                reason: "empty name".to_string(),
            });
        }
        if def.list_url.is_none() && def.show_url.is_none() && def.current_url.is_none() {
            return Err(ScrumyError::InvalidDefinition {
                resource: def.name,
                reason: "no URL templates".to_string(),
            });
        }
        Ok(def)
    }
}

impl ResourceEntry {
    fn into_definition(self) -> Result<ResourceDefinition> {
        let mut builder = ResourceDefinition::builder(&self.name);
        if let Some(parent) = &self.parent {
            builder = builder.parent(parent);
        }
        if let Some(list) = &self.list {
            builder = builder.list(list);
        }
        if let Some(show) = &self.show {
            builder = builder.show(show);
        }
        if let Some(current) = &self.current {
            builder = builder.current(current);
        }
        for field in &self.lazy {
            builder = builder.lazy(field);
        }
        for (field, helper_name) in &self.helpers {
            let Some(helper) = lookup_helper(helper_name) else {
                return Err(ScrumyError::InvalidDefinition {
                    resource: self.name.clone(),
                    reason: format!("unknown helper {} for field {}", helper_name, field),
                });
            };
            builder = builder.helper(field, helper);
        }
        if self.ungrouped {
            builder = builder.ungrouped();
        }
        builder.build()
    }
}

/// Resource definitions keyed by name
#[derive(Debug, Clone, Default)]
pub struct Registry {
    resources: HashMap<String, Arc<ResourceDefinition>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Scrumy resource table embedded in the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json(RESOURCE_TABLE)
    }

    /// Build and validate a registry from a JSON resource table
    pub fn from_json(content: &str) -> Result<Self> {
        let table: ResourceTable =
            serde_json::from_str(content).map_err(ScrumyError::ResourceTable)?;

        let mut registry = Self::new();
        for entry in table.resources {
            registry.register(entry.into_definition()?)?;
        }
        registry.validate()?;

        tracing::debug!("Loaded {} resource definitions", registry.len());
        Ok(registry)
    }

    /// Add a definition; names must be unique
    pub fn register(&mut self, definition: ResourceDefinition) -> Result<()> {
        if self.resources.contains_key(definition.name()) {
            return Err(ScrumyError::DuplicateResource(definition.name().to_string()));
        }
        self.resources
            .insert(definition.name().to_string(), Arc::new(definition));
        Ok(())
    }

    /// Get a resource definition by name
    pub fn lookup(&self, name: &str) -> Result<&Arc<ResourceDefinition>> {
        self.resources
            .get(name)
            .ok_or_else(|| ScrumyError::UnknownResource(name.to_string()))
    }

    /// Check that parents and lazy-field targets are registered
    pub fn validate(&self) -> Result<()> {
        for def in self.resources.values() {
            if let Some(parent) = def.parent() {
                if !self.resources.contains_key(parent) {
                    return Err(ScrumyError::UnknownParent {
                        resource: def.name().to_string(),
                        parent: parent.to_string(),
                    });
                }
            }
            for field in def.lazy_fields() {
                if !self.resources.contains_key(singularize(field).as_ref()) {
                    return Err(ScrumyError::InvalidDefinition {
                        resource: def.name().to_string(),
                        reason: format!("lazy field {} has no matching resource", field),
                    });
                }
            }
        }
        Ok(())
    }

    /// Get all resource names (sorted)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
