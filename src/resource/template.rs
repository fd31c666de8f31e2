//! URL templates and resource-name inflection

use std::borrow::Cow;

/// Placeholder replaced with the project name
pub const PROJECT_PLACEHOLDER: &str = ":project";

/// Placeholder replaced with an entity identifier
pub const ID_PLACEHOLDER: &str = ":id";

/// Expand a URL template.
///
/// `:project` is always substituted. `:id` is only substituted when `id` is
/// given; otherwise the placeholder stays in the output so the caller can
/// detect the missing identifier with [`has_unresolved_id`].
pub fn resolve(template: &str, project: &str, id: Option<&str>) -> String {
    let url = template.replace(PROJECT_PLACEHOLDER, project);
    match id {
        Some(id) => url.replace(ID_PLACEHOLDER, id),
        None => url,
    }
}

/// True if the `:id` placeholder survived resolution
pub fn has_unresolved_id(url: &str) -> bool {
    url.contains(ID_PLACEHOLDER)
}

/// Singular form of a resource name.
///
/// The dispatcher compares a requested name to this form to tell list
/// requests (`stories`) from show requests (`story`).
pub fn singularize(name: &str) -> Cow<'_, str> {
    if let Some(stem) = name.strip_suffix("ies") {
        if !stem.is_empty() {
            return Cow::Owned(format!("{}y", stem));
        }
    }
    if name.ends_with("ss") {
        return Cow::Borrowed(name);
    }
    Cow::Borrowed(name.strip_suffix('s').unwrap_or(name))
}

/// True if `name` asks for a collection rather than a single item
pub fn is_plural(name: &str) -> bool {
    singularize(name) != name
}
