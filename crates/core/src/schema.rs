//! Remote schema resolution
//!
//! Page databases may rename or localize their properties. Each required
//! property category is located by trying a preferred name list (the name
//! must exist with the expected type), then falling back to the first
//! property of that type in schema order.

use taskbridge_domain::constants::{
    EXECUTION_STATE_PROPERTY, KNOWLEDGE_LINK_PROPERTIES, KNOWLEDGE_SUMMARY_PROPERTIES,
    KNOWLEDGE_TITLE_PROPERTIES, LAST_SYNC_PROPERTY, TASK_ID_PROPERTIES, TASK_TITLE_PROPERTIES,
};
use taskbridge_domain::{DatabaseSchema, PropertyKind, Reason};

/// A property located in the remote schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub name: String,
    /// True when no preferred name matched and the first property of the
    /// expected type was used instead.
    pub fallback: bool,
}

/// Locates a property of `kind`, preferring `preferred` names in order.
pub fn resolve_property(
    schema: &DatabaseSchema,
    preferred: &[&str],
    kind: &PropertyKind,
) -> Option<ResolvedProperty> {
    preferred
        .iter()
        .find(|name| schema.has_property_of(name, kind))
        .map(|name| ResolvedProperty { name: (*name).to_string(), fallback: false })
        .or_else(|| {
            schema
                .first_of(kind)
                .map(|property| ResolvedProperty { name: property.name.clone(), fallback: true })
        })
}

/// Destination properties in a knowledge database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeProperties {
    pub title: ResolvedProperty,
    pub link: Option<ResolvedProperty>,
    pub summary: Option<ResolvedProperty>,
}

impl KnowledgeProperties {
    /// Resolves the knowledge properties; `link_property` is tried before
    /// the built-in link names.
    pub fn resolve(schema: &DatabaseSchema, link_property: &str) -> Result<Self, Reason> {
        let title = resolve_property(schema, &KNOWLEDGE_TITLE_PROPERTIES, &PropertyKind::Title)
            .ok_or(Reason::NoTitlePropertyInKnowledgeDb)?;

        let mut link_candidates = Vec::with_capacity(KNOWLEDGE_LINK_PROPERTIES.len() + 1);
        if !link_property.is_empty() {
            link_candidates.push(link_property);
        }
        link_candidates.extend(KNOWLEDGE_LINK_PROPERTIES);

        Ok(Self {
            title,
            link: resolve_property(schema, &link_candidates, &PropertyKind::Url),
            summary: resolve_property(
                schema,
                &KNOWLEDGE_SUMMARY_PROPERTIES,
                &PropertyKind::RichText,
            ),
        })
    }

    pub fn link_name(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.name.as_str())
    }

    pub fn summary_name(&self) -> Option<&str> {
        self.summary.as_ref().map(|summary| summary.name.as_str())
    }
}

/// Destination properties in a tasks database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProperties {
    pub title: ResolvedProperty,
    pub task_id: ResolvedProperty,
    /// Present only when typed `select`.
    pub execution_state: Option<String>,
    /// Present only when typed `date`.
    pub last_sync: Option<String>,
}

impl TaskProperties {
    pub fn resolve(schema: &DatabaseSchema) -> Result<Self, Reason> {
        let title = resolve_property(schema, &TASK_TITLE_PROPERTIES, &PropertyKind::Title)
            .ok_or(Reason::NoTitlePropertyInTasksDb)?;
        let task_id = resolve_property(schema, &TASK_ID_PROPERTIES, &PropertyKind::RichText)
            .ok_or(Reason::NoTaskIdPropertyInTasksDb)?;

        let typed = |name: &str, kind: PropertyKind| {
            schema.has_property_of(name, &kind).then(|| name.to_string())
        };

        Ok(Self {
            title,
            task_id,
            execution_state: typed(EXECUTION_STATE_PROPERTY, PropertyKind::Select),
            last_sync: typed(LAST_SYNC_PROPERTY, PropertyKind::Date),
        })
    }
}

#[cfg(test)]
mod tests {
    use taskbridge_domain::SchemaProperty;

    use super::*;

    fn schema(properties: &[(&str, PropertyKind)]) -> DatabaseSchema {
        DatabaseSchema::new(
            properties
                .iter()
                .map(|(name, kind)| SchemaProperty::new(*name, kind.clone()))
                .collect(),
        )
    }

    #[test]
    fn preferred_name_wins_over_schema_order() {
        let schema = schema(&[
            ("Other Link", PropertyKind::Url),
            ("GitHub PR Link", PropertyKind::Url),
            ("Name", PropertyKind::Title),
        ]);

        let props = KnowledgeProperties::resolve(&schema, "GitHub Canonical Link").unwrap();

        assert_eq!(props.title, ResolvedProperty { name: "Name".into(), fallback: false });
        assert_eq!(props.link_name(), Some("GitHub PR Link"));
        assert!(props.summary.is_none());
    }

    #[test]
    fn falls_back_to_first_property_of_type() {
        let schema = schema(&[
            ("Page", PropertyKind::Title),
            ("GitHub URL", PropertyKind::Url),
            ("Notes", PropertyKind::RichText),
        ]);

        let props = KnowledgeProperties::resolve(&schema, "GitHub Canonical Link").unwrap();

        assert_eq!(props.title, ResolvedProperty { name: "Page".into(), fallback: true });
        assert_eq!(
            props.link,
            Some(ResolvedProperty { name: "GitHub URL".into(), fallback: true })
        );
        assert_eq!(props.summary_name(), Some("Notes"));
    }

    #[test]
    fn preferred_name_with_wrong_type_is_skipped() {
        let schema = schema(&[
            ("Title", PropertyKind::Title),
            ("GitHub Canonical Link", PropertyKind::RichText),
            ("Link", PropertyKind::Url),
        ]);

        let props = KnowledgeProperties::resolve(&schema, "GitHub Canonical Link").unwrap();

        assert_eq!(props.link_name(), Some("Link"));
        assert_eq!(props.summary_name(), Some("GitHub Canonical Link"));
    }

    #[test]
    fn configured_link_property_is_tried_first() {
        let schema = schema(&[
            ("Title", PropertyKind::Title),
            ("URL", PropertyKind::Url),
            ("PR", PropertyKind::Url),
        ]);

        let props = KnowledgeProperties::resolve(&schema, "PR").unwrap();

        assert_eq!(props.link_name(), Some("PR"));
    }

    #[test]
    fn knowledge_without_title_fails() {
        let schema = schema(&[("URL", PropertyKind::Url)]);

        assert_eq!(
            KnowledgeProperties::resolve(&schema, "").unwrap_err(),
            Reason::NoTitlePropertyInKnowledgeDb
        );
    }

    #[test]
    fn task_properties_require_title_and_task_id() {
        let no_title = schema(&[("Task ID", PropertyKind::RichText)]);
        assert_eq!(
            TaskProperties::resolve(&no_title).unwrap_err(),
            Reason::NoTitlePropertyInTasksDb
        );

        let no_id = schema(&[("Task Name", PropertyKind::Title)]);
        assert_eq!(TaskProperties::resolve(&no_id).unwrap_err(), Reason::NoTaskIdPropertyInTasksDb);
    }

    #[test]
    fn task_state_properties_need_exact_types() {
        let schema = schema(&[
            ("名前", PropertyKind::Title),
            ("Notes", PropertyKind::RichText),
            ("タスクID", PropertyKind::RichText),
            ("Execution State", PropertyKind::Other("status".into())),
            ("Last Sync", PropertyKind::Date),
        ]);

        let props = TaskProperties::resolve(&schema).unwrap();

        assert_eq!(props.title.name, "名前");
        assert_eq!(props.task_id, ResolvedProperty { name: "タスクID".into(), fallback: false });
        assert!(props.execution_state.is_none());
        assert_eq!(props.last_sync.as_deref(), Some("Last Sync"));
    }
}
