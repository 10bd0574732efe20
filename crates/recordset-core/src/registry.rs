//! The model registry.
//!
//! The registry is populated once at startup and is read-only afterwards.
//! Record sets look up models by name and resolve dotted field paths through
//! it.
//!
//! # Example
//!
//! ```
//! use recordset_core::{FieldInfo, ModelInfo, Registry, SqlType};
//!
//! let registry = Registry::builder()
//!     .model(
//!         ModelInfo::new("User", "users")
//!             .field(FieldInfo::new("Name", "name", SqlType::Text))
//!             .field(FieldInfo::many_to_one("Profile", "profile_id", "Profile")),
//!     )
//!     .model(
//!         ModelInfo::new("Profile", "profiles")
//!             .field(FieldInfo::new("Age", "age", SqlType::Integer)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let path = registry.resolve_path("User", "profile_id.age").unwrap();
//! assert_eq!(path.len(), 2);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::field::FieldInfo;
use crate::model::ModelInfo;
use crate::relationship::RelationshipKind;

/// One hop of a resolved field path: the model owning the field and the field.
pub type PathStep<'a> = (&'a ModelInfo, &'a FieldInfo);

/// Read-only set of model definitions.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    models: HashMap<String, Arc<ModelInfo>>,
}

impl Registry {
    /// Start declaring models.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a model by name.
    pub fn get(&self, model: &str) -> Option<&Arc<ModelInfo>> {
        self.models.get(model)
    }

    /// Look up a model, failing with [`Error::UnknownModel`].
    pub fn model(&self, model: &str) -> Result<&Arc<ModelInfo>> {
        self.get(model).ok_or_else(|| Error::UnknownModel {
            model: model.to_string(),
        })
    }

    /// Resolve a dotted field path starting at `model`.
    ///
    /// Every segment but the last must be a many-to-one field; each segment
    /// is looked up on the target model of the previous one.
    pub fn resolve_path<'a>(&'a self, model: &str, path: &str) -> Result<Vec<PathStep<'a>>> {
        let mut current: &ModelInfo = &**self.model(model)?;
        let segments: Vec<&str> = path.split('.').collect();
        let mut steps = Vec::with_capacity(segments.len());

        for (idx, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(Error::invalid_expression(path, "empty path segment"));
            }
            let field = current
                .get_field(segment)
                .ok_or_else(|| Error::unknown_field(current.name(), *segment))?;
            steps.push((current, field));

            if idx + 1 < segments.len() {
                let relation = field
                    .relation
                    .as_ref()
                    .filter(|r| r.kind == RelationshipKind::ManyToOne)
                    .ok_or_else(|| {
                        Error::invalid_expression(
                            path,
                            format!("`{segment}` is not a many-to-one field of `{}`", current.name()),
                        )
                    })?;
                current = &**self.model(&relation.target)?;
            }
        }

        Ok(steps)
    }

    /// Normalize a dotted path into column names (`Profile.Age` → `profile_id.age`).
    pub fn column_path(&self, model: &str, path: &str) -> Result<String> {
        let steps = self.resolve_path(model, path)?;
        Ok(steps
            .iter()
            .map(|(_, f)| f.column_name.as_str())
            .collect::<Vec<_>>()
            .join("."))
    }
}

/// Builder collecting model definitions before validation.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    models: Vec<ModelInfo>,
}

impl RegistryBuilder {
    /// Declare a model.
    #[must_use]
    pub fn model(mut self, model: ModelInfo) -> Self {
        self.models.push(model);
        self
    }

    /// Validate cross-model references and freeze the registry.
    pub fn build(self) -> Result<Registry> {
        let mut models = HashMap::with_capacity(self.models.len());
        for model in self.models {
            let name = model.name().to_string();
            if models.insert(name.clone(), Arc::new(model)).is_some() {
                return Err(Error::InvalidRegistry {
                    model: name,
                    reason: "model declared twice".to_string(),
                });
            }
        }

        let registry = Registry { models };
        for model in registry.models.values() {
            validate_model(&registry, model)?;
        }

        tracing::debug!(models = registry.models.len(), "Registry built");
        Ok(registry)
    }
}

fn validate_model(registry: &Registry, model: &ModelInfo) -> Result<()> {
    let invalid = |reason: String| Error::InvalidRegistry {
        model: model.name().to_string(),
        reason,
    };

    for field in model.fields() {
        if let Some(rel) = &field.relation {
            let target = registry.get(&rel.target).ok_or_else(|| {
                invalid(format!(
                    "field `{}` targets unknown model `{}`",
                    field.name, rel.target
                ))
            })?;
            match rel.kind {
                RelationshipKind::ManyToOne => {}
                RelationshipKind::OneToMany | RelationshipKind::ReverseOneToOne => {
                    let key = rel.reverse_key.as_deref().ok_or_else(|| {
                        invalid(format!("field `{}` has no reverse key", field.name))
                    })?;
                    let back = target.get_field(key).ok_or_else(|| {
                        invalid(format!(
                            "reverse key `{key}` of field `{}` is not a field of `{}`",
                            field.name, rel.target
                        ))
                    })?;
                    let points_back = back.relation.as_ref().is_some_and(|r| {
                        r.kind == RelationshipKind::ManyToOne && r.target == model.name()
                    });
                    if !points_back {
                        return Err(invalid(format!(
                            "reverse key `{key}` of field `{}` is not a many-to-one to `{}`",
                            field.name,
                            model.name()
                        )));
                    }
                }
                RelationshipKind::ManyToMany => {
                    if rel.link_table.is_none() {
                        return Err(invalid(format!(
                            "many-to-many field `{}` has no junction table",
                            field.name
                        )));
                    }
                }
            }
        }

        if let Some(path) = &field.related_path {
            registry
                .resolve_path(model.name(), path)
                .map_err(|e| invalid(format!("related path of `{}`: {e}", field.name)))?;
        }

        if let Some(rule) = &field.compute {
            for dep in rule.dependencies() {
                if model.get_field(dep).is_none() {
                    return Err(invalid(format!(
                        "computed field `{}` depends on unknown field `{dep}`",
                        field.name
                    )));
                }
            }
        }
    }
    Ok(())
}
