use std::collections::HashMap;

use relstore_core::{
    Connection, Entity, Error, Mediator, Model, Property, RelationInfo, Result, Value,
};

use super::{Binding, RelationResolver, index_by};
use crate::query::Operation;

/// Related entities reached through rows of a mediator table.
pub(crate) struct Through<'s, C> {
    binding: Binding<'s, C>,
    mediator: &'s Mediator,
    mediator_model: &'s Model,
}

impl<'s, C: Connection> Through<'s, C> {
    pub(crate) fn new(binding: Binding<'s, C>) -> Result<Self> {
        let relation = binding.relation();
        let mediator = relation.mediator().ok_or_else(|| {
            Error::definition(format!(
                "Relation \"{}\" of kind \"{}\" has no mediator table",
                relation.container(),
                relation.kind()
            ))
        })?;
        let mediator_model = binding.ctx().models().get(mediator.table())?;
        Ok(Self {
            binding,
            mediator,
            mediator_model,
        })
    }

    pub(crate) fn binding(&self) -> &Binding<'s, C> {
        &self.binding
    }

    /// Targets of every participating parent, by parent position.
    pub(crate) fn load(&self, entities: &[Entity]) -> Result<HashMap<usize, Vec<Entity>>> {
        let b = &self.binding;
        let mut resolved = HashMap::new();

        let parents: Vec<usize> = (0..entities.len())
            .filter(|&i| b.participates(&entities[i]))
            .collect();
        if parents.is_empty() {
            return Ok(resolved);
        }

        let links = Binding::key_conditions(
            b.plain(self.mediator_model, Operation::Read, None),
            self.mediator.in_keys(),
            parents.iter().map(|&i| &entities[i]),
        )
        .execute()?
        .into_many()?;
        if links.is_empty() {
            return Ok(resolved);
        }

        let query = Binding::key_conditions(
            b.query(Operation::Read, None),
            self.mediator.out_keys(),
            links.iter(),
        );
        let targets = b.referenced_conditions(query).execute()?.into_many()?;
        tracing::info!(
            parents = parents.len(),
            links = links.len(),
            related = targets.len(),
            "Loaded through relation batch"
        );

        let in_local: Vec<&str> = self.mediator.in_keys().iter().map(|k| k.local.as_str()).collect();
        let in_mediator: Vec<&str> = self
            .mediator
            .in_keys()
            .iter()
            .map(|k| k.referenced.as_str())
            .collect();
        let out_mediator: Vec<&str> = self
            .mediator
            .out_keys()
            .iter()
            .map(|k| k.local.as_str())
            .collect();
        let out_target: Vec<&str> = self
            .mediator
            .out_keys()
            .iter()
            .map(|k| k.referenced.as_str())
            .collect();

        let links_by_parent = index_by(&links, &in_mediator);
        let targets_by_link = index_by(&targets, &out_target);

        for &i in &parents {
            let key = entities[i].values_of(in_local.iter().copied());
            let Some(parent_links) = links_by_parent.get(&key) else {
                continue;
            };
            let found: Vec<Entity> = parent_links
                .iter()
                .filter_map(|link| targets_by_link.get(&link.values_of(out_mediator.iter().copied())))
                .flatten()
                .map(|target| (*target).clone())
                .collect();
            if !found.is_empty() {
                resolved.insert(i, found);
            }
        }
        Ok(resolved)
    }

    pub(crate) fn write(&self, entity: &mut Entity) -> Result<()> {
        let b = &self.binding;
        if !b.participates(entity) {
            return Ok(());
        }
        let Some(contained) = b.contained(entity)? else {
            return Ok(());
        };

        let mut written = Vec::with_capacity(contained.len());
        let mut kept_links: Vec<Vec<Value>> = Vec::with_capacity(contained.len());
        for mut target in contained {
            b.apply_referenced_values(&mut target);
            let target = b.query(Operation::Write, Some(target)).execute()?.into_entity()?;

            let mut link = Entity::new(self.mediator_model.entity());
            for key in self.mediator.in_keys() {
                link.set(key.referenced.clone(), entity.value(&key.local));
            }
            for key in self.mediator.out_keys() {
                link.set(key.local.clone(), target.value(&key.referenced));
            }
            let link = b
                .plain(self.mediator_model, Operation::Write, Some(link))
                .execute()?
                .into_entity()?;

            kept_links.push(self.mediator_model.identity(&link));
            written.push(target);
        }

        let existing = self
            .mediator
            .in_keys()
            .iter()
            .fold(
                b.plain(self.mediator_model, Operation::Read, None),
                |query, key| query.filter(key.referenced.clone(), entity.value(&key.local)),
            )
            .execute()?
            .into_many()?;

        let mut removed = 0_usize;
        for link in existing {
            if kept_links.contains(&self.mediator_model.identity(&link)) {
                continue;
            }
            b.plain(self.mediator_model, Operation::Delete, Some(link))
                .execute()?;
            removed += 1;
        }
        if removed > 0 {
            tracing::info!(
                relation = %b.container(),
                removed,
                "Removed stale mediator rows"
            );
        }

        b.store(entity, written);
        Ok(())
    }

    pub(crate) fn delete(&self, entity: &Entity) -> Result<()> {
        let b = &self.binding;
        let Some(contained) = b.contained(entity)? else {
            return Ok(());
        };
        for target in &contained {
            let query = self.mediator.in_keys().iter().fold(
                b.plain(self.mediator_model, Operation::Delete, None),
                |query, key| query.filter(key.referenced.clone(), entity.value(&key.local)),
            );
            self.mediator
                .out_keys()
                .iter()
                .fold(query, |query, key| {
                    query.filter(key.local.clone(), target.value(&key.referenced))
                })
                .execute()?;
        }
        Ok(())
    }

    pub(crate) fn clear(&self) -> Result<()> {
        self.binding
            .plain(self.mediator_model, Operation::Clear, None)
            .execute()?;
        Ok(())
    }
}

/// Many related entities per parent, through a mediator table.
pub struct ManyThrough<'s, C> {
    through: Through<'s, C>,
}

impl<'s, C: Connection> ManyThrough<'s, C> {
    pub(crate) fn new(binding: Binding<'s, C>) -> Result<Self> {
        Ok(Self {
            through: Through::new(binding)?,
        })
    }
}

impl<C: Connection> RelationResolver for ManyThrough<'_, C> {
    fn relation(&self) -> &RelationInfo {
        self.through.binding().relation()
    }

    fn check(&self, entity: &Entity) -> Result<()> {
        self.through.binding().contained(entity).map(|_| ())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(relation = %self.through.binding().container()))]
    fn read(&self, entities: &mut [Entity]) -> Result<()> {
        let b = self.through.binding();
        for (i, found) in self.through.load(entities)? {
            let mut list = match entities[i].remove(b.container()) {
                Some(Property::Many(list)) => list,
                Some(other) => {
                    tracing::warn!(
                        relation = %b.container(),
                        found = other.shape(),
                        "Replacing relation container that did not hold a list"
                    );
                    Vec::new()
                }
                None => Vec::new(),
            };
            list.extend(found);
            entities[i].set_property(b.container(), Property::Many(list));
            if b.is_transparent() {
                b.flatten(&mut entities[i]);
            }
        }
        Ok(())
    }

    fn write(&self, entity: &mut Entity) -> Result<()> {
        self.through.write(entity)
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        self.through.delete(entity)
    }

    fn clear(&self) -> Result<()> {
        self.through.clear()
    }
}
