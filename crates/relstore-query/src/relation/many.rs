use relstore_core::{Connection, Entity, Property, RelationInfo, Result};

use super::{Binding, RelationResolver, index_by};
use crate::query::Operation;

/// A list of related entities per parent, matched on key pairs.
pub struct Many<'s, C> {
    binding: Binding<'s, C>,
}

impl<'s, C: Connection> Many<'s, C> {
    pub(crate) fn new(binding: Binding<'s, C>) -> Self {
        Self { binding }
    }
}

impl<C: Connection> RelationResolver for Many<'_, C> {
    fn relation(&self) -> &RelationInfo {
        self.binding.relation()
    }

    fn check(&self, entity: &Entity) -> Result<()> {
        self.binding.contained(entity).map(|_| ())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(relation = %self.binding.container()))]
    fn read(&self, entities: &mut [Entity]) -> Result<()> {
        let b = &self.binding;
        let keys = b.relation().keys();

        let parents: Vec<usize> = (0..entities.len())
            .filter(|&i| b.participates(&entities[i]))
            .collect();
        if parents.is_empty() {
            return Ok(());
        }

        let query = Binding::key_conditions(
            b.query(Operation::Read, None),
            keys,
            parents.iter().map(|&i| &entities[i]),
        );
        let related = b.referenced_conditions(query).execute()?.into_many()?;
        tracing::info!(
            parents = parents.len(),
            related = related.len(),
            "Loaded one-to-many relation batch"
        );

        let referenced: Vec<&str> = keys.iter().map(|k| k.referenced.as_str()).collect();
        let index = index_by(&related, &referenced);
        let local: Vec<&str> = keys.iter().map(|k| k.local.as_str()).collect();

        for &i in &parents {
            let key = entities[i].values_of(local.iter().copied());
            let Some(matches) = index.get(&key) else {
                continue;
            };
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
            list.extend(matches.iter().map(|e| (*e).clone()));
            entities[i].set_property(b.container(), Property::Many(list));
            if b.is_transparent() {
                b.flatten(&mut entities[i]);
            }
        }
        Ok(())
    }

    fn write(&self, entity: &mut Entity) -> Result<()> {
        let b = &self.binding;
        if !b.participates(entity) {
            return Ok(());
        }
        let Some(contained) = b.contained(entity)? else {
            return Ok(());
        };

        let mut written = Vec::with_capacity(contained.len());
        for mut related in contained {
            b.apply_referenced_values(&mut related);
            for key in b.relation().keys() {
                related.set(key.referenced.clone(), entity.value(&key.local));
            }
            written.push(b.query(Operation::Write, Some(related)).execute()?.into_entity()?);
        }

        let keep: Vec<_> = written.iter().map(|e| b.related().identity(e)).collect();
        b.remove_orphans(entity, &keep)?;
        b.store(entity, written);
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        let b = &self.binding;
        let Some(contained) = b.contained(entity)? else {
            return Ok(());
        };
        for related in contained {
            b.query(Operation::Delete, Some(related)).execute()?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let b = &self.binding;
        b.plain(b.related(), Operation::Clear, None).execute()?;
        Ok(())
    }
}
