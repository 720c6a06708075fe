use relstore_core::{Connection, Entity, Property, RelationInfo, Result};

use super::many_through::Through;
use super::{Binding, RelationResolver};

/// One related entity per parent, through a mediator table.
pub struct OneThrough<'s, C> {
    through: Through<'s, C>,
}

impl<'s, C: Connection> OneThrough<'s, C> {
    pub(crate) fn new(binding: Binding<'s, C>) -> Result<Self> {
        Ok(Self {
            through: Through::new(binding)?,
        })
    }
}

impl<C: Connection> RelationResolver for OneThrough<'_, C> {
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
            // first link wins
            let Some(target) = found.into_iter().next() else {
                continue;
            };
            entities[i].set_property(b.container(), Property::One(Box::new(target)));
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
