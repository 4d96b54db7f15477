/// Identifier of a physics material registered with a [`MaterialTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysicsMaterial(pub usize);

/// Friction/restitution used when bodies of two materials touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMaterial {
    pub a: PhysicsMaterial,
    pub b: PhysicsMaterial,
    pub friction: f32,
    pub restitution: f32,
}

impl ContactMaterial {
    fn pairs(&self, a: PhysicsMaterial, b: PhysicsMaterial) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }
}

/// Named materials plus the contact entries between them.
///
/// Pairs are unordered: `(a, b)` and `(b, a)` are the same entry.
#[derive(Debug, Default, Clone)]
pub struct MaterialTable {
    names: Vec<String>,
    contacts: Vec<ContactMaterial>,
}

impl MaterialTable {
    pub fn create(&mut self, name: impl Into<String>) -> PhysicsMaterial {
        self.names.push(name.into());
        PhysicsMaterial(self.names.len() - 1)
    }

    pub fn name(&self, material: PhysicsMaterial) -> Option<&str> {
        self.names.get(material.0).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Insert a contact entry, replacing any existing entry for the same pair.
    pub fn add_contact(&mut self, contact: ContactMaterial) {
        match self
            .contacts
            .iter_mut()
            .find(|c| c.pairs(contact.a, contact.b))
        {
            Some(existing) => *existing = contact,
            None => self.contacts.push(contact),
        }
    }

    pub fn contact(&self, a: PhysicsMaterial, b: PhysicsMaterial) -> Option<&ContactMaterial> {
        self.contacts.iter().find(|c| c.pairs(a, b))
    }

    pub fn contacts(&self) -> &[ContactMaterial] {
        &self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_lookup_is_unordered_and_replaces() {
        let mut table = MaterialTable::default();
        let player = table.create("player");
        let solid = table.create("solid");
        assert_eq!(table.name(solid), Some("solid"));

        table.add_contact(ContactMaterial {
            a: solid,
            b: player,
            friction: 0.5,
            restitution: 0.0,
        });
        assert_eq!(table.contact(player, solid).map(|c| c.friction), Some(0.5));

        table.add_contact(ContactMaterial {
            a: player,
            b: solid,
            friction: 0.2,
            restitution: 0.1,
        });
        assert_eq!(table.contacts().len(), 1);
        assert_eq!(table.contact(solid, player).map(|c| c.restitution), Some(0.1));
        assert!(table.contact(player, player).is_none());
    }
}
