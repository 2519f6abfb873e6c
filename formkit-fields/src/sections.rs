//! Section classification for staged presentation (e.g. tabs).

use serde::Serialize;

use crate::types::{FieldDescriptor, Section};

/// Descriptors bucketed by section, each bucket in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sections {
    pub default: Vec<FieldDescriptor>,
    pub other: Vec<FieldDescriptor>,
    pub custom: Vec<FieldDescriptor>,
}

impl Sections {
    pub fn get(&self, section: Section) -> &[FieldDescriptor] {
        match section {
            Section::Default => &self.default,
            Section::Other => &self.other,
            Section::Custom => &self.custom,
        }
    }

    /// Non-empty buckets in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &[FieldDescriptor])> {
        Section::ALL
            .into_iter()
            .map(|section| (section, self.get(section)))
            .filter(|(_, fields)| !fields.is_empty())
    }

    pub fn len(&self) -> usize {
        self.default.len() + self.other.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stable partition of descriptors by their `section`.
pub fn classify(descriptors: &[FieldDescriptor]) -> Sections {
    let mut sections = Sections::default();
    for descriptor in descriptors {
        let bucket = match descriptor.section {
            Section::Default => &mut sections.default,
            Section::Other => &mut sections.other,
            Section::Custom => &mut sections.custom,
        };
        bucket.push(descriptor.clone());
    }
    sections
}
