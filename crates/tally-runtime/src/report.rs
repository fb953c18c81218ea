use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use facet::Facet;

use crate::key::CallKey;

pub const REPORT_HEADER: &str = "Usage Report";

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub location: String,
    pub count: u64,
}

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct TaggedSection {
    pub tag: String,
    pub entries: Vec<ReportEntry>,
}

/// Usage grouped by tag, built from one consistent view of a registry.
#[derive(Facet, Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub tags: Vec<String>,
    pub untagged: Vec<ReportEntry>,
    pub tagged: Vec<TaggedSection>,
}

impl Report {
    pub(crate) fn from_counts(counts: &BTreeMap<CallKey, u64>) -> Self {
        let tags: BTreeSet<&str> = counts
            .keys()
            .filter(|key| !key.is_untagged())
            .map(CallKey::tag)
            .collect();

        let entries_for = |tag: &str| -> Vec<ReportEntry> {
            counts
                .iter()
                .filter(|(key, _)| key.tag() == tag)
                .map(|(key, count)| ReportEntry {
                    location: key.location().to_owned(),
                    count: *count,
                })
                .collect()
        };

        Self {
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            untagged: entries_for(crate::UNTAGGED),
            tagged: tags
                .iter()
                .map(|tag| TaggedSection {
                    tag: (*tag).to_owned(),
                    entries: entries_for(*tag),
                })
                .collect(),
        }
    }

    pub fn total(&self) -> u64 {
        let untagged: u64 = self.untagged.iter().map(|entry| entry.count).sum();
        let tagged: u64 = self
            .tagged
            .iter()
            .flat_map(|section| &section.entries)
            .map(|entry| entry.count)
            .sum();
        untagged + tagged
    }
}

fn write_entries(f: &mut fmt::Formatter<'_>, entries: &[ReportEntry]) -> fmt::Result {
    for entry in entries {
        writeln!(f, "  Key = {}", entry.location)?;
        writeln!(f, "  Count = {}", entry.count)?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{REPORT_HEADER}")?;
        if self.tags.is_empty() {
            writeln!(f, "No Tags Detected")?;
        } else {
            writeln!(f, "Tags Detected: [{}]", self.tags.join(", "))?;
        }

        writeln!(f)?;
        writeln!(f, "Untagged Calls")?;
        write_entries(f, &self.untagged)?;

        for section in &self.tagged {
            writeln!(f)?;
            writeln!(f, "Tagged Calls: {}", section.tag)?;
            write_entries(f, &section.entries)?;
        }
        Ok(())
    }
}
