use crate::classify::{split_by_kind, ClassifierRules};
use crate::manifest::FileGroups;
use crate::model::ModuleInventory;

/// Which part of each module feeds a group manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Includes, packages and sources. The module's unclassified paths are
    /// reported.
    Production,
    /// Non-synthesizable paths only, re-split by file kind. Leftovers are
    /// reported.
    Test,
    /// Everything the module holds, for modules that are wholly test code.
    All,
}

/// Flattened file lists of several modules, in module order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub includes: Vec<String>,
    pub packages: Vec<String>,
    pub sources: Vec<String>,
    pub unclassified: Vec<String>,
}

impl Aggregate {
    pub fn file_groups(&self) -> FileGroups<'_> {
        FileGroups::new(&self.includes, &self.packages, &self.sources)
    }

    /// Appends `other` after `self`, list by list.
    pub fn merge(self, other: Aggregate) -> Aggregate {
        Aggregate {
            includes: concat(self.includes, other.includes),
            packages: concat(self.packages, other.packages),
            sources: concat(self.sources, other.sources),
            unclassified: concat(self.unclassified, other.unclassified),
        }
    }
}

pub fn aggregate(inventories: &[ModuleInventory], selector: Selector) -> Aggregate {
    aggregate_with(&ClassifierRules::default(), inventories, selector)
}

pub fn aggregate_with(
    rules: &ClassifierRules,
    inventories: &[ModuleInventory],
    selector: Selector,
) -> Aggregate {
    inventories
        .iter()
        .map(|inventory| select(rules, inventory, selector))
        .fold(Aggregate::default(), Aggregate::merge)
}

fn select(rules: &ClassifierRules, inventory: &ModuleInventory, selector: Selector) -> Aggregate {
    let production = || Aggregate {
        includes: inventory.includes.clone(),
        packages: inventory.packages.clone(),
        sources: inventory.sources.clone(),
        unclassified: inventory.unclassified.clone(),
    };
    let test = || {
        let split = split_by_kind(rules, &inventory.nonsynth);
        Aggregate {
            includes: split.includes,
            packages: split.packages,
            sources: split.sources,
            unclassified: split.unclassified,
        }
    };

    match selector {
        Selector::Production => production(),
        Selector::Test => test(),
        Selector::All => production().merge(test()),
    }
}

fn concat(mut head: Vec<String>, tail: Vec<String>) -> Vec<String> {
    head.extend(tail);
    head
}
