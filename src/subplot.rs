use crate::data::{ColumnLabel, PlotData};
use std::collections::BTreeSet;

/// One stacked subplot and the columns drawn in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubplotGroup {
    /// Label prefix shared by every column of the group
    pub key: Vec<String>,
    /// Columns drawn as traces, in label order
    pub columns: Vec<ColumnLabel>,
}

impl SubplotGroup {
    pub fn title(&self) -> String {
        self.key.join(", ")
    }
}

/// Split the table columns into subplot groups.
///
/// Multi-level tables are grouped by every level but the last, so
/// `[(A,1), (A,2), (B,1)]` gives `A -> [1, 2]` and `B -> [1]`. Single-level
/// tables give one group per column, in table order. A column named by
/// `exclude` (the x selector) is left out.
pub fn calc_subplots(data: &PlotData, exclude: Option<&str>) -> Vec<SubplotGroup> {
    let excluded = |label: &ColumnLabel| {
        label.nlevels() == 1 && exclude.is_some_and(|name| label.0[0] == name)
    };

    if !data.is_multi_level() {
        return data
            .columns
            .iter()
            .filter(|c| !excluded(&c.label))
            .map(|c| SubplotGroup {
                key: c.label.0.clone(),
                columns: vec![c.label.clone()],
            })
            .collect();
    }

    let sorted = data.sorted_by_labels();
    let prefixes: BTreeSet<Vec<String>> = sorted
        .columns
        .iter()
        .map(|c| c.label.prefix().to_vec())
        .collect();

    prefixes
        .into_iter()
        .map(|key| SubplotGroup {
            columns: sorted
                .columns
                .iter()
                .filter(|c| c.label.prefix() == key.as_slice())
                .map(|c| c.label.clone())
                .collect(),
            key,
        })
        .collect()
}
