//! Catalog snapshots: the batch input of routines, parameter rows and default rows

mod cache;
mod name_filter;
mod snapshot;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{CatalogParameter, DefaultInfo, DefaultInfoMap, RoutineDefinition};

pub use cache::SignatureCache;
pub use name_filter::NamePatternSet;
pub use snapshot::{load_cache, load_snapshot, save_cache, write_signatures};

/// Everything the engine needs for a batch of routines.
///
/// `defaults` is absent when the pre-parsed default source was not captured;
/// an empty list means it was captured and holds no rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub routines: Vec<RoutineDefinition>,
    #[serde(default)]
    pub parameters: Vec<CatalogParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Vec<DefaultInfo>>,
}

impl CatalogSnapshot {
    /// Catalog rows grouped by routine object id, in input order within each group
    pub fn parameters_by_routine(&self) -> BTreeMap<i64, Vec<CatalogParameter>> {
        let mut grouped: BTreeMap<i64, Vec<CatalogParameter>> = BTreeMap::new();
        for row in &self.parameters {
            grouped.entry(row.object_id).or_default().push(row.clone());
        }
        grouped
    }

    /// Default rows grouped by routine object id.
    ///
    /// `None` when the snapshot carries no default source at all.
    pub fn defaults_by_routine(&self) -> Option<BTreeMap<i64, DefaultInfoMap>> {
        let defaults = self.defaults.as_ref()?;
        let mut grouped: BTreeMap<i64, DefaultInfoMap> = BTreeMap::new();
        for info in defaults {
            grouped.entry(info.object_id).or_default().insert(info.clone());
        }
        Some(grouped)
    }
}
