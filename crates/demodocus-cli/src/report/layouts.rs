//! Order-stable wrapper around an analyzer `LayoutSet`, so the GML writer
//! can iterate layouts deterministically instead of at `HashMap` order's
//! mercy (§6 "analyzer-added positional fields").

use demodocus_core::analyzer::layout::Positions;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct LayoutLabels(pub BTreeMap<String, Positions>);
