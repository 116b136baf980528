use crate::io::results::{FlowColumn, FlowTable};
use crate::params::ReachParams;
use crate::routing::route_many_with;
use anyhow::{Context, Result};
use indicatif::ProgressBar;

/// Route every flow column of a table through the same reach.
///
/// Columns are independent series and are routed in parallel on the current
/// rayon pool, advancing `progress` once per finished column. The routed
/// table keeps the original index and column order. `initial_outflow`, when
/// set, applies to every column; otherwise each column starts from its own
/// first sample.
pub fn route_table(
    table: &FlowTable,
    reach: &ReachParams,
    sub_reaches: usize,
    initial_outflow: Option<f64>,
    progress: &ProgressBar,
) -> Result<FlowTable> {
    let outflows = route_many_with(
        &table.columns,
        reach,
        sub_reaches,
        initial_outflow,
        |_| progress.inc(1),
    )
    .with_context(|| {
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        format!("Failed to route columns: {}", names.join(", "))
    })?;

    let mut routed = FlowTable::new(table.index_name.clone(), table.index.clone());
    for (column, values) in table.columns.iter().zip(outflows) {
        routed.push_column(FlowColumn::new(column.name.clone(), values))?;
    }
    Ok(routed)
}
