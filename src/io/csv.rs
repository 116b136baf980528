use crate::config::{ColumnConfig, OutputFormat};
use crate::io::results::{FlowColumn, FlowTable};
use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::{debug, info};

// Column positions resolved against the CSV header
#[derive(Debug)]
struct ColumnLayout {
    index_name: String,
    index_pos: usize,
    flows: Vec<(String, usize)>,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord, columns: &ColumnConfig) -> Result<Self> {
        if headers.is_empty() {
            bail!("CSV has no header row");
        }
        let position = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h == name).with_context(|| {
                format!(
                    "Column `{}` not found; available columns: {}",
                    name,
                    headers.iter().collect::<Vec<_>>().join(", ")
                )
            })
        };

        let index_pos = match &columns.index {
            Some(name) => position(name)?,
            None => 0,
        };

        let flows = if columns.flows.is_empty() {
            headers
                .iter()
                .enumerate()
                .filter(|(pos, _)| *pos != index_pos)
                .map(|(pos, name)| (name.to_string(), pos))
                .collect::<Vec<_>>()
        } else {
            columns
                .flows
                .iter()
                .map(|name| Ok((name.clone(), position(name)?)))
                .collect::<Result<Vec<_>>>()?
        };

        if flows.is_empty() {
            bail!("CSV has no flow columns besides the index");
        }
        if let Some((name, _)) = flows.iter().find(|(_, pos)| *pos == index_pos) {
            bail!("Column `{}` cannot be both the index and a flow column", name);
        }

        Ok(ColumnLayout {
            index_name: headers[index_pos].to_string(),
            index_pos,
            flows,
        })
    }
}

// One parsed CSV row
#[derive(Debug)]
struct FlowRow {
    timestamp: String,
    flows: Vec<f64>,
}

impl FlowRow {
    fn from_record(record: &StringRecord, layout: &ColumnLayout) -> Result<Self> {
        let timestamp = record
            .get(layout.index_pos)
            .context("Record is missing the index field")?
            .to_string();

        let flows = layout
            .flows
            .iter()
            .map(|(name, pos)| {
                let field = record
                    .get(*pos)
                    .with_context(|| format!("Record is missing column `{}`", name))?;
                field
                    .parse::<f64>()
                    .with_context(|| format!("Invalid flow value `{}` in column `{}`", field, name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FlowRow { timestamp, flows })
    }
}

/// Read a time-indexed flow table from any CSV source.
pub fn read_flow_table<R: Read>(reader: R, columns: &ColumnConfig) -> Result<FlowTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let layout = ColumnLayout::resolve(&headers, columns)?;
    debug!(?layout, "Resolved CSV columns");

    let mut index = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); layout.flows.len()];
    for (row, result) in rdr.records().enumerate() {
        // +2: one-based line numbers after the header
        let line = row + 2;
        let record = result.with_context(|| format!("Failed to read CSV line {}", line))?;
        let flow_row = FlowRow::from_record(&record, &layout)
            .with_context(|| format!("Failed to parse CSV line {}", line))?;

        index.push(flow_row.timestamp);
        for (column, value) in values.iter_mut().zip(flow_row.flows) {
            column.push(value);
        }
    }

    if index.is_empty() {
        bail!("CSV contains no data rows");
    }

    let mut table = FlowTable::new(layout.index_name, index);
    for ((name, _), column) in layout.flows.into_iter().zip(values) {
        table.push_column(FlowColumn::new(name, column))?;
    }
    Ok(table)
}

/// Load a flow table from a CSV file.
pub fn load_flow_table(path: &Path, columns: &ColumnConfig) -> Result<FlowTable> {
    let file = File::open(path).with_context(|| format!("Failed to open input CSV: {:?}", path))?;
    let table = read_flow_table(BufReader::new(file), columns)
        .with_context(|| format!("Failed to load flow table from {:?}", path))?;

    info!(
        "Loaded {} rows x {} flow columns from {:?}",
        table.len(),
        table.columns.len(),
        path
    );
    Ok(table)
}

/// Write a flow table as CSV: the index column first, then each flow column.
pub fn write_flow_table<W: Write>(writer: W, table: &FlowTable) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);

    let mut header = vec![table.index_name.as_str()];
    header.extend(table.columns.iter().map(|c| c.name.as_str()));
    wtr.write_record(&header)?;

    for (row, timestamp) in table.index.iter().enumerate() {
        let mut record = Vec::with_capacity(table.columns.len() + 1);
        record.push(timestamp.clone());
        record.extend(table.columns.iter().map(|c| c.values[row].to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

/// Write a flow table to the configured destination.
pub fn save_flow_table(output: &OutputFormat, table: &FlowTable) -> Result<()> {
    match output {
        OutputFormat::Csv(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output CSV: {:?}", path))?;
            write_flow_table(file, table)?;
            info!("Routed flows saved to {:?}", path);
        }
        OutputFormat::Stdout => write_flow_table(std::io::stdout().lock(), table)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAGE: &str = "\
time,Flow (cfs),Stage (ft)
2024-05-01 00:00:00,1.5,3.1
2024-05-01 00:15:00,2,3.2
2024-05-01 00:30:00,3.25,3.4
";

    #[test]
    fn reads_every_non_index_column_by_default() {
        let table = read_flow_table(GAGE.as_bytes(), &ColumnConfig::new()).unwrap();

        assert_eq!(table.index_name, "time");
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.column("Flow (cfs)").unwrap().values, vec![1.5, 2.0, 3.25]);
        assert_eq!(table.column("Stage (ft)").unwrap().values, vec![3.1, 3.2, 3.4]);
    }

    #[test]
    fn selects_named_columns() {
        let columns = ColumnConfig {
            index: Some("time".into()),
            flows: vec!["Flow (cfs)".into()],
        };
        let table = read_flow_table(GAGE.as_bytes(), &columns).unwrap();
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.columns[0].name, "Flow (cfs)");
    }

    #[test]
    fn reports_unknown_column() {
        let columns = ColumnConfig {
            index: None,
            flows: vec!["Discharge".into()],
        };
        let err = read_flow_table(GAGE.as_bytes(), &columns).unwrap_err();
        assert!(format!("{err:#}").contains("Discharge"));
    }

    #[test]
    fn reports_bad_value_with_line() {
        let data = "time,q\n2024-05-01 00:00:00,1.0\n2024-05-01 00:15:00,abc\n";
        let err = read_flow_table(data.as_bytes(), &ColumnConfig::new()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("line 3"), "{message}");
        assert!(message.contains("abc"), "{message}");
    }

    #[test]
    fn rejects_header_only_and_index_only_tables() {
        assert!(read_flow_table("time,q\n".as_bytes(), &ColumnConfig::new()).is_err());
        assert!(read_flow_table("time\n2024-05-01\n".as_bytes(), &ColumnConfig::new()).is_err());
    }

    #[test]
    fn rejects_index_used_as_flow() {
        let columns = ColumnConfig {
            index: Some("time".into()),
            flows: vec!["time".into()],
        };
        assert!(read_flow_table(GAGE.as_bytes(), &columns).is_err());
    }

    #[test]
    fn writes_index_first_and_preserves_it() {
        let table = read_flow_table(GAGE.as_bytes(), &ColumnConfig::new()).unwrap();
        let mut out = Vec::new();
        write_flow_table(&mut out, &table).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), GAGE);
    }
}
