use anyhow::Context;
use gcxgccore::mask::UNASSIGNED;
use gcxgccore::MaskIntegralSet;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// Integrals of one sample, ready for tabulation.
#[derive(Debug, Clone)]
pub struct IntegralRow {
    pub sample: String,
    pub integrals: MaskIntegralSet,
}

/// Writes one row per sample and one column per mask name; `unassigned`
/// comes last. Cells of masks a sample lacks stay empty.
pub fn write_integral_table<W: Write>(writer: W, rows: &[IntegralRow]) -> anyhow::Result<()> {
    let names: BTreeSet<&str> = rows.iter().flat_map(|row| row.integrals.names()).collect();
    let with_unassigned = rows.iter().any(|row| row.integrals.unassigned().is_some());

    let mut out = csv::Writer::from_writer(writer);
    let mut header = vec!["sample"];
    header.extend(names.iter().copied());
    if with_unassigned {
        header.push(UNASSIGNED);
    }
    out.write_record(&header).context("writing table header")?;

    for row in rows {
        let mut record = vec![row.sample.clone()];
        for name in &names {
            record.push(cell(row.integrals.get(name)));
        }
        if with_unassigned {
            record.push(cell(row.integrals.unassigned()));
        }
        out.write_record(&record)
            .with_context(|| format!("writing row for {}", row.sample))?;
    }
    out.flush().context("flushing integral table")?;
    Ok(())
}

pub fn save_integral_table(path: &Path, rows: &[IntegralRow]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating integral table {}", path.display()))?;
    write_integral_table(file, rows)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcxgccore::{Chromatogram2D, Mask, MaskIntegrator};
    use ndarray::Array2;

    fn integrals(names: &[&str]) -> MaskIntegralSet {
        let chrom = Chromatogram2D::new(
            Array2::ones((2, 2)),
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        )
        .unwrap();
        let masks: Vec<Mask> = names
            .iter()
            .map(|name| Mask::new(*name, Array2::ones((2, 2))))
            .collect();
        MaskIntegrator::new().integrate(&chrom, &masks, true).unwrap()
    }

    #[test]
    fn table_has_union_of_mask_columns() {
        let rows = vec![
            IntegralRow {
                sample: "a.csv".into(),
                integrals: integrals(&["alkanes"]),
            },
            IntegralRow {
                sample: "b.csv".into(),
                integrals: integrals(&["alkanes", "aromatics"]),
            },
        ];
        let mut buffer = Vec::new();
        write_integral_table(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sample,alkanes,aromatics,unassigned");
        assert_eq!(lines[1], "a.csv,1,,0");
        assert_eq!(lines[2], "b.csv,1,1,-1");
    }
}
