use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Column holding the contact name.
pub const NAME_COLUMN: usize = 0;
/// Columns holding x, y, z in scanner space.
pub const COORD_COLUMNS: [usize; 3] = [10, 11, 12];

/// One contact row of the scanner-space coordinate file.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRecord {
    pub contact: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// 1-based line in the source, for messages.
    pub line: u64,
}

impl CoordinateRecord {
    pub fn point(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    fn from_csv(record: &StringRecord, line: u64) -> Result<Self> {
        let needed = COORD_COLUMNS[2] + 1;
        if record.len() < needed {
            bail!(
                "line {}: expected at least {} columns, found {}",
                line,
                needed,
                record.len()
            );
        }

        let contact = record[NAME_COLUMN].to_string();
        if contact.is_empty() {
            bail!("line {}: empty contact name", line);
        }

        let mut xyz = [0.0; 3];
        for (value, &col) in xyz.iter_mut().zip(COORD_COLUMNS.iter()) {
            let field = &record[col];
            *value = field.parse::<f64>().map_err(|e| {
                anyhow!(
                    "line {}: column {} ('{}') for contact {} is not a number: {}",
                    line,
                    col,
                    field,
                    contact,
                    e
                )
            })?;
            if !value.is_finite() {
                bail!(
                    "line {}: column {} ('{}') for contact {} is not a finite number",
                    line,
                    col,
                    field,
                    contact
                );
            }
        }

        Ok(Self {
            contact,
            x: xyz[0],
            y: xyz[1],
            z: xyz[2],
            line,
        })
    }
}

/// Reads every contact row from `path`.
///
/// Any malformed row fails the whole read; nothing is partially returned.
pub fn read_coordinate_records<P: AsRef<Path>>(
    path: P,
    has_headers: bool,
) -> Result<Vec<CoordinateRecord>> {
    let file = File::open(&path).with_context(|| {
        format!(
            "failed to open coordinate file {}",
            path.as_ref().display()
        )
    })?;
    read_coordinate_records_from(file, has_headers)
        .with_context(|| format!("failed to parse {}", path.as_ref().display()))
}

pub fn read_coordinate_records_from<R: Read>(
    reader: R,
    has_headers: bool,
) -> Result<Vec<CoordinateRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("failed to read row {}", i + 1))?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 1);
        records.push(CoordinateRecord::from_csv(&record, line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::coords_row;
    use std::io::Write;

    #[test]
    fn test_reads_name_and_columns_10_to_12() {
        let data = format!(
            "{}\n{}\n",
            coords_row("LA1", [1.5, -2.0, 3.25]),
            "LA2,a,b,c,d,e,f,g,h,i,4,5,6,extra,columns"
        );
        let records = read_coordinate_records_from(data.as_bytes(), false).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].contact, "LA1");
        assert_eq!(records[0].point(), [1.5, -2.0, 3.25]);
        assert_eq!(records[0].line, 1);
        assert_eq!(records[1].contact, "LA2");
        assert_eq!(records[1].point(), [4.0, 5.0, 6.0]);
        assert_eq!(records[1].line, 2);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let data = " LA1 ,0,0,0,0,0,0,0,0,0, 1.0 ,2.0,  3.0 \n";
        let records = read_coordinate_records_from(data.as_bytes(), false).unwrap();
        assert_eq!(records[0].contact, "LA1");
        assert_eq!(records[0].point(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_header_row_skipped_when_requested() {
        let data = format!(
            "name,c1,c2,c3,c4,c5,c6,c7,c8,c9,x,y,z\n{}\n",
            coords_row("RB1", [7.0, 8.0, 9.0])
        );
        let records = read_coordinate_records_from(data.as_bytes(), true).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contact, "RB1");
    }

    #[test]
    fn test_unparseable_coordinate_is_fatal() {
        let data = format!(
            "{}\nLA2,0,0,0,0,0,0,0,0,0,1.0,oops,3.0\n",
            coords_row("LA1", [1.0, 2.0, 3.0])
        );
        let err = read_coordinate_records_from(data.as_bytes(), false).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 2"), "{}", msg);
        assert!(msg.contains("oops"), "{}", msg);
    }

    #[test]
    fn test_non_finite_coordinate_is_fatal() {
        for bad in ["inf", "NaN", "-infinity"] {
            let data = format!("LA1,0,0,0,0,0,0,0,0,0,{},2,3\n", bad);
            let err = read_coordinate_records_from(data.as_bytes(), false).unwrap_err();
            assert!(err.to_string().contains("not a finite number"), "{}", err);
        }
    }

    #[test]
    fn test_short_row_is_fatal() {
        let data = "LA1,1,2,3\n";
        assert!(read_coordinate_records_from(data.as_bytes(), false).is_err());
    }

    #[test]
    fn test_reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", coords_row("LA3", [0.0, 0.0, 1.0])).unwrap();
        let records = read_coordinate_records(file.path(), false).unwrap();
        assert_eq!(records[0].contact, "LA3");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_coordinate_records("/nonexistent/coords.csv", false).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/coords.csv"));
    }
}
