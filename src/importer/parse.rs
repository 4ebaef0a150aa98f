use std::io::Read;

use csv::{StringRecord, Trim};
use lazy_static::lazy_static;
use regex::Regex;

use super::ImportError;

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub name: String,
    pub slug: String,
    pub color: String,
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input)
}

/// Reads every record as exactly `width` non-empty fields.
fn rows<R: Read>(input: R, width: usize) -> Result<Vec<(u64, Vec<String>)>, ImportError> {
    let mut out = Vec::new();
    for result in reader(input).records() {
        let record: StringRecord = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        if record.len() != width {
            return Err(ImportError::Malformed {
                line,
                reason: format!("expected {width} fields, found {}", record.len()),
            });
        }
        if let Some(i) = record.iter().position(str::is_empty) {
            return Err(ImportError::Malformed {
                line,
                reason: format!("field {} is empty", i + 1),
            });
        }
        out.push((line, record.iter().map(str::to_string).collect()));
    }
    Ok(out)
}

/// Parses headerless `name,unit` rows.
pub fn parse_ingredients<R: Read>(input: R) -> Result<Vec<IngredientRecord>, ImportError> {
    rows(input, 2)?
        .into_iter()
        .map(|(_, mut f)| {
            let measurement_unit = f.pop().unwrap_or_default();
            let name = f.pop().unwrap_or_default();
            Ok(IngredientRecord {
                name,
                measurement_unit,
            })
        })
        .collect()
}

/// Parses headerless `name,slug,color` rows.
pub fn parse_tags<R: Read>(input: R) -> Result<Vec<TagRecord>, ImportError> {
    rows(input, 3)?
        .into_iter()
        .map(|(line, mut f)| {
            let color = f.pop().unwrap_or_default();
            let slug = f.pop().unwrap_or_default();
            let name = f.pop().unwrap_or_default();
            if !HEX_COLOR.is_match(&color) {
                return Err(ImportError::Malformed {
                    line,
                    reason: format!("color {color:?} is not a #RRGGBB value"),
                });
            }
            Ok(TagRecord { name, slug, color })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredients_are_trimmed() {
        let rows = parse_ingredients(" томаты , г \nсоль,г\n".as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![
                IngredientRecord {
                    name: "томаты".into(),
                    measurement_unit: "г".into()
                },
                IngredientRecord {
                    name: "соль".into(),
                    measurement_unit: "г".into()
                },
            ]
        );
    }

    #[test]
    fn first_row_is_data_not_header() {
        let rows = parse_ingredients("name,measurement_unit\n".as_bytes()).unwrap();
        assert_eq!(rows[0].name, "name");
    }

    #[test]
    fn malformed_row_reports_its_line() {
        let err = parse_ingredients("соль,г\nперец\n".as_bytes()).unwrap_err();
        match err {
            ImportError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_field_is_rejected() {
        assert!(parse_ingredients("соль,\n".as_bytes()).is_err());
    }

    #[test]
    fn tags_parse_and_check_color() {
        let tags = parse_tags("Завтрак,breakfast,#E26C2D\n".as_bytes()).unwrap();
        assert_eq!(tags[0].slug, "breakfast");
        assert_eq!(tags[0].color, "#E26C2D");

        let err = parse_tags("Обед,lunch,green\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::Malformed { line: 1, .. }));
    }
}
