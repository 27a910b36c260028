use crate::error::FieldParseError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::macros::format_description;
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// One film as the index sees it. Optional fields are either present and valid or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub revenue: Option<i64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default, with = "iso_date::option")]
    pub release_date: Option<Date>,
}

impl Record {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            overview: String::new(),
            tagline: String::new(),
            runtime: None,
            revenue: None,
            vote_average: None,
            release_date: None,
        }
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = overview.into();
        self
    }

    pub fn with_tagline(mut self, tagline: impl Into<String>) -> Self {
        self.tagline = tagline.into();
        self
    }

    pub fn with_runtime(mut self, minutes: i32) -> Self {
        self.runtime = Some(minutes);
        self
    }

    pub fn with_revenue(mut self, revenue: i64) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn with_vote_average(mut self, vote_average: f64) -> Self {
        self.vote_average = Some(vote_average);
        self
    }

    pub fn with_release_date(mut self, date: Date) -> Self {
        self.release_date = Some(date);
        self
    }

    /// Title, tagline and overview joined; this is the only text that gets indexed.
    pub fn combined_text(&self) -> String {
        format!("{} {} {}", self.title, self.tagline, self.overview)
    }
}

/// A record as handed over by an ingestion source, optional fields still unparsed.
/// Feeds may send any of them as JSON strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "required_text")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub runtime: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub revenue: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub vote_average: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub release_date: Option<String>,
}

/// Strings pass through and numbers keep their JSON spelling. Anything else is
/// kept as JSON text, so the field parser rejects it for this record only.
fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn required_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(loose_text(deserializer)?.unwrap_or_default())
}

impl RawRecord {
    /// Parse every optional field independently. A field that fails to parse is
    /// logged and left absent; the record itself is always produced.
    pub fn parse(self) -> Record {
        let (record, errors) = self.parse_with_errors();
        for err in errors {
            tracing::warn!(error = %err, "field degraded to absent");
        }
        record
    }

    pub fn parse_with_errors(self) -> (Record, Vec<FieldParseError>) {
        let mut errors = Vec::new();
        let id = self.id;
        let runtime = parse_field(&id, "runtime", self.runtime, parse_whole, &mut errors);
        let revenue = parse_field(&id, "revenue", self.revenue, parse_whole_i64, &mut errors);
        let vote_average = parse_field(&id, "vote_average", self.vote_average, parse_vote_average, &mut errors);
        let release_date = parse_field(&id, "release_date", self.release_date, parse_date, &mut errors);

        let record = Record {
            id,
            title: self.title,
            overview: self.overview,
            tagline: self.tagline,
            runtime,
            revenue,
            vote_average,
            release_date,
        };
        (record, errors)
    }
}

fn parse_field<T>(
    record: &str,
    field: &'static str,
    raw: Option<String>,
    parse: fn(&str) -> Result<T, String>,
    errors: &mut Vec<FieldParseError>,
) -> Option<T> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse(trimmed) {
        Ok(v) => Some(v),
        Err(reason) => {
            errors.push(FieldParseError { record: record.to_string(), field, value: raw.clone(), reason });
            None
        }
    }
}

fn parse_whole(s: &str) -> Result<i32, String> {
    let v = parse_whole_i64(s)?;
    i32::try_from(v).map_err(|_| format!("{v} out of range"))
}

/// Integer text, or decimal text with no fractional part ("136.0").
fn parse_whole_i64(s: &str) -> Result<i64, String> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    let f: f64 = s.parse().map_err(|_| "not a number".to_string())?;
    if !f.is_finite() || f.fract() != 0.0 || f.abs() > i64::MAX as f64 {
        return Err("not a whole number".into());
    }
    Ok(f as i64)
}

fn parse_vote_average(s: &str) -> Result<f64, String> {
    let f: f64 = s.parse().map_err(|_| "not a number".to_string())?;
    if f.is_finite() { Ok(f) } else { Err("not finite".into()) }
}

/// `YYYY-MM-DD`, or `M/D/YYYY` with or without zero padding.
pub fn parse_date(s: &str) -> Result<Date, String> {
    let iso = format_description!("[year]-[month]-[day]");
    let us = format_description!("[month padding:none]/[day padding:none]/[year]");
    let us_padded = format_description!("[month]/[day]/[year]");
    Date::parse(s, iso)
        .or_else(|_| Date::parse(s, us))
        .or_else(|_| Date::parse(s, us_padded))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn raw(runtime: &str, revenue: &str, vote: &str, released: &str) -> RawRecord {
        RawRecord {
            id: "603".into(),
            title: "The Matrix".into(),
            runtime: Some(runtime.into()),
            revenue: Some(revenue.into()),
            vote_average: Some(vote.into()),
            release_date: Some(released.into()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_well_formed_fields() {
        let (rec, errors) = raw("136.0", "463517383", "8.7", "1999-03-30").parse_with_errors();
        assert!(errors.is_empty());
        assert_eq!(rec.runtime, Some(136));
        assert_eq!(rec.revenue, Some(463_517_383));
        assert_eq!(rec.vote_average, Some(8.7));
        assert_eq!(rec.release_date, Some(date!(1999 - 03 - 30)));
    }

    #[test]
    fn bad_fields_degrade_individually() {
        let (rec, errors) = raw("long", "12.5", "NaN", "someday").parse_with_errors();
        assert_eq!(rec.title, "The Matrix");
        assert_eq!(rec.runtime, None);
        assert_eq!(rec.revenue, None);
        assert_eq!(rec.vote_average, None);
        assert_eq!(rec.release_date, None);
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["runtime", "revenue", "vote_average", "release_date"]);
    }

    #[test]
    fn blank_fields_are_absent_without_error() {
        let (rec, errors) = raw("", "  ", "", "").parse_with_errors();
        assert!(errors.is_empty());
        assert_eq!(rec.runtime, None);
        assert_eq!(rec.release_date, None);
    }

    #[test]
    fn numeric_json_fields_are_accepted() {
        let json = r#"[
            {"id": 1, "title": "Heat", "runtime": 170, "revenue": 187436818, "vote_average": 7.9},
            {"id": "2", "title": "Alien", "runtime": "117", "vote_average": null, "release_date": true}
        ]"#;
        let raws: Vec<RawRecord> = serde_json::from_str(json).unwrap();
        let (heat, errors) = raws[0].clone().parse_with_errors();
        assert!(errors.is_empty());
        assert_eq!(heat.id, "1");
        assert_eq!(heat.runtime, Some(170));
        assert_eq!(heat.revenue, Some(187_436_818));
        assert_eq!(heat.vote_average, Some(7.9));

        let (alien, errors) = raws[1].clone().parse_with_errors();
        assert_eq!(alien.runtime, Some(117));
        assert_eq!(alien.vote_average, None);
        assert_eq!(alien.release_date, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "release_date");
    }

    #[test]
    fn us_style_dates() {
        assert_eq!(parse_date("3/30/1999"), Ok(date!(1999 - 03 - 30)));
        assert_eq!(parse_date("03/30/1999"), Ok(date!(1999 - 03 - 30)));
        assert!(parse_date("1999-02-30").is_err());
    }

    #[test]
    fn combined_text_order() {
        let rec = Record::new("1", "Title").with_tagline("Tag").with_overview("Over");
        assert_eq!(rec.combined_text(), "Title Tag Over");
    }

    #[test]
    fn release_date_serializes_as_iso_string() {
        let rec = Record::new("1", "T").with_release_date(date!(2010 - 07 - 16));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["release_date"], "2010-07-16");
        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}
