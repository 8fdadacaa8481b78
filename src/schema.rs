//! Column schema and record types shared by the table core and the
//! export backends.

/// Describes how to read and label one field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub key: String,
    pub header: String,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        ColumnDef {
            key: key.into(),
            header: header.into(),
        }
    }

    /// Parse a `key` or `key:Header` CLI column selector.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((key, header)) => ColumnDef::new(key.trim(), header.trim()),
            None => ColumnDef::new(spec.trim(), spec.trim()),
        }
    }
}

/// One logical row: an open, ordered field-name-to-value mapping.
///
/// All values are held as their textual representation (the loader casts
/// every column to its string representation). Fields a column definition
/// references but the record lacks read as the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Record { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Field value for `key`, absent fields resolving to "".
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Record::new(iter.into_iter().collect())
    }
}

/// Union of all field names over `records`, in first-seen order.
///
/// The spreadsheet backend exports every raw field, not only the declared
/// display columns, so the header row is derived from the data itself.
pub fn field_union(records: &[Record]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in records {
        for name in record.field_names() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn absent_field_reads_as_empty() {
        let r = record(&[("name", "Ada")]);
        assert_eq!(r.get("age"), None);
        assert_eq!(r.value("age"), "");
        assert_eq!(r.value("name"), "Ada");
    }

    #[test]
    fn column_selector_with_label() {
        let col = ColumnDef::parse("dob: Date of birth");
        assert_eq!(col.key, "dob");
        assert_eq!(col.header, "Date of birth");

        let plain = ColumnDef::parse("name");
        assert_eq!(plain.key, "name");
        assert_eq!(plain.header, "name");
    }

    #[test]
    fn field_union_keeps_first_seen_order() {
        let records = vec![
            record(&[("a", "1"), ("b", "2")]),
            record(&[("b", "3"), ("c", "4")]),
        ];
        assert_eq!(field_union(&records), vec!["a", "b", "c"]);
    }
}
