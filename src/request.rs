use serde::{Deserialize, Deserializer, Serialize};

/// Reads a JSON string, number, boolean or null as a string. DataTables sends
/// `"data": null` for action columns and `"data": 0` for array-sourced rows.
/// Null and any other shape (such as an orthogonal-data object) read as "".
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => s,
        Some(Loose::Int(n)) => n.to_string(),
        Some(Loose::Float(n)) => n.to_string(),
        Some(Loose::Bool(b)) => b.to_string(),
        Some(Loose::Other(_)) | None => String::new(),
    })
}

/// Inbound DataTables server-side processing request.
///
/// Every field defaults when absent so that partial requests still
/// deserialize; problems with column names are reported by the translator,
/// not by serde.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataTablesRequest {
    /// Opaque client sequence token, echoed back unchanged.
    pub draw: i64,
    pub columns: Vec<Column>,
    pub search: Search,
    pub order: Vec<Order>,
    pub start: i64,
    /// Page size. Negative (DataTables sends `-1`) means all remaining rows.
    pub length: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Column {
    #[serde(deserialize_with = "lenient_string")]
    pub data: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    pub searchable: bool,
    pub orderable: bool,
}

impl Column {
    /// The record field this column refers to: `name` if set, else `data`.
    pub fn field_name(&self) -> &str {
        if self.name.is_empty() {
            &self.data
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Search {
    #[serde(deserialize_with = "lenient_string")]
    pub value: String,
}

impl Search {
    /// The search text, or `None` when it is empty or only whitespace.
    pub fn term(&self) -> Option<&str> {
        if self.value.trim().is_empty() {
            None
        } else {
            Some(&self.value)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Order {
    /// Index into `columns`. Kept signed so a bad index reaches the
    /// translator and is reported instead of rejecting the request.
    pub column: i64,
    pub dir: SortDirection,
}

impl Order {
    pub fn is_descending(&self) -> bool {
        self.dir == SortDirection::Desc
    }
}

impl DataTablesRequest {
    /// Row offset, with negative values treated as zero.
    pub fn offset(&self) -> u64 {
        self.start.max(0) as u64
    }

    /// Maximum rows to return, or `None` for all remaining rows.
    pub fn limit(&self) -> Option<u64> {
        if self.length < 0 {
            None
        } else {
            Some(self.length as u64)
        }
    }

    /// Caps the page size at `max`. A `max` of zero leaves the request as is.
    pub fn clamp_length(&mut self, max: u64) {
        if max == 0 {
            return;
        }
        let max = i64::try_from(max).unwrap_or(i64::MAX);
        if self.length < 0 || self.length > max {
            self.length = max;
        }
    }
}

/// Outbound page of rows in DataTables wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTablesResponse<T> {
    pub draw: i64,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}
