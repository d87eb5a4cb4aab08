//! Query form for the Fink broker.
//!
//! The host UI renders these fields and posts the collected values back as a
//! flat string map. The form itself performs no cross-field validation; the
//! "exactly one search" rule lives in [`crate::broker::query::QueryMode`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw form values keyed by field name.
pub type QueryParameters = HashMap<String, String>;

/// Which search a form field drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    ObjectId,
    ConeSearch,
    DateSearch,
    ClassSearch,
    ClassSearchDate,
    Sso,
}

/// Static description of one optional text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormField {
    #[serde(skip)]
    pub kind: SearchKind,
    pub name: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub help_text: &'static str,
    pub required: bool,
}

const fn optional(
    kind: SearchKind,
    name: &'static str,
    label: &'static str,
    placeholder: &'static str,
    help_text: &'static str,
) -> FormField {
    FormField {
        kind,
        name,
        label,
        placeholder,
        help_text,
        required: false,
    }
}

pub const OBJECT_ID: &str = "objectId";
pub const CONE_SEARCH: &str = "conesearch";
pub const DATE_SEARCH: &str = "datesearch";
pub const CLASS_SEARCH: &str = "classsearch";
pub const CLASS_SEARCH_DATE: &str = "classsearchdate";
pub const SSO_SEARCH: &str = "ssosearch";

/// Every search field, in display order.
pub static SEARCH_FIELDS: [FormField; 6] = [
    optional(
        SearchKind::ObjectId,
        OBJECT_ID,
        "ZTF Object ID",
        "ZTF19acnjwgm",
        "Search all alerts for a given ZTF object ID.",
    ),
    optional(
        SearchKind::ConeSearch,
        CONE_SEARCH,
        "Cone Search",
        "RA, Dec, radius",
        "Comma-separated RA, Dec (decimal degrees) and radius (arcsecond), e.g. 271.39, 45.25, 5.",
    ),
    optional(
        SearchKind::DateSearch,
        DATE_SEARCH,
        "Date Search",
        "startdate, window",
        "Comma-separated start date (ISO, JD or MJD) and time window in minutes, e.g. 2021-06-01 05:59:37.000, 2.",
    ),
    optional(
        SearchKind::ClassSearch,
        CLASS_SEARCH,
        "Class Search",
        "class, n",
        "Comma-separated class name and number of latest alerts, e.g. Early SN candidate, 10.",
    ),
    optional(
        SearchKind::ClassSearchDate,
        CLASS_SEARCH_DATE,
        "Class Search (date)",
        "class, n_days_in_past",
        "Comma-separated class name and number of days in the past, e.g. Early SN candidate, 10.",
    ),
    optional(
        SearchKind::Sso,
        SSO_SEARCH,
        "Solar System Object",
        "number or designation",
        "Search a Solar System object by number or designation, e.g. 8467 or 2010JO69.",
    ),
];

/// Values posted by the host UI.
///
/// `query_name` and `broker` are bookkeeping fields owned by the host and
/// are ignored by the broker adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub query_name: String,
    #[serde(default)]
    pub broker: String,
    #[serde(default, rename = "objectId")]
    pub object_id: String,
    #[serde(default)]
    pub conesearch: String,
    #[serde(default)]
    pub datesearch: String,
    #[serde(default)]
    pub classsearch: String,
    #[serde(default)]
    pub classsearchdate: String,
    #[serde(default)]
    pub ssosearch: String,
}

impl QueryForm {
    /// Field descriptors for rendering.
    pub fn fields() -> &'static [FormField] {
        &SEARCH_FIELDS
    }

    /// Flatten into the parameter map consumed by the broker.
    pub fn into_parameters(self) -> QueryParameters {
        let mut out = QueryParameters::new();
        out.insert("query_name".into(), self.query_name);
        out.insert("broker".into(), self.broker);
        out.insert(OBJECT_ID.into(), self.object_id);
        out.insert(CONE_SEARCH.into(), self.conesearch);
        out.insert(DATE_SEARCH.into(), self.datesearch);
        out.insert(CLASS_SEARCH.into(), self.classsearch);
        out.insert(CLASS_SEARCH_DATE.into(), self.classsearchdate);
        out.insert(SSO_SEARCH.into(), self.ssosearch);
        out
    }
}
