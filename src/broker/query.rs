// src/broker/query.rs
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::{FinkError, Result};
use crate::form::{
    QueryParameters, SearchKind, CLASS_SEARCH, CLASS_SEARCH_DATE, CONE_SEARCH, DATE_SEARCH,
    OBJECT_ID, SEARCH_FIELDS, SSO_SEARCH,
};
use crate::time::window_ending_at;

pub const OBJECTS_ENDPOINT: &str = "/api/v1/objects";
pub const EXPLORER_ENDPOINT: &str = "/api/v1/explorer";
pub const LATESTS_ENDPOINT: &str = "/api/v1/latests";
pub const SSO_ENDPOINT: &str = "/api/v1/sso";

/// Number of alerts requested by a class search over a date window.
pub const CLASS_DATE_LIMIT: u32 = 1000;

/// One of the six mutually-exclusive searches.
///
/// Comma-separated parts are kept as typed by the user (no per-part trim),
/// only the whole field value is trimmed.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryMode {
    ObjectId(String),
    ConeSearch {
        ra: String,
        dec: String,
        radius: String,
    },
    DateSearch {
        startdate: String,
        window: String,
    },
    ClassSearch {
        class: String,
        n: String,
    },
    ClassSearchDate {
        class: String,
        days_in_past: f64,
    },
    Sso(String),
}

/// Endpoint path + JSON body for one POST.
#[derive(Debug, Clone, PartialEq)]
pub struct FinkRequest {
    pub endpoint: &'static str,
    pub body: Value,
}

impl QueryMode {
    /// Pick the single filled search field and parse it.
    pub fn from_parameters(params: &QueryParameters) -> Result<Self> {
        let filled: Vec<(SearchKind, &'static str, &str)> = SEARCH_FIELDS
            .iter()
            .filter_map(|f| {
                let v = params.get(f.name).map(|s| s.trim()).unwrap_or_default();
                (!v.is_empty()).then_some((f.kind, f.name, v))
            })
            .collect();

        match filled.as_slice() {
            [] => Err(FinkError::NoQuerySelected),
            [(kind, _, value)] => Self::parse(*kind, value),
            many => Err(FinkError::MultipleQuerySelected(
                many.iter().map(|(_, n, _)| *n).collect(),
            )),
        }
    }

    fn parse(kind: SearchKind, value: &str) -> Result<Self> {
        match kind {
            SearchKind::ObjectId => Ok(QueryMode::ObjectId(value.to_string())),
            SearchKind::ConeSearch => match split_exact::<3>(value) {
                Some([ra, dec, radius]) => Ok(QueryMode::ConeSearch { ra, dec, radius }),
                None => Err(FinkError::MalformedConeSearch(value.to_string())),
            },
            SearchKind::DateSearch => match split_exact::<2>(value) {
                Some([startdate, window]) => Ok(QueryMode::DateSearch { startdate, window }),
                None => Err(FinkError::MalformedDateSearch(value.to_string())),
            },
            SearchKind::ClassSearch => match split_exact::<2>(value) {
                Some([class, n]) => Ok(QueryMode::ClassSearch { class, n }),
                None => Err(FinkError::MalformedClassSearch(value.to_string())),
            },
            SearchKind::ClassSearchDate => {
                let [class, days] = split_exact::<2>(value)
                    .ok_or_else(|| FinkError::MalformedClassSearch(value.to_string()))?;
                let days_in_past = days
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|d| d.is_finite() && *d > 0.0)
                    .ok_or(FinkError::InvalidDayCount(days))?;
                Ok(QueryMode::ClassSearchDate {
                    class,
                    days_in_past,
                })
            }
            SearchKind::Sso => Ok(QueryMode::Sso(value.to_string())),
        }
    }

    /// Field name this mode was parsed from.
    pub fn field(&self) -> &'static str {
        match self {
            QueryMode::ObjectId(_) => OBJECT_ID,
            QueryMode::ConeSearch { .. } => CONE_SEARCH,
            QueryMode::DateSearch { .. } => DATE_SEARCH,
            QueryMode::ClassSearch { .. } => CLASS_SEARCH,
            QueryMode::ClassSearchDate { .. } => CLASS_SEARCH_DATE,
            QueryMode::Sso(_) => SSO_SEARCH,
        }
    }

    /// Build the POST for this search. `now` anchors date-window searches.
    ///
    /// Fails with `InvalidDayCount` when the date window leaves the
    /// representable calendar range.
    pub fn to_request(&self, columns: &str, now: DateTime<Utc>) -> Result<FinkRequest> {
        let req = match self {
            QueryMode::ObjectId(id) => FinkRequest {
                endpoint: OBJECTS_ENDPOINT,
                body: json!({ "objectId": id, "columns": columns }),
            },
            QueryMode::ConeSearch { ra, dec, radius } => FinkRequest {
                endpoint: EXPLORER_ENDPOINT,
                body: json!({ "ra": ra, "dec": dec, "radius": radius }),
            },
            QueryMode::DateSearch { startdate, window } => FinkRequest {
                endpoint: EXPLORER_ENDPOINT,
                body: json!({ "startdate": startdate, "window": window }),
            },
            QueryMode::ClassSearch { class, n } => FinkRequest {
                endpoint: LATESTS_ENDPOINT,
                body: json!({ "class": class, "n": n }),
            },
            QueryMode::ClassSearchDate {
                class,
                days_in_past,
            } => {
                let (startdate, stopdate) = window_ending_at(now, *days_in_past)
                    .ok_or_else(|| FinkError::InvalidDayCount(days_in_past.to_string()))?;
                FinkRequest {
                    endpoint: LATESTS_ENDPOINT,
                    body: json!({
                        "class": class,
                        "n": CLASS_DATE_LIMIT,
                        "startdate": startdate,
                        "stopdate": stopdate,
                    }),
                }
            }
            QueryMode::Sso(n_or_d) => FinkRequest {
                endpoint: SSO_ENDPOINT,
                body: json!({ "n_or_d": n_or_d, "columns": columns }),
            },
        };
        Ok(req)
    }
}

/// Split on commas into exactly `N` untrimmed parts.
fn split_exact<const N: usize>(value: &str) -> Option<[String; N]> {
    let parts: Vec<String> = value.split(',').map(str::to_string).collect();
    parts.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const COLUMNS: &str = "i:candid,d:rfscore,i:ra,i:dec,i:jd,i:magpsf,i:objectId,d:cdsxmatch";

    fn params(pairs: &[(&str, &str)]) -> QueryParameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 11, 8, 30, 0).unwrap()
    }

    #[test]
    fn object_id_is_trimmed_and_hits_objects() {
        let q = QueryMode::from_parameters(&params(&[
            ("query_name", "toto"),
            ("broker", "Fink"),
            ("objectId", "  ZTF19acnjwgm "),
        ]))
        .unwrap();
        assert_eq!(q, QueryMode::ObjectId("ZTF19acnjwgm".into()));

        let req = q.to_request(COLUMNS, fixed_now()).unwrap();
        assert_eq!(req.endpoint, "/api/v1/objects");
        assert_eq!(
            req.body,
            json!({ "objectId": "ZTF19acnjwgm", "columns": COLUMNS })
        );
    }

    #[test]
    fn cone_search_keeps_raw_parts() {
        let q = QueryMode::from_parameters(&params(&[("conesearch", "271.39, 45.25, 5")])).unwrap();
        let req = q.to_request(COLUMNS, fixed_now()).unwrap();
        assert_eq!(req.endpoint, "/api/v1/explorer");
        assert_eq!(
            req.body,
            json!({ "ra": "271.39", "dec": " 45.25", "radius": " 5" })
        );
    }

    #[test]
    fn cone_search_needs_three_parts() {
        for bad in ["271.39, 45.25", "1,2,3,4", "271.39"] {
            let err = QueryMode::from_parameters(&params(&[("conesearch", bad)])).unwrap_err();
            assert!(
                matches!(err, FinkError::MalformedConeSearch(_)),
                "{bad:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn date_and_class_search_part_counts() {
        let q = QueryMode::from_parameters(&params(&[("datesearch", "2021-06-01 05:59:37.000, 2")]))
            .unwrap();
        let req = q.to_request(COLUMNS, fixed_now()).unwrap();
        assert_eq!(req.endpoint, "/api/v1/explorer");
        assert_eq!(
            req.body,
            json!({ "startdate": "2021-06-01 05:59:37.000", "window": " 2" })
        );

        let err = QueryMode::from_parameters(&params(&[("datesearch", "59000.5")])).unwrap_err();
        assert!(matches!(err, FinkError::MalformedDateSearch(_)));

        let q = QueryMode::from_parameters(&params(&[("classsearch", "Early SN candidate, 10")]))
            .unwrap();
        let req = q.to_request(COLUMNS, fixed_now()).unwrap();
        assert_eq!(req.endpoint, "/api/v1/latests");
        assert_eq!(req.body, json!({ "class": "Early SN candidate", "n": " 10" }));

        let err = QueryMode::from_parameters(&params(&[("classsearch", "a,b,c")])).unwrap_err();
        assert!(matches!(err, FinkError::MalformedClassSearch(_)));
    }

    #[test]
    fn class_search_by_date_builds_window() {
        let q = QueryMode::from_parameters(&params(&[(
            "classsearchdate",
            "Early SN candidate, 10",
        )]))
        .unwrap();
        assert_eq!(
            q,
            QueryMode::ClassSearchDate {
                class: "Early SN candidate".into(),
                days_in_past: 10.0
            }
        );
        let req = q.to_request(COLUMNS, fixed_now()).unwrap();
        assert_eq!(req.endpoint, "/api/v1/latests");
        assert_eq!(
            req.body,
            json!({
                "class": "Early SN candidate",
                "n": 1000,
                "startdate": "2021-06-01 08:30:00.000",
                "stopdate": "2021-06-11 08:30:00.000",
            })
        );
    }

    #[test]
    fn class_search_by_date_rejects_non_numeric_days() {
        for bad in [
            "Early SN candidate, ten",
            "Early SN candidate, nan",
            "Early SN candidate, 0",
            "Early SN candidate, -5",
            "x, ",
        ] {
            let err = QueryMode::from_parameters(&params(&[("classsearchdate", bad)])).unwrap_err();
            assert!(matches!(err, FinkError::InvalidDayCount(_)), "{bad:?} -> {err:?}");
        }
        let err =
            QueryMode::from_parameters(&params(&[("classsearchdate", "Early SN candidate")]))
                .unwrap_err();
        assert!(matches!(err, FinkError::MalformedClassSearch(_)));
    }

    #[test]
    fn class_search_by_date_out_of_calendar_range_fails() {
        let q = QueryMode::from_parameters(&params(&[("classsearchdate", "Early SN candidate, 1e12")]))
            .unwrap();
        let err = q.to_request(COLUMNS, fixed_now()).unwrap_err();
        assert!(matches!(err, FinkError::InvalidDayCount(_)), "{err:?}");
    }

    #[test]
    fn every_form_field_parses_to_its_own_mode() {
        let samples = [
            ("objectId", "ZTF19acnjwgm"),
            ("conesearch", "1,2,3"),
            ("datesearch", "2021-06-01, 2"),
            ("classsearch", "Early SN candidate, 10"),
            ("classsearchdate", "Early SN candidate, 10"),
            ("ssosearch", "8467"),
        ];
        for f in SEARCH_FIELDS.iter() {
            let (_, value) = samples.iter().find(|(n, _)| *n == f.name).unwrap();
            let q = QueryMode::from_parameters(&params(&[(f.name, value)])).unwrap();
            assert_eq!(q.field(), f.name);
        }
    }

    #[test]
    fn sso_search_sends_columns() {
        let q = QueryMode::from_parameters(&params(&[("ssosearch", " 8467 ")])).unwrap();
        let req = q.to_request(COLUMNS, fixed_now()).unwrap();
        assert_eq!(req.endpoint, "/api/v1/sso");
        assert_eq!(req.body, json!({ "n_or_d": "8467", "columns": COLUMNS }));
    }

    #[test]
    fn exclusivity_is_enforced() {
        let err = QueryMode::from_parameters(&params(&[("objectId", "   "), ("broker", "Fink")]))
            .unwrap_err();
        assert!(matches!(err, FinkError::NoQuerySelected));

        let err = QueryMode::from_parameters(&params(&[
            ("objectId", "ZTF19acnjwgm"),
            ("ssosearch", "8467"),
        ]))
        .unwrap_err();
        match err {
            FinkError::MultipleQuerySelected(fields) => {
                assert_eq!(fields, vec!["objectId", "ssosearch"])
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
