use reqwest::Url;

use crate::{params::Query, ApiError, Result};

/// Resolves an endpoint and query parameters into a fully qualified URL.
///
/// Absolute endpoints (scheme present) are used as-is; relative endpoints
/// resolve against the base URL, normalizing duplicate or missing path
/// separators. Parameters whose value renders to nothing (absent or empty)
/// are omitted rather than serialized as empty.
pub fn build_url(base: &str, endpoint: &str, query: &Query) -> Result<String> {
    let target = if is_absolute(endpoint) {
        endpoint.to_owned()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    };

    let mut url =
        Url::parse(&target).map_err(|err| ApiError::Url(format!("{target}: {err}")))?;

    let pairs: Vec<(&str, String)> = query.pairs().collect();
    if !pairs.is_empty() {
        let mut serializer = url.query_pairs_mut();
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
    }

    Ok(String::from(url))
}

fn is_absolute(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::build_url;
    use crate::Query;

    const BASE: &str = "https://api.safar.example/v1";

    #[test]
    fn renders_scalar_parameters() {
        let url = build_url(BASE, "trips", &Query::new().set("page", 1).set("size", 10))
            .expect("must build");
        assert!(url.contains("page=1"));
        assert!(url.contains("size=10"));
    }

    #[test]
    fn omits_absent_parameters_entirely() {
        let url = build_url(
            BASE,
            "trips",
            &Query::new().set("page", 1).set("name", None::<String>),
        )
        .expect("must build");
        assert!(url.contains("page=1"));
        assert!(!url.contains("name"));
    }

    #[test]
    fn omits_empty_parameters_entirely() {
        let url = build_url(BASE, "trips", &Query::new().set("status", "")).expect("must build");
        assert!(!url.contains('?'));
    }

    #[test]
    fn normalizes_path_separators() {
        let expected = "https://api.safar.example/v1/trips";
        assert_eq!(
            build_url("https://api.safar.example/v1/", "/trips", &Query::new()).expect("must build"),
            expected
        );
        assert_eq!(
            build_url("https://api.safar.example/v1", "trips", &Query::new()).expect("must build"),
            expected
        );
    }

    #[test]
    fn absolute_endpoints_bypass_the_base() {
        let url = build_url(BASE, "https://cdn.safar.example/exports/trips.csv", &Query::new())
            .expect("must build");
        assert_eq!(url, "https://cdn.safar.example/exports/trips.csv");
    }

    #[test]
    fn percent_encodes_parameter_values() {
        let url = build_url(BASE, "trips", &Query::new().set("name", "Umrah Deluxe"))
            .expect("must build");
        assert!(url.contains("name=Umrah+Deluxe") || url.contains("name=Umrah%20Deluxe"));
    }

    #[test]
    fn rejects_unparseable_targets() {
        let err = build_url("not a url", "trips", &Query::new()).expect_err("must fail");
        assert!(matches!(err, crate::ApiError::Url(_)));
    }
}
