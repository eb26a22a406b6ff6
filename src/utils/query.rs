use url::Url;

/// Sets `key=value` in the query string of `url`, keeping every other
/// parameter and its position. The first existing occurrence of `key` is
/// overwritten in place and later duplicates are dropped.
pub fn upsert_query_param(url: &mut Url, key: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (k, v) in url.query_pairs() {
        if k == key {
            if !replaced {
                pairs.push((k.into_owned(), value.to_string()));
                replaced = true;
            }
            continue;
        }
        pairs.push((k.into_owned(), v.into_owned()));
    }
    if !replaced {
        pairs.push((key.to_string(), value.to_string()));
    }
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parsed_query(url: &Url) -> HashMap<String, String> {
        serde_urlencoded::from_str(url.query().unwrap_or("")).expect("query parses")
    }

    #[test]
    fn appends_to_existing_query() {
        let mut url = Url::parse("https://x.test/a?x=1").unwrap();
        upsert_query_param(&mut url, "k", "v");
        let query = parsed_query(&url);
        assert_eq!(query.get("x").map(String::as_str), Some("1"));
        assert_eq!(query.get("k").map(String::as_str), Some("v"));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn overwrites_existing_parameter() {
        let mut url = Url::parse("https://x.test/a?k=old&y=2&k=dup").unwrap();
        upsert_query_param(&mut url, "k", "new");
        assert_eq!(url.query(), Some("k=new&y=2"));
    }

    #[test]
    fn creates_query_when_absent_and_encodes() {
        let mut url = Url::parse("https://x.test/a").unwrap();
        upsert_query_param(&mut url, "api key", "a&b");
        assert_eq!(url.query(), Some("api+key=a%26b"));
        let query = parsed_query(&url);
        assert_eq!(query.get("api key").map(String::as_str), Some("a&b"));
    }
}
