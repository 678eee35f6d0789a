//! URL location parsing: query string and fragment

use std::fmt;

/// decoded `application/x-www-form-urlencoded` query string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    /// parse a query string, with or without the leading '?'
    ///
    /// segments without '=' are parameters with an empty value; empty
    /// segments are skipped.
    pub fn parse(input: &str) -> Self {
        let input = input.strip_prefix('?').unwrap_or(input);
        let pairs = input
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.split_once('=') {
                Some((name, value)) => (decode(name), decode(value)),
                None => (decode(segment), String::new()),
            })
            .collect();
        Self { pairs }
    }

    /// check if a parameter with this name exists
    pub fn has(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    /// check if any parameter with this name has exactly this value
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.pairs.iter().any(|(n, v)| n == name && v == value)
    }

    /// first value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// all values of a parameter, in order
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        // invalid utf-8 after decoding, keep what we can
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned(),
    }
}

/// the parts of a URL that conditions look at
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// everything before '?' or '#'
    pub path: String,
    /// query string without the leading '?'
    pub search: String,
    /// fragment without the leading '#'
    pub hash: String,
}

impl Location {
    /// split an absolute or relative URL into path, query and fragment
    ///
    /// accepts "https://host/p?a=1#x", "/p?a=1", "?a=1#x" and "#x".
    pub fn parse(url: &str) -> Self {
        let (before_hash, hash) = match url.split_once('#') {
            Some((before, hash)) => (before, hash),
            None => (url, ""),
        };
        let (path, search) = match before_hash.split_once('?') {
            Some((path, search)) => (path, search),
            None => (before_hash, ""),
        };
        Self {
            path: path.to_string(),
            search: search.to_string(),
            hash: hash.to_string(),
        }
    }

    pub fn query(&self) -> QueryString {
        QueryString::parse(&self.search)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if !self.search.is_empty() {
            write!(f, "?{}", self.search)?;
        }
        if !self.hash.is_empty() {
            write!(f, "#{}", self.hash)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parse_basic() {
        let q = QueryString::parse("?mode=dark&x=1");
        assert_eq!(q.len(), 2);
        assert!(q.has("mode"));
        assert!(q.has_value("mode", "dark"));
        assert!(!q.has_value("mode", "light"));
        assert_eq!(q.get("x"), Some("1"));
    }

    #[test]
    fn test_query_parse_without_question_mark() {
        let q = QueryString::parse("a=1");
        assert_eq!(q.get("a"), Some("1"));
    }

    #[test]
    fn test_query_key_only_and_empty_segments() {
        let q = QueryString::parse("?debug&&beta=");
        assert_eq!(q.len(), 2);
        assert!(q.has("debug"));
        assert!(q.has_value("debug", ""));
        assert!(q.has_value("beta", ""));
    }

    #[test]
    fn test_query_decoding() {
        let q = QueryString::parse("?q=hello+world&name=J%C3%BCrgen&a%20b=c");
        assert_eq!(q.get("q"), Some("hello world"));
        assert_eq!(q.get("name"), Some("Jürgen"));
        assert!(q.has("a b"));
    }

    #[test]
    fn test_query_repeated_parameter() {
        let q = QueryString::parse("?tag=a&tag=b");
        assert_eq!(q.get("tag"), Some("a"));
        assert_eq!(q.get_all("tag"), vec!["a", "b"]);
        assert!(q.has_value("tag", "b"));
    }

    #[test]
    fn test_query_value_with_equals() {
        let q = QueryString::parse("?expr=a=b");
        assert_eq!(q.get("expr"), Some("a=b"));
    }

    #[test]
    fn test_query_invalid_utf8_is_lossy() {
        let q = QueryString::parse("?bad=%FF");
        assert!(q.has("bad"));
    }

    #[test]
    fn test_location_parse() {
        let loc = Location::parse("https://example.com/docs?mode=dark#section2");
        assert_eq!(loc.path, "https://example.com/docs");
        assert_eq!(loc.search, "mode=dark");
        assert_eq!(loc.hash, "section2");
        assert!(loc.query().has_value("mode", "dark"));

        let loc = Location::parse("#only");
        assert_eq!(loc.search, "");
        assert_eq!(loc.hash, "only");

        let loc = Location::parse("/p?a=1");
        assert_eq!(loc.hash, "");
        assert_eq!(loc.search, "a=1");
    }

    #[test]
    fn test_location_display() {
        let loc = Location::parse("/p?a=1#x");
        assert_eq!(loc.to_string(), "/p?a=1#x");
        assert_eq!(Location::parse("/p").to_string(), "/p");
    }
}
