/// Joins a list of already-normalized keywords with a space, which the query encoder sends as
/// the `+` separator tag APIs expect. Empty entries are dropped so a missing keyword never
/// leaves a dangling separator.
#[macro_export]
macro_rules! join_tags {
    ($x:expr) => {{
        let tl = $x
            .iter()
            .map(|t| AsRef::<str>::as_ref(t))
            .filter(|t| !t.is_empty())
            .collect::<Vec<&str>>()
            .join(" ");
        tl
    }};
}

/// Replaces every run of whitespace inside a keyword with `_`, the way booru tags are written.
#[macro_export]
macro_rules! underscore_tag {
    ($x:expr) => {{
        $x.split_whitespace().collect::<Vec<&str>>().join("_")
    }};
}
