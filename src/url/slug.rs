use url::Url;

/// Derives the directory slug for a fetched resource
///
/// The slug is the final URL's path relative to `section_base`, with
/// surrounding slashes and a trailing `.html` removed and percent-escapes
/// decoded. Anything that would not make a single safe directory name falls
/// back to the numeric ID.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use lightsns_mirror::url::slug_for;
///
/// let base = Url::parse("https://forum.example.com/").unwrap();
/// let post = Url::parse("https://forum.example.com/42.html").unwrap();
/// assert_eq!(slug_for(&post, &base, 42), "42");
///
/// let authors = Url::parse("https://forum.example.com/author/").unwrap();
/// let author = Url::parse("https://forum.example.com/author/doctor/").unwrap();
/// assert_eq!(slug_for(&author, &authors, 7), "doctor");
/// ```
pub fn slug_for(final_url: &Url, section_base: &Url, id: u64) -> String {
    let fallback = || id.to_string();

    let Some(relative) = final_url.as_str().strip_prefix(section_base.as_str()) else {
        return fallback();
    };

    // Drop query and fragment
    let relative = relative
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_matches('/');
    let relative = relative.strip_suffix(".html").unwrap_or(relative);

    let decoded = match urlencoding::decode(relative) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => relative.to_string(),
    };

    if decoded.is_empty()
        || decoded == "."
        || decoded == ".."
        || decoded.contains(['/', '\\', '\0'])
    {
        return fallback();
    }

    decoded
}
