use url::{Origin, Url};

/// Extract the origin (`scheme://host[:port]`) a URL belongs to.
///
/// Default ports are omitted, matching the ASCII origin serialization, so
/// `http://example.com:80/a` and `http://example.com/b` share one origin.
/// Returns `None` for unparseable URLs and for schemes without a host.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    match parsed.origin() {
        origin @ Origin::Tuple(..) => Some(origin.ascii_serialization()),
        Origin::Opaque(_) => None,
    }
}
