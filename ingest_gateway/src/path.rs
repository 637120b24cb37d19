//! Decoding of raw request paths into positional segments.

/// An ordered sequence of non-empty path segments decoded from a raw
/// request path.
///
/// Splitting collapses leading, trailing and repeated `/` uniformly, so
/// `/submit/ns1`, `submit/ns1/` and `//submit//ns1` all decode to the same
/// segments. Segment order is positionally meaningful: index 0 is the
/// endpoint name, index 1 the namespace, index 2 (if present) the
/// identifier.
///
/// Decoding is pure and deterministic - a path with too few segments is a
/// validation concern, not a decode error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegments(Vec<String>);

impl PathSegments {
    /// Decode `raw` (a URI path, without any query component) into its
    /// non-empty `/`-separated segments.
    pub fn decode(raw: &str) -> Self {
        Self(
            raw.split('/')
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }

    /// Return the segment at `index`, or `None` when the path is too short.
    pub fn segment_at(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// The endpoint segment, selecting which logical data stream a
    /// submission belongs to.
    pub fn endpoint(&self) -> Option<&str> {
        self.segment_at(0)
    }

    /// The namespace segment, the tenant key used for backpressure
    /// accounting.
    pub fn namespace(&self) -> Option<&str> {
        self.segment_at(1)
    }

    /// The optional identifier segment.
    pub fn id(&self) -> Option<&str> {
        self.segment_at(2)
    }

    /// The number of decoded segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the path decoded to no segments at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
