use std::borrow::Cow;

/// A label value known to be safe to export (bounded cardinality).
#[derive(Clone, Debug)]
pub struct BoundedLabel(Cow<'static, str>);

impl BoundedLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug)]
pub struct LabelPolicy {
    /// Maximum distinct peer buckets exported. A hub can see many remote
    /// peer callsigns over its lifetime; without a bound, per-peer labels
    /// would make the exported series count unbounded.
    pub max_peer_buckets: usize,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self { max_peer_buckets: 64 }
    }
}

impl LabelPolicy {
    /// Bucket a peer (hashed from its connection id) into a bounded label.
    pub fn peer_bucket(&self, peer_id_hash: u32) -> BoundedLabel {
        let bucket = (peer_id_hash as usize) % self.max_peer_buckets.max(1);
        BoundedLabel(Cow::Owned(format!("peer{:02}", bucket)))
    }

    pub fn reason(reason: &'static str) -> BoundedLabel {
        BoundedLabel(Cow::Borrowed(reason))
    }
}
