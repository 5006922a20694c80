use crate::error::StoreError;
use crate::store::StateStore;

/// How a freshly extracted fragment relates to the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Nothing stored yet: store as baseline, do not notify.
    FirstObservation,
    Unchanged,
    /// Store `new`, then notify.
    Changed { old: String, new: String },
}

impl Detection {
    pub fn label(&self) -> &'static str {
        match self {
            Detection::FirstObservation => "first_observation",
            Detection::Unchanged => "unchanged",
            Detection::Changed { .. } => "changed",
        }
    }
}

/// Exact string comparison. An empty stored value counts as "never observed".
pub fn classify(prior: Option<&str>, fragment: &str) -> Detection {
    match prior.filter(|p| !p.is_empty()) {
        None => Detection::FirstObservation,
        Some(old) if old == fragment => Detection::Unchanged,
        Some(old) => Detection::Changed {
            old: old.to_string(),
            new: fragment.to_string(),
        },
    }
}

/// Read the stored value for `key` and classify `fragment` against it.
/// Never writes.
pub async fn detect(
    store: &dyn StateStore,
    key: &str,
    fragment: &str,
) -> Result<Detection, StoreError> {
    let prior = store.get(key).await?;
    Ok(classify(prior.as_deref(), fragment))
}
