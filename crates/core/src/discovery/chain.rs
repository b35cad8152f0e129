use factory_finder_api::{Discovery, DiscoveryError, DiscoveryStrategy, LoaderContext};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered strategies; the first one that finds an implementation wins.
///
/// A failing link does not stop the chain. When nothing is found, the last
/// failure (if any) is reported so the caller can log it.
pub struct DiscoveryChain {
    links: Vec<Arc<dyn DiscoveryStrategy>>,
}

impl DiscoveryChain {
    pub fn new(links: Vec<Arc<dyn DiscoveryStrategy>>) -> Self {
        Self { links }
    }

    pub fn then(mut self, link: Arc<dyn DiscoveryStrategy>) -> Self {
        self.links.push(link);
        self
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl DiscoveryStrategy for DiscoveryChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn discover(
        &self,
        factory_id: &str,
        loader: Option<&LoaderContext>,
    ) -> Result<Discovery, DiscoveryError> {
        let mut last_error = None;

        for link in &self.links {
            match link.discover(factory_id, loader) {
                Ok(found) if found.is_found() => return Ok(found),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        "Discovery link {} failed for {}: {}",
                        link.name(),
                        factory_id,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Discovery::NotFound),
        }
    }
}

/// Fixed fallback implementations per factory id, independent of the loader.
#[derive(Debug, Clone, Default)]
pub struct FixedDiscovery {
    defaults: BTreeMap<String, String>,
}

impl FixedDiscovery {
    pub fn new(defaults: BTreeMap<String, String>) -> Self {
        Self { defaults }
    }
}

impl DiscoveryStrategy for FixedDiscovery {
    fn name(&self) -> &str {
        "fixed"
    }

    fn discover(
        &self,
        factory_id: &str,
        _loader: Option<&LoaderContext>,
    ) -> Result<Discovery, DiscoveryError> {
        Ok(Discovery::from(self.defaults.get(factory_id).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factory_finder_api::FnDiscovery;

    fn fixed(pairs: &[(&str, &str)]) -> Arc<dyn DiscoveryStrategy> {
        Arc::new(FixedDiscovery::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    fn failing() -> Arc<dyn DiscoveryStrategy> {
        Arc::new(FnDiscovery::new("failing", |_, _| {
            Err(DiscoveryError::Other("boom".to_string()))
        }))
    }

    #[test]
    fn test_first_found_wins() {
        let chain = DiscoveryChain::new(vec![fixed(&[]), fixed(&[("svc", "first.Impl")])])
            .then(fixed(&[("svc", "second.Impl")]));

        assert_eq!(chain.len(), 3);
        assert_eq!(
            chain.discover("svc", None).unwrap(),
            Discovery::Found("first.Impl".to_string())
        );
    }

    #[test]
    fn test_failure_does_not_stop_chain() {
        let chain = DiscoveryChain::new(vec![failing(), fixed(&[("svc", "fallback.Impl")])]);
        assert_eq!(
            chain.discover("svc", None).unwrap(),
            Discovery::Found("fallback.Impl".to_string())
        );
    }

    #[test]
    fn test_failure_reported_when_nothing_found() {
        let chain = DiscoveryChain::new(vec![failing(), fixed(&[])]);
        assert!(chain.discover("svc", None).is_err());

        let empty = DiscoveryChain::new(vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.discover("svc", None).unwrap(), Discovery::NotFound);
    }
}
