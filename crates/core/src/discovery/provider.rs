use factory_finder_api::{
    ApiResult, Discovery, DiscoveryError, DiscoveryStrategy, LoaderContext, ProviderTable,
};

/// Check that `name` is a dotted binary type name (`a.b.C`, `a.B$Inner`).
pub fn is_binary_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) if first.is_alphabetic() || first == '_' || first == '$' => chars
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '$'),
                _ => false,
            }
        })
}

/// Takes the first provider registered for the factory id that the loader can see.
///
/// Without a loader, the strategy's own system table is consulted.
#[derive(Debug, Default)]
pub struct ProviderEnumerationDiscovery {
    system: ProviderTable,
}

impl ProviderEnumerationDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider visible to the system context.
    pub fn register_system_provider(&self, service: &str, implementation: &str) -> ApiResult<()> {
        self.system.register(service, implementation)
    }
}

impl DiscoveryStrategy for ProviderEnumerationDiscovery {
    fn name(&self) -> &str {
        "provider-enumeration"
    }

    fn discover(
        &self,
        factory_id: &str,
        loader: Option<&LoaderContext>,
    ) -> Result<Discovery, DiscoveryError> {
        let providers = match loader {
            Some(loader) => loader.providers(factory_id),
            None => self.system.providers(factory_id),
        };

        let Some(first) = providers.into_iter().next() else {
            return Ok(Discovery::NotFound);
        };

        if !is_binary_name(&first) {
            return Err(DiscoveryError::ProviderUnavailable {
                service: factory_id.to_string(),
                reason: format!("illegal provider class name: {}", first),
            });
        }

        Ok(Discovery::Found(first))
    }
}
