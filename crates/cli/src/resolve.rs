use factory_finder_api::{CacheStats, LoaderContext};
use factory_finder_core::classpath::classpath_roots;
use factory_finder_core::{FactoryFinderCache, FinderConfig, StrategyKind};
use std::path::PathBuf;
use tracing::info;

pub struct ResolveArgs {
    pub factory_id: String,
    pub classpath: Vec<PathBuf>,
    pub parent_classpath: Vec<PathBuf>,
    pub providers: Vec<(String, String)>,
    pub strategy: Option<StrategyKind>,
    pub system: bool,
    pub stats: bool,
}

/// Build the deployment loader (and its container parent, if any) for the given classpaths.
fn build_loader(args: &ResolveArgs) -> Result<LoaderContext, Box<dyn std::error::Error>> {
    let mut builder = LoaderContext::builder("deployment").roots(classpath_roots(&args.classpath));

    if !args.parent_classpath.is_empty() {
        let parent = LoaderContext::new("container", classpath_roots(&args.parent_classpath));
        builder = builder.parent(&parent);
    }

    let loader = builder.build();
    for (service, implementation) in &args.providers {
        loader.register_provider(service, implementation)?;
    }
    Ok(loader)
}

pub(crate) fn resolve(
    mut config: FinderConfig,
    args: &ResolveArgs,
) -> Result<(Option<String>, CacheStats), Box<dyn std::error::Error>> {
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    let cache = FactoryFinderCache::new(config.build_strategy());

    let loader = if args.system {
        None
    } else {
        Some(build_loader(args)?)
    };

    info!(
        "Resolving {} with {} strategy",
        args.factory_id,
        cache.strategy().name()
    );
    let implementation = cache.resolve(&args.factory_id, loader.as_ref());

    if let Some(loader) = &loader {
        cache.teardown(Some(loader));
    }
    Ok((implementation, cache.stats()))
}

pub fn run(config: FinderConfig, args: ResolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (implementation, stats) = resolve(config, &args)?;

    match implementation {
        Some(name) => println!("{}", name),
        None => println!("<none>"),
    }

    if args.stats {
        println!("Hits:              {}", stats.hits);
        println!("Misses:            {}", stats.misses);
        println!("Failed discovery:  {}", stats.discoveries_failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(factory_id: &str) -> ResolveArgs {
        ResolveArgs {
            factory_id: factory_id.to_string(),
            classpath: Vec::new(),
            parent_classpath: Vec::new(),
            providers: Vec::new(),
            strategy: None,
            system: false,
            stats: false,
        }
    }

    #[test]
    fn test_resolve_from_directory_classpath() {
        let dir = tempdir().unwrap();
        let services = dir.path().join("META-INF/services");
        std::fs::create_dir_all(&services).unwrap();
        std::fs::write(services.join("svc.Factory"), "# header\ncom.example.Impl\n").unwrap();

        let mut args = args("svc.Factory");
        args.classpath = vec![dir.path().to_path_buf()];

        let (implementation, stats) = resolve(FinderConfig::default(), &args).unwrap();
        assert_eq!(implementation.as_deref(), Some("com.example.Impl"));
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_resolve_registered_provider() {
        let mut args = args("svc.Factory");
        args.strategy = Some(StrategyKind::Provider);
        args.providers = vec![("svc.Factory".to_string(), "com.example.Dynamic".to_string())];

        let (implementation, _) = resolve(FinderConfig::default(), &args).unwrap();
        assert_eq!(implementation.as_deref(), Some("com.example.Dynamic"));
    }

    #[test]
    fn test_resolve_nothing() {
        let (implementation, stats) =
            resolve(FinderConfig::default(), &args("svc.Missing")).unwrap();
        assert_eq!(implementation, None);
        assert_eq!(stats.hits, 0);
    }
}
