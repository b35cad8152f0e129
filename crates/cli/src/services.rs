use factory_finder_api::{LoaderContext, SERVICES_PREFIX};
use factory_finder_core::classpath::classpath_roots;
use factory_finder_core::discovery::ServiceDescriptorDiscovery;
use factory_finder_core::{FactoryFinderCache, FinderConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};

#[derive(Tabled, Debug, PartialEq, Eq)]
pub(crate) struct ServiceRow {
    #[tabled(rename = "Factory")]
    factory_id: String,
    #[tabled(rename = "Implementation")]
    implementation: String,
}

/// Every descriptor on `classpath` (or the configured system classpath) with its first implementation.
pub(crate) fn scan(
    config: &FinderConfig,
    classpath: Vec<PathBuf>,
) -> Result<Vec<ServiceRow>, Box<dyn std::error::Error>> {
    let classpath = if classpath.is_empty() {
        config.system_classpath.clone()
    } else {
        classpath
    };

    let loader = LoaderContext::new("scan", classpath_roots(&classpath));
    let cache = FactoryFinderCache::new(Arc::new(ServiceDescriptorDiscovery::default()));

    let mut rows = Vec::new();
    for resource in loader.list_resources(SERVICES_PREFIX)? {
        let factory_id = &resource[SERVICES_PREFIX.len()..];
        if factory_id.is_empty() || factory_id.contains('/') {
            continue;
        }
        let implementation = cache
            .resolve(factory_id, Some(&loader))
            .unwrap_or_else(|| "<none>".to_string());
        rows.push(ServiceRow {
            factory_id: factory_id.to_string(),
            implementation,
        });
    }
    Ok(rows)
}

pub fn run(config: &FinderConfig, classpath: Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let rows = scan(config, classpath)?;

    if rows.is_empty() {
        println!("No service descriptors found.");
        return Ok(());
    }

    println!("{}", Table::new(rows));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scan_lists_descriptors() {
        let dir = tempdir().unwrap();
        let services = dir.path().join("META-INF/services");
        std::fs::create_dir_all(&services).unwrap();
        std::fs::write(services.join("a.Factory"), "impl.A\n").unwrap();
        std::fs::write(services.join("b.Factory"), "# empty\n").unwrap();

        let rows = scan(&FinderConfig::default(), vec![dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            rows,
            vec![
                ServiceRow {
                    factory_id: "a.Factory".to_string(),
                    implementation: "impl.A".to_string(),
                },
                ServiceRow {
                    factory_id: "b.Factory".to_string(),
                    implementation: "<none>".to_string(),
                },
            ]
        );
    }
}
