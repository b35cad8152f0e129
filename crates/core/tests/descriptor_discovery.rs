//! Service descriptor discovery over real directories and JARs

use factory_finder_api::{Discovery, DiscoveryStrategy, LoaderContext};
use factory_finder_core::classpath::classpath_roots;
use factory_finder_core::discovery::{
    DiscoveryChain, ProviderEnumerationDiscovery, ServiceDescriptorDiscovery,
};
use factory_finder_core::{FactoryFinderCache, FinderConfig, StrategyKind};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const EXPRESSION_FACTORY: &str = "jakarta.el.ExpressionFactory";

fn write_descriptor(root: &Path, factory_id: &str, content: &str) {
    let services = root.join("META-INF/services");
    std::fs::create_dir_all(&services).unwrap();
    std::fs::write(services.join(factory_id), content).unwrap();
}

fn create_jar(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
}

fn loader_for(name: &str, paths: &[PathBuf]) -> LoaderContext {
    LoaderContext::new(name, classpath_roots(paths))
}

#[test]
fn test_descriptor_in_directory() {
    let temp = TempDir::new().unwrap();
    write_descriptor(
        temp.path(),
        EXPRESSION_FACTORY,
        "# Copyright header\n\n  org.example.el.ExpressionFactoryImpl # default\n",
    );

    let loader = loader_for("app", &[temp.path().to_path_buf()]);
    let discovery = ServiceDescriptorDiscovery::default();

    assert_eq!(
        discovery.discover(EXPRESSION_FACTORY, Some(&loader)).unwrap(),
        Discovery::Found("org.example.el.ExpressionFactoryImpl".to_string())
    );
}

#[test]
fn test_descriptor_in_jar() {
    let temp = TempDir::new().unwrap();
    let jar = temp.path().join("el-impl.jar");
    create_jar(
        &jar,
        &[(
            "META-INF/services/jakarta.el.ExpressionFactory",
            "\t# provided by el-impl\ncom.example.JarExpressionFactory\n",
        )],
    );

    let loader = loader_for("app", &[jar]);
    let discovery = ServiceDescriptorDiscovery::default();

    assert_eq!(
        discovery.discover(EXPRESSION_FACTORY, Some(&loader)).unwrap(),
        Discovery::Found("com.example.JarExpressionFactory".to_string())
    );
    assert_eq!(
        discovery.discover("com.example.Unknown", Some(&loader)).unwrap(),
        Discovery::NotFound
    );
}

#[test]
fn test_first_root_wins_and_parent_is_asked_first() {
    let temp = TempDir::new().unwrap();
    let shared = temp.path().join("shared");
    let first = temp.path().join("first");
    let second = temp.path().join("second");
    write_descriptor(&shared, EXPRESSION_FACTORY, "shared.Impl\n");
    write_descriptor(&first, EXPRESSION_FACTORY, "first.Impl\n");
    write_descriptor(&second, EXPRESSION_FACTORY, "second.Impl\n");

    let discovery = ServiceDescriptorDiscovery::default();

    let standalone = loader_for("standalone", &[first.clone(), second]);
    assert_eq!(
        discovery.discover(EXPRESSION_FACTORY, Some(&standalone)).unwrap(),
        Discovery::Found("first.Impl".to_string())
    );

    let parent = loader_for("container", &[shared]);
    let child = LoaderContext::builder("deployment")
        .parent(&parent)
        .roots(classpath_roots(&[first]))
        .build();
    assert_eq!(
        discovery.discover(EXPRESSION_FACTORY, Some(&child)).unwrap(),
        Discovery::Found("shared.Impl".to_string())
    );
}

#[test]
fn test_comment_only_descriptor_is_not_found() {
    let temp = TempDir::new().unwrap();
    write_descriptor(temp.path(), EXPRESSION_FACTORY, "# nothing here\n   \n\t# still nothing\n");

    let loader = loader_for("app", &[temp.path().to_path_buf()]);
    let discovery = ServiceDescriptorDiscovery::default();

    assert_eq!(
        discovery.discover(EXPRESSION_FACTORY, Some(&loader)).unwrap(),
        Discovery::NotFound
    );
}

#[test]
fn test_broken_jar_resolves_to_cached_absence() {
    let temp = TempDir::new().unwrap();
    let jar = temp.path().join("broken.jar");
    std::fs::write(&jar, b"PK\x03\x04 truncated").unwrap();

    let loader = loader_for("app", &[jar]);
    let discovery = Arc::new(ServiceDescriptorDiscovery::default());
    assert!(discovery.discover(EXPRESSION_FACTORY, Some(&loader)).is_err());

    let cache = FactoryFinderCache::new(discovery);
    assert_eq!(cache.resolve(EXPRESSION_FACTORY, Some(&loader)), None);
    assert!(cache.lookup(EXPRESSION_FACTORY, Some(&loader)).unwrap().is_negative());
    assert_eq!(cache.stats().discoveries_failed, 1);
}

#[test]
fn test_cache_picks_up_new_descriptor_only_after_teardown() {
    let temp = TempDir::new().unwrap();
    let loader = loader_for("app", &[temp.path().to_path_buf()]);
    let cache = FactoryFinderCache::new(Arc::new(ServiceDescriptorDiscovery::default()));

    assert_eq!(cache.resolve(EXPRESSION_FACTORY, Some(&loader)), None);

    write_descriptor(temp.path(), EXPRESSION_FACTORY, "late.Impl\n");
    assert_eq!(cache.resolve(EXPRESSION_FACTORY, Some(&loader)), None);

    cache.teardown(Some(&loader));
    assert_eq!(
        cache.resolve(EXPRESSION_FACTORY, Some(&loader)).as_deref(),
        Some("late.Impl")
    );
}

#[test]
fn test_chain_prefers_descriptor_over_provider() {
    let temp = TempDir::new().unwrap();
    write_descriptor(temp.path(), EXPRESSION_FACTORY, "descriptor.Impl\n");

    let with_descriptor = loader_for("with-descriptor", &[temp.path().to_path_buf()]);
    with_descriptor
        .register_provider(EXPRESSION_FACTORY, "provider.Impl")
        .unwrap();
    let providers_only = loader_for("providers-only", &[]);
    providers_only
        .register_provider(EXPRESSION_FACTORY, "provider.Impl")
        .unwrap();

    let chain = DiscoveryChain::new(vec![
        Arc::new(ServiceDescriptorDiscovery::default()),
        Arc::new(ProviderEnumerationDiscovery::new()),
    ]);
    let cache = FactoryFinderCache::new(Arc::new(chain));

    assert_eq!(
        cache.resolve(EXPRESSION_FACTORY, Some(&with_descriptor)).as_deref(),
        Some("descriptor.Impl")
    );
    assert_eq!(
        cache.resolve(EXPRESSION_FACTORY, Some(&providers_only)).as_deref(),
        Some("provider.Impl")
    );
}

#[test]
fn test_config_system_classpath_serves_system_loader() {
    let temp = TempDir::new().unwrap();
    let jar = temp.path().join("system.jar");
    create_jar(
        &jar,
        &[("META-INF/services/jakarta.el.ExpressionFactory", "system.Impl\n")],
    );

    let config = FinderConfig {
        strategy: StrategyKind::Descriptor,
        system_classpath: vec![jar],
        ..Default::default()
    };
    let cache = FactoryFinderCache::new(config.build_strategy());

    assert_eq!(
        cache.resolve(EXPRESSION_FACTORY, None).as_deref(),
        Some("system.Impl")
    );
}

#[test]
fn test_latin1_license_header_does_not_hide_implementation() {
    let temp = TempDir::new().unwrap();
    let services = temp.path().join("META-INF/services");
    std::fs::create_dir_all(&services).unwrap();
    std::fs::write(
        services.join(EXPRESSION_FACTORY),
        b"# Copyright \xA9 2020 Oracle\r\norg.example.el.ExpressionFactoryImpl\r\n",
    )
    .unwrap();

    let loader = loader_for("app", &[temp.path().to_path_buf()]);
    let cache = FactoryFinderCache::new(Arc::new(ServiceDescriptorDiscovery::default()));

    assert_eq!(
        cache.resolve(EXPRESSION_FACTORY, Some(&loader)).as_deref(),
        Some("org.example.el.ExpressionFactoryImpl")
    );
    assert_eq!(cache.stats().discoveries_failed, 0);
}

#[test]
fn test_config_system_providers_serve_system_loader() {
    let config = FinderConfig {
        strategy: StrategyKind::Provider,
        system_providers: BTreeMap::from([(
            EXPRESSION_FACTORY.to_string(),
            vec!["system.ProviderImpl".to_string()],
        )]),
        ..Default::default()
    };
    let cache = FactoryFinderCache::new(config.build_strategy());

    assert_eq!(
        cache.resolve(EXPRESSION_FACTORY, None).as_deref(),
        Some("system.ProviderImpl")
    );
}
