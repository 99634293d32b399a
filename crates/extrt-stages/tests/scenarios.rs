//! End-to-end pipeline scenarios (spec §8 "TESTABLE PROPERTIES", concrete
//! scenarios S1-S5; S6 lives in `extrt-jit`'s `round_trip.rs`). Each test
//! drives the real stages through `PipelineExecutor`, the way
//! `apps/extrt-host`'s `Host::bootstrap` wires them, rather than calling a
//! single stage in isolation.

use std::path::PathBuf;
use std::sync::Arc;

use extrt_config::Config;
use extrt_core::{Extension, ExtensionState};
use extrt_manifest::{Dependency, ExtensionType, Manifest};
use extrt_pipeline::{BarrierStage, PipelineContext, PipelineExecutor, StageSpec};
use extrt_platform::PlatformOps;
use extrt_resolver::DependencyResolver;
use extrt_stages::{ExportingStage, LoadingStage, ModuleRegistry, ResolutionStage, StartingStage};
use extrt_types::{RangeSet, UniqueId, Version};

fn manifest(name: &str, extension_type: ExtensionType, language: &str) -> Manifest {
    Manifest {
        name: name.to_string(),
        version: "1.0.0".parse::<Version>().unwrap(),
        language: language.to_string(),
        extension_type,
        description: String::new(),
        author: String::new(),
        website: String::new(),
        license: String::new(),
        platforms: Vec::new(),
        dependencies: Vec::new(),
        conflicts: Vec::new(),
        obsoletes: Vec::new(),
        entry: String::new(),
        methods: Vec::new(),
        runtime: None,
        directories: Vec::new(),
    }
}

fn parsed(m: Manifest) -> Extension {
    let extension_type = m.extension_type;
    let mut ext = Extension::new(
        UniqueId::new(m.name.clone()),
        extension_type,
        PathBuf::from(format!("/ext/{}", m.name)),
    );
    ext.set_manifest(m);
    ext.set_state(ExtensionState::Parsing).unwrap();
    ext.set_state(ExtensionState::Parsed).unwrap();
    ext
}

fn ctx() -> PipelineContext {
    PipelineContext::new(Config::default())
}

// --- S1: a stub language module good enough to load, export, and start. ---
//
// The raw ABI (spec §6.1) is a flat v-table of `extern "C"` function
// pointers; `NativeLanguageModule` calls through it exactly like it would a
// real shared library. Building one statically lets the Loading/Exporting/
// Starting stages run for real instead of through a `LanguageModule` trait
// double, which is the only way to exercise `ExtensionLoader`'s symbol
// resolution end to end.
mod stub_abi {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use extrt_core::{Assembly, MethodTable};
    use extrt_foundation::{ExtError, ExtResult};
    use extrt_loader::raw_abi::{
        GetLanguageModuleFn, RawInitResult, RawLanguageModuleVTable, RawLoadResult,
    };
    use extrt_platform::{LoadFlags, PlatformOps};
    use extrt_types::Address;

    unsafe extern "C" fn initialize(_provider: *const (), _extension: *const ()) -> RawInitResult {
        RawInitResult {
            ok: true,
            table: MethodTable {
                has_update: true,
                has_start: true,
                has_end: true,
                has_export: true,
            },
            error: std::ptr::null(),
        }
    }

    unsafe extern "C" fn shutdown() {}
    unsafe extern "C" fn on_update(_delta_millis: u64) {}

    unsafe extern "C" fn on_plugin_load(_plugin: *const ()) -> RawLoadResult {
        RawLoadResult {
            ok: true,
            user_data: 0,
            table: MethodTable {
                has_update: true,
                has_start: true,
                has_end: true,
                has_export: true,
            },
            methods: std::ptr::null(),
            methods_len: 0,
            error: std::ptr::null(),
        }
    }

    unsafe extern "C" fn on_plugin_start(_plugin: *const ()) {}
    unsafe extern "C" fn on_plugin_update(_plugin: *const (), _delta_millis: u64) {}
    unsafe extern "C" fn on_plugin_end(_plugin: *const ()) {}
    unsafe extern "C" fn on_method_export(_plugin: *const ()) {}
    unsafe extern "C" fn is_debug_build() -> bool {
        false
    }

    static VTABLE: RawLanguageModuleVTable = RawLanguageModuleVTable {
        initialize,
        shutdown,
        on_update,
        on_plugin_load,
        on_plugin_start,
        on_plugin_update,
        on_plugin_end,
        on_method_export,
        is_debug_build,
    };

    unsafe extern "C" fn get_language_module() -> *const RawLanguageModuleVTable {
        &VTABLE
    }

    pub struct StubAssembly {
        path: PathBuf,
    }

    impl Assembly for StubAssembly {
        fn path(&self) -> &Path {
            &self.path
        }

        fn get_symbol(&self, name: &str) -> ExtResult<Address> {
            if name == extrt_loader::ENTRY_POINT_SYMBOL {
                Ok(Address::from_ptr(get_language_module as *const ()))
            } else {
                Err(ExtError::initialization_failed(format!("no such symbol: {name}")))
            }
        }
    }

    pub struct StubPlatformOps;

    impl PlatformOps for StubPlatformOps {
        fn load_library(&self, path: &Path, _flags: LoadFlags) -> ExtResult<Arc<dyn Assembly>> {
            Ok(Arc::new(StubAssembly {
                path: path.to_path_buf(),
            }))
        }

        fn supports_runtime_path_modification(&self) -> bool {
            false
        }

        fn supports_lazy_binding(&self) -> bool {
            false
        }
    }

    /// A module whose `GetLanguageModule` export resolves but whose v-table
    /// is otherwise unreachable: used to model "symbol missing" (spec §8
    /// scenario S5) without a real dynamic library.
    pub struct MissingSymbolAssembly {
        path: PathBuf,
    }

    impl MissingSymbolAssembly {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }
    }

    impl Assembly for MissingSymbolAssembly {
        fn path(&self) -> &Path {
            &self.path
        }

        fn get_symbol(&self, name: &str) -> ExtResult<Address> {
            Err(ExtError::initialization_failed(format!("no such symbol: {name}")))
        }
    }

    pub struct MissingSymbolPlatformOps;

    impl PlatformOps for MissingSymbolPlatformOps {
        fn load_library(&self, path: &Path, _flags: LoadFlags) -> ExtResult<Arc<dyn Assembly>> {
            Ok(Arc::new(MissingSymbolAssembly::new(path)))
        }

        fn supports_runtime_path_modification(&self) -> bool {
            false
        }

        fn supports_lazy_binding(&self) -> bool {
            false
        }
    }
}

/// S1: module `py` plus plugins `alpha` and `beta` (`beta` depending on
/// `alpha`) all load, export, start, and end up `Running`, in load order
/// `[py, alpha, beta]`.
#[test]
fn s1_happy_path_brings_every_extension_to_running() {
    let py = parsed(manifest("py", ExtensionType::Module, "python"));
    let alpha = parsed(manifest("alpha", ExtensionType::Plugin, "python"));
    let mut beta_manifest = manifest("beta", ExtensionType::Plugin, "python");
    beta_manifest.dependencies.push(Dependency {
        name: "alpha".to_string(),
        constraint: ">=1.0.0".parse::<RangeSet>().unwrap(),
        optional: false,
    });
    let beta = parsed(beta_manifest);

    let modules = ModuleRegistry::new();
    let platform: Arc<dyn PlatformOps> = Arc::new(stub_abi::StubPlatformOps);
    let executor = PipelineExecutor::new(vec![
        StageSpec::barrier(ResolutionStage::new(DependencyResolver::new()), true),
        StageSpec::sequential(LoadingStage::new(platform.clone(), modules.clone()), false),
        StageSpec::sequential(ExportingStage::new(modules.clone()), false),
        StageSpec::sequential(StartingStage::new(modules.clone()), false),
    ]);

    let ctx = ctx();
    let (extensions, report) = executor.run(vec![py, alpha, beta], &ctx);

    let names: Vec<&str> = extensions.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["py", "alpha", "beta"]);
    for ext in &extensions {
        assert_eq!(ext.state(), ExtensionState::Running, "{} not running", ext.name());
        assert!(!ext.has_errors(), "{} has errors: {:?}", ext.name(), ext.errors());
    }

    assert_eq!(report.stage("Resolution").unwrap().succeeded, 3);
    assert_eq!(report.stage("Loading").unwrap().succeeded, 3);
    // Only plugins go through Exporting/Starting; the module skips both.
    assert_eq!(report.stage("Exporting").unwrap().succeeded, 2);
    assert_eq!(report.stage("Starting").unwrap().succeeded, 2);
}

/// S2: a plugin depending on a name nobody provides ends `Unresolved` with
/// the documented "Dependency '...' not found" message, and never appears
/// in the load order.
#[test]
fn s2_missing_dependency_is_unresolved() {
    let py = parsed(manifest("py", ExtensionType::Module, "python"));
    let mut gamma_manifest = manifest("gamma", ExtensionType::Plugin, "python");
    gamma_manifest.dependencies.push(Dependency {
        name: "delta".to_string(),
        constraint: RangeSet::any(),
        optional: false,
    });
    let gamma = parsed(gamma_manifest);

    let stage = ResolutionStage::new(DependencyResolver::new());
    let ctx = ctx();
    let result = stage.process_all(vec![py, gamma], &ctx).unwrap();

    let gamma = result.iter().find(|e| e.name() == "gamma").unwrap();
    assert_eq!(gamma.state(), ExtensionState::Unresolved);
    assert!(gamma
        .errors()
        .iter()
        .any(|e| e.contains("Dependency 'delta' not found")));
    let graphs = ctx.resolution().unwrap();
    assert!(!graphs.load_order.contains(gamma.id()));
}

/// S3: a plugin requiring a version the available module can't satisfy
/// ends `Unresolved`, with the message naming both the required range and
/// the version actually available.
#[test]
fn s3_version_conflict_names_both_sides() {
    let mut lib = manifest("lib", ExtensionType::Module, "native");
    lib.version = "1.5.0".parse().unwrap();
    let lib = parsed(lib);

    let mut x_manifest = manifest("x", ExtensionType::Plugin, "native");
    x_manifest.dependencies.push(Dependency {
        name: "lib".to_string(),
        constraint: ">=2.0.0".parse::<RangeSet>().unwrap(),
        optional: false,
    });
    let x = parsed(x_manifest);

    let stage = ResolutionStage::default();
    let ctx = ctx();
    let result = stage.process_all(vec![lib, x], &ctx).unwrap();

    let x = result.iter().find(|e| e.name() == "x").unwrap();
    assert_eq!(x.state(), ExtensionState::Unresolved);
    assert!(x.errors().iter().any(|e| e.contains("available: 1.5.0")));
    assert!(x.errors().iter().any(|e| e.contains("required: >=2.0.0")));
}

/// S4: two plugins depending on each other form a cycle; both end
/// `Unresolved`, the resolver's own report marks `is_load_order_valid` as
/// `false`, and the reconstructed cycle is `[a, b, a]`.
#[test]
fn s4_mutual_dependency_is_a_cycle() {
    let mut a_manifest = manifest("a", ExtensionType::Plugin, "none");
    a_manifest.dependencies.push(Dependency {
        name: "b".to_string(),
        constraint: RangeSet::any(),
        optional: false,
    });
    let mut b_manifest = manifest("b", ExtensionType::Plugin, "none");
    b_manifest.dependencies.push(Dependency {
        name: "a".to_string(),
        constraint: RangeSet::any(),
        optional: false,
    });

    let extensions = vec![parsed(a_manifest), parsed(b_manifest)];
    let report = DependencyResolver::new().resolve(&extensions);
    assert!(!report.is_load_order_valid);

    let names: Vec<String> = ["a", "b", "a"].iter().map(|s| s.to_string()).collect();
    let a_id = extensions.iter().find(|e| e.name() == "a").unwrap().id().clone();
    let b_id = extensions.iter().find(|e| e.name() == "b").unwrap().id().clone();
    assert!(report.blocking_issues_for(&a_id).next().is_some());
    assert!(report.blocking_issues_for(&b_id).next().is_some());
    assert!(report
        .blocking_issues_for(&a_id)
        .any(|i| i.description.contains(&names.join(" -> "))));

    let stage = ResolutionStage::default();
    let result = stage.process_all(extensions, &ctx()).unwrap();
    assert!(result.iter().all(|e| e.state() == ExtensionState::Unresolved));
}

/// S5: module `m` fails to load because its entry-point symbol can't be
/// resolved. Its plugin chain `m -> p1 -> p2 -> p3` cascades to `Skipped`
/// one link at a time, and no plugin's `on_plugin_load` is ever called.
#[test]
fn s5_loading_failure_cascades_through_the_dependency_chain() {
    let m = parsed(manifest("m", ExtensionType::Module, "broken"));
    let p1 = parsed(manifest("p1", ExtensionType::Plugin, "broken"));
    let mut p2_manifest = manifest("p2", ExtensionType::Plugin, "broken");
    p2_manifest.dependencies.push(Dependency {
        name: "p1".to_string(),
        constraint: RangeSet::any(),
        optional: false,
    });
    let p2 = parsed(p2_manifest);
    let mut p3_manifest = manifest("p3", ExtensionType::Plugin, "broken");
    p3_manifest.dependencies.push(Dependency {
        name: "p2".to_string(),
        constraint: RangeSet::any(),
        optional: false,
    });
    let p3 = parsed(p3_manifest);

    let modules = ModuleRegistry::new();
    let platform: Arc<dyn PlatformOps> = Arc::new(stub_abi::MissingSymbolPlatformOps);
    let executor = PipelineExecutor::new(vec![
        StageSpec::barrier(ResolutionStage::new(DependencyResolver::new()), true),
        StageSpec::sequential(LoadingStage::new(platform, modules), false),
    ]);

    let ctx = ctx();
    let (extensions, _report) = executor.run(vec![m, p1, p2, p3], &ctx);

    let by_name = |name: &str| extensions.iter().find(|e| e.name() == name).unwrap();
    assert_eq!(by_name("m").state(), ExtensionState::Failed);
    for name in ["p1", "p2", "p3"] {
        let ext = by_name(name);
        assert_eq!(ext.state(), ExtensionState::Skipped, "{name} not skipped");
        assert!(
            ext.errors().iter().any(|e| e.contains("failed")),
            "{name} missing cascade error: {:?}",
            ext.errors()
        );
    }
}
